//! # sites coord 实现
//!
//! 按截断半径内异种离子个数计算配位数，低于体相配位即标为表面。
//!
//! ## 依赖关系
//! - 使用 `parsers/xyz.rs`, `geometry/`

use crate::cli::sites::CoordArgs;
use crate::error::Result;
use crate::geometry::classify::surface_or_bulk;
use crate::geometry::{count_within, PointSet};
use crate::parsers::xyz::{self, XyzAtom};
use crate::utils::output;

const COMMENT: &str = "Atoms with coordination numbers and classification";

/// 配位计算参数
#[derive(Debug, Clone)]
pub struct CoordRule<'a> {
    pub cation: &'a str,
    pub anion: &'a str,
    pub cutoff: f64,
    pub cation_cn: usize,
    pub anion_cn: usize,
}

/// 执行 sites coord
pub fn execute(args: CoordArgs) -> Result<()> {
    output::print_header("Coordination Classification");

    let atoms = xyz::read_xyz(&args.input)?;
    let rule = CoordRule {
        cation: &args.cation,
        anion: &args.anion,
        cutoff: args.cutoff,
        cation_cn: args.cation_cn,
        anion_cn: args.anion_cn,
    };
    let labels = classify_atoms(&atoms, &rule);

    let surface = labels.iter().filter(|(_, c)| *c == "surface").count();
    let bulk = labels.iter().filter(|(_, c)| *c == "bulk").count();
    output::print_info(&format!("{} bulk, {} surface atoms", bulk, surface));

    let columns: Vec<String> = labels
        .iter()
        .map(|(cn, class)| format!("{} {}", cn, class))
        .collect();
    xyz::write_xyz(&args.output, &atoms, COMMENT, &columns)?;
    output::print_written("classified atoms", &args.output, atoms.len());
    Ok(())
}

/// 每个原子的 (配位数, 分类)；非阴阳离子为 (0, "other")
pub fn classify_atoms(atoms: &[XyzAtom], rule: &CoordRule) -> Vec<(usize, &'static str)> {
    let of = |el: &str| -> PointSet {
        atoms
            .iter()
            .filter(|a| a.element == el)
            .map(|a| a.position)
            .collect()
    };
    let cations = of(rule.cation);
    let anions = of(rule.anion);

    atoms
        .iter()
        .map(|a| {
            if a.element == rule.cation {
                let cn = count_within(&a.position, &anions, rule.cutoff);
                (cn, surface_or_bulk(cn, rule.cation_cn))
            } else if a.element == rule.anion {
                let cn = count_within(&a.position, &cations, rule.cutoff);
                (cn, surface_or_bulk(cn, rule.anion_cn))
            } else {
                (0, "other")
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(el: &str, p: [f64; 3]) -> XyzAtom {
        XyzAtom {
            element: el.into(),
            position: p,
        }
    }

    fn rule() -> CoordRule<'static> {
        CoordRule {
            cation: "Ce",
            anion: "O",
            cutoff: 2.7,
            cation_cn: 8,
            anion_cn: 1,
        }
    }

    #[test]
    fn test_classify_atoms() {
        let atoms = vec![
            atom("Ce", [0.0; 3]),
            atom("O", [1.35, 1.35, 1.35]),
            atom("O", [9.0, 9.0, 9.0]),
            atom("La", [0.0, 0.0, 1.0]),
        ];
        let labels = classify_atoms(&atoms, &rule());
        assert_eq!(labels[0], (1, "surface"));
        assert_eq!(labels[1], (1, "bulk"));
        assert_eq!(labels[2], (0, "surface"));
        assert_eq!(labels[3], (0, "other"));
    }

    #[test]
    fn test_execute_writes_columns() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("np.xyz");
        std::fs::write(&input, "2\nnp\nCe 0.0 0.0 0.0\nO 1.35 1.35 1.35\n").unwrap();
        let output = dir.path().join("np_cn.xyz");

        execute(CoordArgs {
            input,
            output: output.clone(),
            cutoff: 2.7,
            cation: "Ce".into(),
            anion: "O".into(),
            cation_cn: 8,
            anion_cn: 4,
        })
        .unwrap();

        let text = std::fs::read_to_string(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], COMMENT);
        assert_eq!(lines[2], "Ce 0.000000 0.000000 0.000000 1 surface");
        assert!(lines[3].ends_with("1 surface"));
    }
}
