//! # GULP 输出 (.gout) 解析器
//!
//! 按子串定位 + 固定行偏移扫描 GULP 的纯文本输出，提取能量、Gnorm、
//! 晶胞、介电/弹性性质、静电势、振动频率与位移。
//!
//! ## 依赖关系
//! - 被 `commands/collect/`, `commands/check.rs` 使用
//! - 填充 `models/gout.rs` 的 GoutSummary
//! - 使用 `regex` 匹配静电势表格行

use crate::error::Result;
use crate::models::{DielectricTensor, ElasticMatrix, GoutSummary, Moduli, SitePotentials};
use crate::utils::fsio;

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// 晶胞参数行的应变导数标记，顺序对应 a, b, c, alpha, beta, gamma
const CELL_MARKERS: [&str; 6] = [
    "dE/de1(xx)",
    "dE/de2(yy)",
    "dE/de3(zz)",
    "dE/de4(yz)",
    "dE/de5(xz)",
    "dE/de6(xy)",
];

const POTENTIAL_HEADERS: [&str; 2] = [
    "Electrostatic potential at atomic positions",
    "Electrostatic site potentials for region 1",
];

/// "Difference" 标记之后扫描的行数
const DISPLACEMENT_WINDOW: usize = 640;

/// 静电势表格行：`序号 物种 c 电势 ...`
static POTENTIAL_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\d+\s+([A-Za-z][A-Za-z0-9_]*)\s+c\s+(-?\d+(?:\.\d*)?(?:[eE][-+]?\d+)?)")
        .expect("static regex")
});

/// 解析 GULP 输出文件
pub fn parse_gout_file(path: &Path) -> Result<GoutSummary> {
    let text = fsio::read_text(path)?;
    Ok(parse_gout_content(&text))
}

/// 解析 GULP 输出文本
pub fn parse_gout_content(text: &str) -> GoutSummary {
    let lines: Vec<&str> = text.lines().collect();
    let mut summary = GoutSummary {
        has_error: text.contains("ERROR"),
        ..Default::default()
    };
    let mut primitive_volume = None;
    let mut seen_freq_header = false;

    for (i, line) in lines.iter().enumerate() {
        if line.contains("Job Finished at") {
            summary.finished = true;
        } else if line.contains("Final defect energy") {
            summary.defect_energy = value_after_eq(line);
        } else if line.contains("Final defect Gnorm") {
            summary.defect_gnorm = value_after_eq(line);
        } else if line.contains("Final energy") {
            summary.final_energy = value_after_eq(line);
        } else if line.contains("Final Gnorm") {
            summary.final_gnorm = last_number(line);
        } else if line.contains("Non-primitive cell volume =") {
            summary.volume = value_after_eq(line);
        } else if line.contains("Primitive cell volume =") {
            primitive_volume = value_after_eq(line);
        } else if line.contains("Density of cell =") {
            summary.density = value_after_eq(line);
        } else if line.contains("Static dielectric constant tensor") {
            summary.static_dielectric = Some(parse_dielectric(&lines, i));
        } else if line.contains("High frequency dielectric constant tensor") {
            summary.high_freq_dielectric = Some(parse_dielectric(&lines, i));
        } else if line.contains("Bulk  Modulus (GPa)") {
            summary.bulk_modulus = Some(parse_moduli(line));
        } else if line.contains("Shear Modulus (GPa)") {
            summary.shear_modulus = Some(parse_moduli(line));
        } else if line.contains("Youngs Moduli (GPa)") {
            let v = values_after_eq(line);
            summary.youngs_moduli = Some([nth(&v, 0), nth(&v, 1), nth(&v, 2)]);
        } else if line.contains("Compressibility (GPa-1)") {
            summary.compressibility = value_after_eq(line);
        } else if line.contains("Elastic Constant Matrix: (Units=GPa)") {
            summary.elastic = Some(parse_elastic(&lines, i));
        } else if POTENTIAL_HEADERS.iter().any(|h| line.contains(h)) {
            let section = parse_potentials(&lines[i + 1..]);
            summary
                .potentials
                .get_or_insert_with(SitePotentials::default)
                .by_species
                .extend(section.by_species);
        } else if line.contains("Frequencies (cm-1)") {
            // 只取第一组
            if !seen_freq_header {
                seen_freq_header = true;
                summary.frequencies = parse_frequencies(&lines[i + 1..]);
            }
        } else if line.contains("Difference") {
            if let Some(d) = block_max_displacement(&lines, i) {
                summary.max_displacement = Some(match summary.max_displacement {
                    Some(cur) if cur.abs() >= d.abs() => cur,
                    _ => d,
                });
            }
        } else if let Some(idx) = CELL_MARKERS.iter().position(|m| line.contains(m)) {
            summary.cell[idx] = token_f64(line, 1);
        }
    }

    if summary.volume.is_none() {
        summary.volume = primitive_volume;
    }

    summary
}

/// 介电张量：表头后第 5..=7 行，第 1..=3 列
fn parse_dielectric(lines: &[&str], header: usize) -> DielectricTensor {
    let mut tensor = DielectricTensor::default();
    for r in 0..3 {
        if let Some(row) = lines.get(header + 5 + r) {
            for c in 0..3 {
                tensor.rows[r][c] = token_f64(row, c + 1);
            }
        }
    }
    tensor
}

/// 弹性常数矩阵：表头后第 5..=10 行，第 1..=6 列
fn parse_elastic(lines: &[&str], header: usize) -> ElasticMatrix {
    let mut matrix = ElasticMatrix::default();
    for r in 0..6 {
        if let Some(row) = lines.get(header + 5 + r) {
            for c in 0..6 {
                matrix.rows[r][c] = token_f64(row, c + 1);
            }
        }
    }
    matrix
}

fn parse_moduli(line: &str) -> Moduli {
    let v = values_after_eq(line);
    Moduli {
        reuss: nth(&v, 0),
        voigt: nth(&v, 1),
        hill: nth(&v, 2),
    }
}

/// 静电势表：表头两条虚线之后，读到下一条虚线或空行为止
fn parse_potentials(lines: &[&str]) -> SitePotentials {
    let mut potentials = SitePotentials::default();
    let mut rules = 0;

    for line in lines {
        let trimmed = line.trim();
        if trimmed.starts_with("---") {
            rules += 1;
            if rules > 2 {
                break;
            }
        } else if trimmed.is_empty() {
            if rules > 0 {
                break;
            }
        } else if let Some(caps) = POTENTIAL_ROW.captures(line) {
            if let Ok(v) = caps[2].parse::<f64>() {
                potentials.push(&caps[1], v);
            }
        }
    }

    potentials
}

/// 第一组频率：跳过空行后连续的纯数字行
fn parse_frequencies(lines: &[&str]) -> Vec<f64> {
    let mut freqs = Vec::new();

    for line in lines.iter().skip_while(|l| l.trim().is_empty()) {
        let values: Option<Vec<f64>> = line
            .split_whitespace()
            .map(|t| t.parse::<f64>().ok())
            .collect();
        match values {
            Some(v) if !v.is_empty() => freqs.extend(v),
            _ => break,
        }
    }

    freqs
}

/// "Difference" 段内（至多 640 行）第 4 列绝对值最大的数
fn block_max_displacement(lines: &[&str], header: usize) -> Option<f64> {
    let end = (header + DISPLACEMENT_WINDOW).min(lines.len());
    lines
        .get(header + 1..end)?
        .iter()
        .filter(|l| l.split_whitespace().count() >= 5)
        .filter_map(|l| token_f64(l, 4))
        .fold(None, |acc: Option<f64>, v| match acc {
            Some(cur) if cur.abs() >= v.abs() => Some(cur),
            _ => Some(v),
        })
}

// ─────────────────────────────────────────────────────────────
// 行内取值工具
// ─────────────────────────────────────────────────────────────

/// 第 `idx` 个空白分隔字段解析为浮点数
pub fn token_f64(line: &str, idx: usize) -> Option<f64> {
    line.split_whitespace().nth(idx)?.parse().ok()
}

/// '=' 之后的第一个数
pub fn value_after_eq(line: &str) -> Option<f64> {
    let (_, rest) = line.split_once('=')?;
    rest.split_whitespace().next()?.parse().ok()
}

/// '=' 之后的所有字段（无法解析的为 None）
fn values_after_eq(line: &str) -> Vec<Option<f64>> {
    line.split_once('=')
        .map(|(_, rest)| rest.split_whitespace().map(|t| t.parse().ok()).collect())
        .unwrap_or_default()
}

fn nth(values: &[Option<f64>], idx: usize) -> Option<f64> {
    values.get(idx).copied().flatten()
}

/// 行内最后一个字段解析为浮点数
pub fn last_number(line: &str) -> Option<f64> {
    line.split_whitespace().last()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BULK_GOUT: &str = "\
  Components of energy :
  Final energy =   -1234.56789012 eV
  Final Gnorm  =       0.00012345

  Final cell parameters and derivatives :
--------------------------------------------------------------------------------
       a            5.411100    Angstrom     dE/de1(xx)    -0.000123 eV/strain
       b            5.412200    Angstrom     dE/de2(yy)    -0.000234 eV/strain
       c            5.413300    Angstrom     dE/de3(zz)     0.000345 eV/strain
       alpha       90.000000    Degrees      dE/de4(yz)     0.000000 eV/strain
       beta        90.100000    Degrees      dE/de5(xz)     0.000000 eV/strain
       gamma       89.900000    Degrees      dE/de6(xy)     0.000000 eV/strain
--------------------------------------------------------------------------------

  Primitive cell volume =           158.427000 Angs**3
  Non-primitive cell volume =       158.430000 Angs**3
  Density of cell =      7.215000 g/cm**3

  Elastic Constant Matrix: (Units=GPa)

-------------------------------------------------------------------------------
  Indices      1         2         3         4         5         6
-------------------------------------------------------------------------------
       1    403.10    105.20    105.30      0.00      0.00      0.00
       2    105.20    403.20    105.40      0.00      0.00      0.00
       3    105.30    105.40    403.30      0.00      0.00      0.00
       4      0.00      0.00      0.00     60.40      0.00      0.00
       5      0.00      0.00      0.00      0.00     60.50      0.00
       6      0.00      0.00      0.00      0.00      0.00     60.60
-------------------------------------------------------------------------------

  Bulk  Modulus (GPa)     =    204.56789    204.60000    204.58000
  Shear Modulus (GPa)     =     93.12345     95.00000     94.00000
  Youngs Moduli (GPa)     =    350.10000    350.20000    350.30000
  Compressibility (GPa-1) =      0.00488854

  Static dielectric constant tensor :

-------------------------------------------------------------------------------
              x         y         z
-------------------------------------------------------------------------------
       x    24.00000   0.10000   0.20000
       y     0.10000  25.00000   0.30000
       z     0.20000   0.30000  26.00000
-------------------------------------------------------------------------------

  High frequency dielectric constant tensor :

-------------------------------------------------------------------------------
              x         y         z
-------------------------------------------------------------------------------
       x     4.00000   0.00000   0.00000
       y     0.00000   5.00000   0.00000
       z     0.00000   0.00000   6.00000
-------------------------------------------------------------------------------

  Electrostatic potential at atomic positions :

-------------------------------------------------------------------------------
    Site       Atom      Potential                Derivative (V/Angstrom)
    No.                    (V)                   x           y           z
-------------------------------------------------------------------------------
      1       Ce    c     -32.100000      0.000000    0.000000    0.000000
      2       Ce    c     -31.900000      0.000000    0.000000    0.000000
      3       La    c     -27.500000      0.000000    0.000000    0.000000
      4       O     c      22.000000      0.000000    0.000000    0.000000
      5       O     c      24.000000      0.000000    0.000000    0.000000
-------------------------------------------------------------------------------
      9       Ce    c     -99.000000      0.000000    0.000000    0.000000

  Job Finished at 10:12.33 12th March 2024
";

    #[test]
    fn test_parse_energy_and_cell() {
        let s = parse_gout_content(BULK_GOUT);
        assert_eq!(s.final_energy, Some(-1234.56789012));
        assert_eq!(s.final_gnorm, Some(0.00012345));
        assert_eq!(s.cell[0], Some(5.4111));
        assert_eq!(s.cell[4], Some(90.1));
        assert_eq!(s.cell[5], Some(89.9));
        assert_eq!(s.volume, Some(158.43));
        assert_eq!(s.density, Some(7.215));
        assert!(s.finished);
        assert!(!s.has_error);
    }

    #[test]
    fn test_parse_mechanical_properties() {
        let s = parse_gout_content(BULK_GOUT);
        let bulk = s.bulk_modulus.unwrap();
        assert_eq!(bulk.reuss, Some(204.56789));
        assert_eq!(bulk.voigt, Some(204.6));
        assert_eq!(s.shear_modulus.unwrap().reuss, Some(93.12345));
        assert_eq!(s.youngs_moduli.unwrap()[0], Some(350.1));
        assert_eq!(s.compressibility, Some(0.00488854));

        let c = s.elastic.unwrap();
        assert_eq!(c.c11(), Some(403.1));
        assert_eq!(c.c12(), Some(105.2));
        assert_eq!(c.c44(), Some(60.4));
    }

    #[test]
    fn test_parse_dielectric() {
        let s = parse_gout_content(BULK_GOUT);
        let st = s.static_dielectric.as_ref().unwrap();
        assert_eq!(st.diagonal(), [Some(24.0), Some(25.0), Some(26.0)]);
        assert_eq!(st.rows[0][1], Some(0.1));
        assert!((s.eps0().unwrap() - 25.0).abs() < 1e-12);
        assert!((s.eps_inf().unwrap() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_potentials_stop_at_closing_rule() {
        let s = parse_gout_content(BULK_GOUT);
        let (min, max, avg) = s.potential_stats("Ce").unwrap();
        assert_eq!(min, -32.1);
        assert_eq!(max, -31.9);
        assert!((avg + 32.0).abs() < 1e-9);
        assert_eq!(s.potential_stats("O").unwrap().2, 23.0);
        assert_eq!(s.potential_stats("Gd"), Some((0.0, 0.0, 0.0)));
    }

    #[test]
    fn test_empty_potential_section_ignores_later_tables() {
        let rule = "-".repeat(79);
        let header = format!(
            "  Electrostatic potential at atomic positions :\n\n{rule}\n    Site  Atom  Potential\n    No.         (V)\n{rule}\n"
        );
        let coords = "      1 Ce    c     0.000000    0.000000    0.000000\n";

        let closed = format!("{header}{rule}\n\n  Final coordinates :\n{rule}\n{coords}");
        let s = parse_gout_content(&closed);
        assert_eq!(s.potential_stats("Ce"), Some((0.0, 0.0, 0.0)));

        let blank = format!("{header}\n  Final coordinates :\n{rule}\n{coords}");
        let s = parse_gout_content(&blank);
        assert_eq!(s.potential_stats("Ce"), Some((0.0, 0.0, 0.0)));
    }

    #[test]
    fn test_only_first_frequency_block_is_read() {
        let text = "\
  Frequencies (cm-1) [NB: Negative implies an imaginary mode]:

  Vibrational properties (for cluster):

  Frequencies (cm-1) [NB: Negative implies an imaginary mode]:

   -5.0    1.0    2.0
";
        let s = parse_gout_content(text);
        assert!(s.frequencies.is_empty());
        assert_eq!(s.first_frequency(), None);
    }

    #[test]
    fn test_no_potential_section() {
        let s = parse_gout_content("  Final energy =  -1.0 eV\n");
        assert!(s.potential_stats("O").is_none());
        assert!(s.eps0().is_none());
    }

    const DEFECT_GOUT: &str = "\
  Final defect energy  =       12.34567890
  Final defect Gnorm   =        0.00000012

  Frequencies (cm-1) [NB: Negative implies an imaginary mode]:

   -12.3456    0.0000    0.0001   45.6789
   100.0000  200.0000

  Vibrational properties (for cluster):

     Parameter   Parameter      Parameter      Parameter      Type   Units
     No.         Type           Initial        Final
      Difference
      1          x              0.1000         0.1100      0.0100   Cartesian
      2          y              0.2000         0.1800     -0.0200   Cartesian
      3          z              0.3000         2.8000      2.5000   Cartesian
  ERROR : something went wrong
";

    #[test]
    fn test_parse_defect_run() {
        let s = parse_gout_content(DEFECT_GOUT);
        assert_eq!(s.defect_energy, Some(12.3456789));
        assert_eq!(s.defect_gnorm, Some(1.2e-7));
        assert_eq!(s.final_energy, None);
        assert_eq!(s.first_frequency(), Some(-12.3456));
        assert_eq!(s.frequencies.len(), 6);
        assert_eq!(s.max_displacement, Some(2.5));
        assert!(s.has_error);
        assert!(!s.finished);
    }

    #[test]
    fn test_displacement_keeps_sign() {
        let text = "Difference\n 1 x 0.0 0.0 -3.5 C\n 2 y 0.0 0.0 1.0 C\n";
        let s = parse_gout_content(text);
        assert_eq!(s.max_displacement, Some(-3.5));
    }

    #[test]
    fn test_value_helpers() {
        assert_eq!(value_after_eq("  Final energy =  -5.5 eV"), Some(-5.5));
        assert_eq!(value_after_eq("no equals"), None);
        assert_eq!(last_number("Final Gnorm = 0.5"), Some(0.5));
        assert_eq!(token_f64("a 1.0 b", 1), Some(1.0));
        assert_eq!(token_f64("a ****** b", 1), None);
    }
}
