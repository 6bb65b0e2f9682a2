//! # GULP 输入 (.gin) 解析与编辑
//!
//! ## 功能
//! - 提取固定位点（标志 `0 1 0 1 1 1`）的坐标
//! - 规范化固定位点标志、删除 `output xyz` 行、字面替换
//! - 读取带 CN / 类型标签的位点行（主结构文件）
//! - 读取 `impurity <物种> cart` 行的掺杂坐标
//!
//! ## 依赖关系
//! - 被 `commands/prepare.rs`, `commands/sites/`, `commands/collect/defect.rs` 使用
//! - 使用 `regex` 进行标志规范化

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// 固定位点标志
pub const FIXED_SITE_FLAG: &str = "0 1 0 1 1 1";

/// 两个空格分隔的标志写法
static LOOSE_FLAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"0\s{2}1\s{2}0\s{2}1\s{2}1").expect("static regex"));

/// 由三个坐标字段构成的哈希键（按 f64 位模式比较）
pub type CoordKey = [u64; 3];

pub fn coord_key(p: &[f64; 3]) -> CoordKey {
    // +0.0 与 -0.0 视为同一坐标
    [
        (p[0] + 0.0).to_bits(),
        (p[1] + 0.0).to_bits(),
        (p[2] + 0.0).to_bits(),
    ]
}

/// 带标签的位点（主结构文件中的一行）
#[derive(Debug, Clone, PartialEq)]
pub struct LabelledSite {
    pub element: String,
    pub position: [f64; 3],
    pub cn: String,
    pub kind: String,
}

/// 含固定位点标志的行的坐标字段（第 2..5 列，原样文本）
pub fn fixed_site_coords(text: &str) -> Vec<[String; 3]> {
    text.lines()
        .filter(|l| l.contains(FIXED_SITE_FLAG))
        .filter_map(|l| {
            let t: Vec<&str> = l.split_whitespace().collect();
            (t.len() >= 5).then(|| [t[2].to_string(), t[3].to_string(), t[4].to_string()])
        })
        .collect()
}

/// `0  1  0  1  1` → `0 1 0 1 1 1`
pub fn normalize_flags(text: &str) -> String {
    LOOSE_FLAG.replace_all(text, FIXED_SITE_FLAG).into_owned()
}

/// 删除所有含 `output xyz` 的行
pub fn strip_output_xyz(text: &str) -> String {
    text.split_inclusive('\n')
        .filter(|l| !l.contains("output xyz"))
        .collect()
}

/// 依次进行字面替换
pub fn apply_replacements(text: &str, pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .fold(text.to_string(), |acc, (from, to)| acc.replace(from, to))
}

/// 解析 `FROM=TO` 形式的替换参数
pub fn parse_replacement(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((from, to)) if !from.is_empty() => Ok((from.to_string(), to.to_string())),
        _ => Err(format!("expected FROM=TO, got '{}'", arg)),
    }
}

/// 读取字段数 > 5 且元素在 `species` 中的位点行
pub fn labelled_sites(text: &str, species: &[String]) -> Vec<LabelledSite> {
    text.lines()
        .filter_map(parse_labelled_line)
        .filter(|s| species.iter().any(|sp| sp == &s.element))
        .collect()
}

/// 主结构文件中所有位点的 坐标 → (CN, 类型) 映射
pub fn site_map(text: &str) -> HashMap<CoordKey, (String, String)> {
    text.lines()
        .filter_map(parse_labelled_line)
        .map(|s| (coord_key(&s.position), (s.cn, s.kind)))
        .collect()
}

fn parse_labelled_line(line: &str) -> Option<LabelledSite> {
    let t: Vec<&str> = line.split_whitespace().collect();
    if t.len() <= 5 {
        return None;
    }
    let position = [t[2].parse().ok()?, t[3].parse().ok()?, t[4].parse().ok()?];
    Some(LabelledSite {
        element: t[0].to_string(),
        position,
        cn: t[t.len() - 2].to_string(),
        kind: t[t.len() - 1].to_string(),
    })
}

/// `impurity <species> cart x y z` 行的最后三个数
pub fn impurity_coords(text: &str, species: &str) -> Vec<[f64; 3]> {
    let marker = format!("impurity {} cart", species);
    text.lines()
        .filter(|l| l.split_whitespace().collect::<Vec<_>>().join(" ").contains(&marker))
        .filter_map(|l| {
            let nums: Vec<f64> = l
                .split_whitespace()
                .filter_map(|t| t.parse::<f64>().ok())
                .collect();
            let n = nums.len();
            (n >= 3).then(|| [nums[n - 3], nums[n - 2], nums[n - 1]])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASTER: &str = "\
cartesian
Ce core   0.000000   0.000000   0.000000 0 1 0 1 1 1 8 bulk
O  core   1.352750   1.352750   1.352750 0 1 0 1 1 1 4 bulk
O  core  -1.352750   1.352750   1.352750 0 1 0 1 1 1 3 surface
La core   2.705500   2.705500   0.000000 0 1 0 1 1 1 7 surface
species 3
";

    #[test]
    fn test_fixed_site_coords_keep_text() {
        let coords = fixed_site_coords(MASTER);
        assert_eq!(coords.len(), 4);
        assert_eq!(coords[1], ["1.352750".to_string(), "1.352750".into(), "1.352750".into()]);
    }

    #[test]
    fn test_normalize_and_strip() {
        let text = "O core 1 2 3 0  1  0  1  1\noutput xyz run\nend\n";
        let fixed = strip_output_xyz(&normalize_flags(text));
        assert_eq!(fixed, "O core 1 2 3 0 1 0 1 1 1\nend\n");
    }

    #[test]
    fn test_apply_replacements() {
        let pairs = vec![("lbfgs_order 2000".to_string(), "lbfgs_order 5000".to_string())];
        assert_eq!(
            apply_replacements("lbfgs_order 2000\n", &pairs),
            "lbfgs_order 5000\n"
        );
        assert!(parse_replacement("opti =opti conp").is_ok());
        assert!(parse_replacement("=x").is_err());
        assert!(parse_replacement("nothing").is_err());
    }

    #[test]
    fn test_labelled_sites_and_map() {
        let oxygens = labelled_sites(MASTER, &["O".to_string()]);
        assert_eq!(oxygens.len(), 2);
        assert_eq!(oxygens[1].cn, "3");
        assert_eq!(oxygens[1].kind, "surface");

        let map = site_map(MASTER);
        assert_eq!(map.len(), 4);
        let key = coord_key(&[2.7055, 2.7055, 0.0]);
        assert_eq!(map.get(&key), Some(&("7".to_string(), "surface".to_string())));
    }

    #[test]
    fn test_impurity_coords() {
        let gin = "impurity Gd cart  1.0 2.0 3.0\nimpurity  Gd  cart 4 5 6\nimpurity Ce cart 7 8 9\n";
        let coords = impurity_coords(gin, "Gd");
        assert_eq!(coords, vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
    }
}
