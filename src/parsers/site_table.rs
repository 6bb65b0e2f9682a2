//! # 位点表读写
//!
//! 空白分隔的位点表：`元素 X Y Z D CN 类型 [附加列...]`。
//!
//! ## 依赖关系
//! - 被 `commands/sites/`, `commands/collect/nanoparticle.rs`,
//!   `commands/analyze/distribution.rs` 使用
//! - 使用 `models/site.rs`

use crate::error::{GulpkitError, Result};
use crate::models::{SiteKind, SiteRecord};
use crate::utils::fsio;

use std::path::Path;

/// 解析位点表文本；字段不足 7 个的行被忽略
pub fn parse_site_table(text: &str, path: &Path) -> Result<Vec<SiteRecord>> {
    let mut records = Vec::new();

    for (lineno, line) in text.lines().enumerate() {
        let t: Vec<&str> = line.split_whitespace().collect();
        if t.len() < 7 {
            continue;
        }
        let num = |idx: usize| -> Result<f64> {
            t[idx].parse::<f64>().map_err(|_| {
                GulpkitError::parse(
                    "site table",
                    path,
                    format!("line {}: '{}' is not a number", lineno + 1, t[idx]),
                )
            })
        };

        records.push(SiteRecord {
            element: t[0].to_string(),
            position: [num(1)?, num(2)?, num(3)?],
            distance: num(4)?,
            cn: t[5].to_string(),
            kind: SiteKind::parse(t[6]),
            extra: t[7..].iter().map(|s| s.to_string()).collect(),
        });
    }

    Ok(records)
}

/// 读取位点表文件
pub fn read_site_table(path: &Path) -> Result<Vec<SiteRecord>> {
    let text = fsio::read_text(path)?;
    parse_site_table(&text, path)
}

/// 读取位点表；文件不存在时返回空表
pub fn read_site_table_or_empty(path: &Path) -> Result<Vec<SiteRecord>> {
    if path.exists() {
        read_site_table(path)
    } else {
        Ok(Vec::new())
    }
}

/// 格式化一行：坐标保留 8 位小数，距离保留 2 位
pub fn format_site(record: &SiteRecord) -> String {
    let mut line = format!(
        "{} {:.8} {:.8} {:.8} {:.2} {} {}",
        record.element,
        record.position[0],
        record.position[1],
        record.position[2],
        record.distance,
        record.cn,
        record.kind
    );
    for extra in &record.extra {
        line.push(' ');
        line.push_str(extra);
    }
    line
}

/// 写入位点表
pub fn write_site_table(path: &Path, records: &[SiteRecord]) -> Result<()> {
    let lines: Vec<String> = records.iter().map(format_site).collect();
    fsio::write_lines(path, &lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_extra_columns() {
        let text = "O -1.5 2.5 3.5 12.34 4 bulk 2.41 3.90 2N 3N 3.80 VO_110\n\nshort line\n";
        let rows = parse_site_table(text, Path::new("VO.txt")).unwrap();
        assert_eq!(rows.len(), 1);
        let r = &rows[0];
        assert_eq!(r.position, [-1.5, 2.5, 3.5]);
        assert_eq!(r.distance, 12.34);
        assert!(r.is_bulk());
        assert_eq!(r.extra_f64(0), Some(2.41));
        assert_eq!(r.extra_str(5), Some("VO_110"));
    }

    #[test]
    fn test_bad_number_is_error() {
        let err = parse_site_table("O x 1 2 3 4 bulk\n", Path::new("O.txt"));
        assert!(err.is_err());
    }

    #[test]
    fn test_format_site() {
        let mut r = SiteRecord::new("La", [1.0, -2.0, 0.5], "7").with_kind(SiteKind::Surface);
        r.distance = 10.456;
        r.extra = vec!["4.20".into(), "La_1N".into()];
        assert_eq!(
            format_site(&r),
            "La 1.00000000 -2.00000000 0.50000000 10.46 7 surface 4.20 La_1N"
        );
    }

    #[test]
    fn test_write_then_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Ce.txt");
        let r = SiteRecord::new("Ce", [0.0, 0.0, 0.0], "8").with_kind(SiteKind::Bulk);
        write_site_table(&path, &[r.clone()]).unwrap();
        assert_eq!(read_site_table(&path).unwrap(), vec![r]);
        assert!(read_site_table_or_empty(&dir.path().join("La.txt"))
            .unwrap()
            .is_empty());
    }
}
