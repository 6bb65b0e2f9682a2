//! # XYZ 结构文件读写
//!
//! 读取 `N / 注释 / 元素 x y z` 格式，写出时可在坐标后追加任意列。
//!
//! ## 依赖关系
//! - 被 `commands/sites/coord.rs` 使用

use crate::error::{GulpkitError, Result};
use crate::utils::fsio;

use std::path::Path;

/// XYZ 中的一个原子（笛卡尔坐标）
#[derive(Debug, Clone, PartialEq)]
pub struct XyzAtom {
    pub element: String,
    pub position: [f64; 3],
}

/// 解析 XYZ 文本（跳过前两行）
pub fn parse_xyz(text: &str, path: &Path) -> Result<Vec<XyzAtom>> {
    let mut atoms = Vec::new();
    for (lineno, line) in text.lines().enumerate().skip(2) {
        let t: Vec<&str> = line.split_whitespace().collect();
        if t.is_empty() {
            continue;
        }
        if t.len() < 4 {
            return Err(GulpkitError::parse(
                "xyz",
                path,
                format!("line {} has {} fields", lineno + 1, t.len()),
            ));
        }
        let mut position = [0.0; 3];
        for (k, slot) in position.iter_mut().enumerate() {
            *slot = t[k + 1].parse().map_err(|_| {
                GulpkitError::parse("xyz", path, format!("line {}: bad coordinate", lineno + 1))
            })?;
        }
        atoms.push(XyzAtom {
            element: t[0].to_string(),
            position,
        });
    }
    Ok(atoms)
}

pub fn read_xyz(path: &Path) -> Result<Vec<XyzAtom>> {
    let text = fsio::read_text(path)?;
    parse_xyz(&text, path)
}

/// 写出 XYZ，`columns[i]` 追加在第 i 个原子之后
pub fn write_xyz(path: &Path, atoms: &[XyzAtom], comment: &str, columns: &[String]) -> Result<()> {
    let mut lines = vec![atoms.len().to_string(), comment.to_string()];
    for (i, atom) in atoms.iter().enumerate() {
        let mut line = format!(
            "{} {:.6} {:.6} {:.6}",
            atom.element, atom.position[0], atom.position[1], atom.position[2]
        );
        if let Some(extra) = columns.get(i) {
            line.push(' ');
            line.push_str(extra);
        }
        lines.push(line);
    }
    fsio::write_lines(path, &lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_xyz() {
        let text = "2\ncomment\nCe 0.0 0.0 0.0\nO 1.35 1.35 1.35\n";
        let atoms = parse_xyz(text, Path::new("np.xyz")).unwrap();
        assert_eq!(atoms.len(), 2);
        assert_eq!(atoms[1].element, "O");
        assert_eq!(atoms[1].position, [1.35, 1.35, 1.35]);
    }

    #[test]
    fn test_parse_xyz_rejects_short_line() {
        assert!(parse_xyz("1\n\nCe 0.0\n", Path::new("bad.xyz")).is_err());
    }

    #[test]
    fn test_write_xyz_with_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xyz");
        let atoms = vec![XyzAtom {
            element: "Ce".into(),
            position: [0.0, 1.0, 2.0],
        }];
        write_xyz(&path, &atoms, "cn", &["8 bulk".to_string()]).unwrap();
        let text = fsio::read_text(&path).unwrap();
        assert_eq!(text, "1\ncn\nCe 0.000000 1.000000 2.000000 8 bulk\n");
    }
}
