//! # CSV 汇总表读取
//!
//! 读取带表头的 CSV，并按列名取值。
//!
//! ## 依赖关系
//! - 被 `commands/collect/freq.rs`, `commands/analyze/` 使用
//! - 使用 `csv` 库

use crate::error::{GulpkitError, Result};

use std::path::{Path, PathBuf};

/// 内存中的 CSV 表
#[derive(Debug, Clone)]
pub struct CsvTable {
    pub path: PathBuf,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// 读取 CSV 文件（首行为表头，字段首尾空白被去除）
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(GulpkitError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(path)?;

        let headers = rdr.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in rdr.records() {
            rows.push(record?.iter().map(str::to_string).collect());
        }

        Ok(CsvTable {
            path: path.to_path_buf(),
            headers,
            rows,
        })
    }

    /// 列索引
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| GulpkitError::MissingColumn {
                column: name.to_string(),
                path: self.path.display().to_string(),
            })
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    /// 字符串列
    pub fn column(&self, name: &str) -> Result<Vec<String>> {
        let idx = self.column_index(name)?;
        Ok(self
            .rows
            .iter()
            .map(|r| r.get(idx).cloned().unwrap_or_default())
            .collect())
    }

    /// 数值列；无法解析的字段报错
    pub fn f64_column(&self, name: &str) -> Result<Vec<f64>> {
        let idx = self.column_index(name)?;
        self.rows
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let cell = r.get(idx).map(String::as_str).unwrap_or("");
                cell.parse::<f64>().map_err(|_| {
                    GulpkitError::parse(
                        "csv",
                        &self.path,
                        format!("row {} column '{}': '{}' is not a number", i + 2, name, cell),
                    )
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// 规范化任务编号：`A12` / `12` / `12.0` → `12`
pub fn normalize_taskid(raw: &str) -> String {
    let trimmed = raw.trim().trim_start_matches('A');
    match trimmed.parse::<f64>() {
        Ok(v) if v.fract() == 0.0 && v >= 0.0 => format!("{}", v as u64),
        _ => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let p = dir.join(name);
        std::fs::write(&p, content).unwrap();
        p
    }

    #[test]
    fn test_read_columns() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(dir.path(), "summary.csv", "Energy, Gnorm ,taskid\n-10.5,0.0001,3\n-9.0,0.0002,7\n");
        let t = CsvTable::read(&p).unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.f64_column("Energy").unwrap(), vec![-10.5, -9.0]);
        assert_eq!(t.column("taskid").unwrap(), vec!["3", "7"]);
        assert!(t.has_column("Gnorm"));
        assert!(matches!(
            t.column("Weight"),
            Err(GulpkitError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_non_numeric_cell() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(dir.path(), "bad.csv", "E\nabc\n");
        let t = CsvTable::read(&p).unwrap();
        assert!(t.f64_column("E").is_err());
    }

    #[test]
    fn test_normalize_taskid() {
        assert_eq!(normalize_taskid("A12"), "12");
        assert_eq!(normalize_taskid("12.0"), "12");
        assert_eq!(normalize_taskid(" 7 "), "7");
        assert_eq!(normalize_taskid("VO_3"), "VO_3");
    }
}
