//! # analyze sample 实现
//!
//! 按能量排序的汇总表取前、中、后各 10% 的任务，逐元素累加它们的
//! `summary_dist.csv` 与 `summary_bulk_surface.csv`。
//!
//! ## 依赖关系
//! - 使用 `parsers/table.rs`
//! - 读取 `distribution.rs` 的输出

use super::distribution::{DIST_FILE, KIND_FILE};
use crate::cli::analyze::SampleArgs;
use crate::error::{GulpkitError, Result};
use crate::parsers::table::{normalize_taskid, CsvTable};
use crate::utils::{fsio, output};

use std::path::{Path, PathBuf};

/// 分组名
pub const GROUPS: [&str; 3] = ["top", "mid", "last"];

/// 执行 analyze sample
pub fn execute(args: SampleArgs) -> Result<()> {
    output::print_header("Sampling Distributions by Energy Rank");

    let summary = CsvTable::read(&args.summary)?;
    let ids: Vec<String> = summary
        .column("taskid")?
        .iter()
        .map(|s| normalize_taskid(s))
        .collect();
    let groups = sample_groups(&ids);
    output::print_info(&format!(
        "{} tasks, {} per group",
        ids.len(),
        groups[0].len()
    ));

    fsio::ensure_dir(&args.output_dir)?;
    for (name, group) in GROUPS.iter().zip(&groups) {
        let dirs: Vec<PathBuf> = group
            .iter()
            .map(|id| args.root.join(format!("{}{}", args.prefix, id)))
            .collect();

        for (file, key_columns, stem) in [(DIST_FILE, 2, "output_radius"), (KIND_FILE, 1, "output_bulk_surface")] {
            let paths: Vec<PathBuf> = dirs.iter().map(|d| d.join(file)).filter(|p| p.is_file()).collect();
            let out = args.output_dir.join(format!("{}_{}.csv", stem, name));
            match sum_tables(&paths, key_columns)? {
                Some(table) => {
                    write_table(&out, &table)?;
                    output::print_written(&format!("{} {}", name, file), &out, table.rows.len());
                }
                None => output::print_warning(&format!("No {} found for the {} group", file, name)),
            }
        }
    }

    output::print_done("Sampling complete");
    Ok(())
}

/// 前、中、后三组任务编号；每组 `max(n/10, 1)` 个
pub fn sample_groups(ids: &[String]) -> [Vec<String>; 3] {
    let n = ids.len();
    if n == 0 {
        return [Vec::new(), Vec::new(), Vec::new()];
    }
    let size = (n / 10).max(1);
    let mid_start = (n / 2).saturating_sub(size / 2);
    let mid_end = (mid_start + size).min(n);
    [
        ids[..size].to_vec(),
        ids[mid_start..mid_end].to_vec(),
        ids[n - size..].to_vec(),
    ]
}

/// 逐元素累加的表；前 `key_columns` 列取自第一张表
#[derive(Debug, Clone, PartialEq)]
pub struct SummedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// 以第一张表为模板，其余表按行号与列名累加整数列
pub fn sum_tables(paths: &[PathBuf], key_columns: usize) -> Result<Option<SummedTable>> {
    let Some((first, rest)) = paths.split_first() else {
        return Ok(None);
    };
    let base = CsvTable::read(first)?;
    let mut sums: Vec<Vec<i64>> = base
        .rows
        .iter()
        .map(|r| counts(r, key_columns, first))
        .collect::<Result<_>>()?;

    for path in rest {
        let table = CsvTable::read(path)?;
        for (name_idx, name) in base.headers.iter().enumerate().skip(key_columns) {
            let Some(col) = table.headers.iter().position(|h| h == name) else {
                continue;
            };
            for (row, sum_row) in table.rows.iter().zip(sums.iter_mut()) {
                let cell = row.get(col).map(String::as_str).unwrap_or("0");
                if let Some(slot) = sum_row.get_mut(name_idx - key_columns) {
                    *slot += parse_count(cell, path)?;
                }
            }
        }
    }

    let rows = base
        .rows
        .iter()
        .zip(&sums)
        .map(|(row, s)| {
            let mut out: Vec<String> = row.iter().take(key_columns).cloned().collect();
            out.extend(s.iter().map(i64::to_string));
            out
        })
        .collect();
    Ok(Some(SummedTable {
        headers: base.headers,
        rows,
    }))
}

fn counts(row: &[String], key_columns: usize, path: &Path) -> Result<Vec<i64>> {
    row.iter()
        .skip(key_columns)
        .map(|c| parse_count(c, path))
        .collect()
}

fn parse_count(cell: &str, path: &Path) -> Result<i64> {
    if cell.is_empty() {
        return Ok(0);
    }
    cell.parse::<i64>()
        .map_err(|_| GulpkitError::parse("csv", path, format!("'{}' is not a count", cell)))
}

fn write_table(path: &Path, table: &SummedTable) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(&table.headers)?;
    for row in &table.rows {
        wtr.write_record(row)?;
    }
    wtr.flush().map_err(|e| GulpkitError::write(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<String> {
        (1..=n).map(|i| i.to_string()).collect()
    }

    #[test]
    fn test_sample_groups() {
        let [top, mid, last] = sample_groups(&ids(25));
        assert_eq!(top, vec!["1", "2"]);
        assert_eq!(mid, vec!["12", "13"]);
        assert_eq!(last, vec!["24", "25"]);

        let [top, mid, last] = sample_groups(&ids(3));
        assert_eq!((top.len(), mid.len(), last.len()), (1, 1, 1));
        assert_eq!(mid, vec!["2"]);
        assert!(sample_groups(&[])[0].is_empty());
    }

    #[test]
    fn test_execute_sums_groups() {
        let dir = tempfile::tempdir().unwrap();
        for (id, vo) in [(1, 2), (2, 5)] {
            let task = dir.path().join(format!("A{}", id));
            std::fs::create_dir(&task).unwrap();
            std::fs::write(
                task.join(DIST_FILE),
                format!("bin_start,bin_end,VO,O\n0,6,{},1\n6,12,0,3\n", vo),
            )
            .unwrap();
            std::fs::write(task.join(KIND_FILE), format!(",Bulk,Surface\nVO,{},1\n", vo)).unwrap();
        }
        let summary = dir.path().join("summary.csv");
        std::fs::write(&summary, "Energy,taskid\n-2.0,A2\n-1.0,A1\n").unwrap();

        execute(SampleArgs {
            summary,
            root: dir.path().to_path_buf(),
            prefix: "A".into(),
            output_dir: dir.path().to_path_buf(),
        })
        .unwrap();

        let top = std::fs::read_to_string(dir.path().join("output_radius_top.csv")).unwrap();
        assert_eq!(top, "bin_start,bin_end,VO,O\n0,6,5,1\n6,12,0,3\n");
        let last = std::fs::read_to_string(dir.path().join("output_bulk_surface_last.csv")).unwrap();
        assert_eq!(last, ",Bulk,Surface\nVO,2,1\n");
    }

    #[test]
    fn test_sum_tables() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        std::fs::write(&a, "bin_start,bin_end,VO,La\n0,6,1,2\n").unwrap();
        std::fs::write(&b, "bin_start,bin_end,La,VO\n0,6,10,20\n").unwrap();
        let t = sum_tables(&[a, b], 2).unwrap().unwrap();
        assert_eq!(t.rows, vec![vec!["0", "6", "21", "12"]]);
        assert!(sum_tables(&[], 2).unwrap().is_none());
    }
}
