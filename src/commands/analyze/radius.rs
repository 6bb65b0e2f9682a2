//! # analyze radius 实现
//!
//! 把所有任务的 `summary_dist.csv` 展平为一行，合并成 `summary_radius_count.csv`：
//! 列为 `ID` 与 `<表>_<起点>-<终点>`（按物种顺序、再按区间起点排序），行按编号排序。
//!
//! ## 依赖关系
//! - 使用 `batch/collector.rs`, `parsers/table.rs`
//! - 读取 `distribution.rs` 的输出

use super::distribution::DIST_FILE;
use crate::batch::{TaskDir, TaskDirs};
use crate::cli::analyze::RadiusArgs;
use crate::error::{GulpkitError, Result};
use crate::parsers::table::CsvTable;
use crate::utils::{output, progress};

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

/// 一个任务展平后的计数：列名 → 值
type FlatCounts = HashMap<String, String>;

/// 执行 analyze radius
pub fn execute(args: RadiusArgs) -> Result<()> {
    output::print_header("Combining Radial Distributions");

    let tasks = TaskDirs::new(&args.root)
        .with_prefix(&args.prefix)
        .collect_non_empty()?;
    let pb = progress::create_progress_bar(tasks.len() as u64, "Reading");
    let mut rows: Vec<(u64, FlatCounts)> = Vec::new();
    for task in &tasks {
        match flatten_task(task) {
            Ok(Some(flat)) => rows.push((task.id, flat)),
            Ok(None) => {}
            Err(e) => pb.suspend(|| output::print_error(&format!("{}: {}", task.name, e))),
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    let columns = ordered_columns(rows.iter().map(|(_, r)| r), &args.species);
    write_combined(&args.output, &columns, &rows)?;
    output::print_written("radius counts", &args.output, rows.len());
    Ok(())
}

fn flatten_task(task: &TaskDir) -> Result<Option<FlatCounts>> {
    let path = task.file(DIST_FILE);
    if !path.is_file() {
        return Ok(None);
    }
    flatten(&CsvTable::read(&path)?).map(Some)
}

/// `bin_start,bin_end,<表>...` → `{<表>_<start>-<end>: 计数}`
pub fn flatten(table: &CsvTable) -> Result<FlatCounts> {
    let start = table.column_index("bin_start")?;
    let end = table.column_index("bin_end")?;
    let mut flat = FlatCounts::new();
    for row in &table.rows {
        let cell = |i: usize| row.get(i).map(String::as_str).unwrap_or("");
        let range = format!("{}-{}", cell(start), cell(end));
        for (i, name) in table.headers.iter().enumerate() {
            if i != start && i != end {
                flat.insert(format!("{}_{}", name, range), cell(i).to_string());
            }
        }
    }
    Ok(flat)
}

/// 按物种顺序、区间起点数值排序的列；不在物种列表中的表被丢弃
pub fn ordered_columns<'a>(
    rows: impl Iterator<Item = &'a FlatCounts>,
    species: &[String],
) -> Vec<String> {
    let all: BTreeSet<&String> = rows.flat_map(|r| r.keys()).collect();
    let mut out = Vec::new();
    for sp in species {
        let mut cols: Vec<(f64, &String)> = all
            .iter()
            .filter_map(|c| {
                let rest = c.strip_prefix(sp.as_str())?.strip_prefix('_')?;
                // 表名本身带下划线时（如 VO_opt）不归入 VO
                let start: f64 = rest.split('-').next()?.parse().ok()?;
                Some((start, *c))
            })
            .collect();
        cols.sort_by(|a, b| a.0.total_cmp(&b.0));
        out.extend(cols.into_iter().map(|(_, c)| c.clone()));
    }
    out
}

fn write_combined(path: &Path, columns: &[String], rows: &[(u64, FlatCounts)]) -> Result<()> {
    let mut sorted: Vec<&(u64, FlatCounts)> = rows.iter().collect();
    sorted.sort_by_key(|(id, _)| *id);

    let mut wtr = csv::Writer::from_path(path)?;
    let mut header = vec!["ID".to_string()];
    header.extend(columns.iter().cloned());
    wtr.write_record(&header)?;
    for (id, flat) in sorted {
        let mut row = vec![id.to_string()];
        row.extend(columns.iter().map(|c| flat.get(c).cloned().unwrap_or_default()));
        wtr.write_record(&row)?;
    }
    wtr.flush().map_err(|e| GulpkitError::write(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_columns() {
        let mut a = FlatCounts::new();
        for key in ["O_12-18", "VO_6-12", "VO_0-6", "La_0-6", "VO_opt_0-6", "X_0-6"] {
            a.insert(key.to_string(), "1".into());
        }
        let species: Vec<String> = ["VO", "La", "Ce", "O"].iter().map(|s| s.to_string()).collect();
        let cols = ordered_columns(std::iter::once(&a), &species);
        assert_eq!(cols, vec!["VO_0-6", "VO_6-12", "La_0-6", "O_12-18"]);
    }

    #[test]
    fn test_execute_combines_tasks() {
        let dir = tempfile::tempdir().unwrap();
        for (id, table) in [
            (10, "bin_start,bin_end,VO,La\n0,6,1,2\n6,12,3,4\n"),
            (2, "bin_start,bin_end,VO\n0,6,5\n6,12,6\n"),
        ] {
            let task = dir.path().join(format!("A{}", id));
            std::fs::create_dir(&task).unwrap();
            std::fs::write(task.join(DIST_FILE), table).unwrap();
        }
        let out = dir.path().join("summary_radius_count.csv");

        execute(RadiusArgs {
            root: dir.path().to_path_buf(),
            prefix: "A".into(),
            species: vec!["VO".into(), "La".into(), "Ce".into(), "O".into()],
            output: out.clone(),
        })
        .unwrap();

        let text = std::fs::read_to_string(out).unwrap();
        assert_eq!(
            text,
            "ID,VO_0-6,VO_6-12,La_0-6,La_6-12\n2,5,6,,\n10,1,3,2,4\n"
        );
    }
}
