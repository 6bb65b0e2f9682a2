//! # analyze distribution 实现
//!
//! 对每个任务目录中的位点表统计 D 列的径向直方图与 bulk/surface 计数，
//! 写出 `summary_dist.csv` 与 `summary_bulk_surface.csv`。
//!
//! ## 依赖关系
//! - 使用 `parsers/site_table.rs`, `utils/stats.rs`
//! - 输出被 `sample.rs`, `radius.rs` 读取

use crate::batch::{BatchRunner, FileCollector, ProcessResult, TaskDir, TaskDirs};
use crate::cli::analyze::DistributionArgs;
use crate::error::{GulpkitError, Result};
use crate::parsers::site_table;
use crate::utils::{output, stats};

use std::path::{Path, PathBuf};

pub const DIST_FILE: &str = "summary_dist.csv";
pub const KIND_FILE: &str = "summary_bulk_surface.csv";

/// 一张位点表的统计结果
#[derive(Debug, Clone, PartialEq)]
pub struct TableCounts {
    pub label: String,
    pub bins: Vec<usize>,
    pub bulk: usize,
    pub surface: usize,
}

/// 执行 analyze distribution
pub fn execute(args: DistributionArgs) -> Result<()> {
    output::print_header("Radial Distribution of Sites");

    if args.bin_step <= 0.0 || args.bin_end <= args.bin_start {
        return Err(GulpkitError::InvalidRange(format!(
            "bins {}..{} step {}",
            args.bin_start, args.bin_end, args.bin_step
        )));
    }
    let edges = stats::bin_edges(args.bin_start, args.bin_end, args.bin_step);
    output::print_info(&format!("Bin edges: {:?}", edges));

    let tasks = TaskDirs::new(&args.root)
        .with_prefix(&args.batch.prefix)
        .collect_non_empty()?;
    let runner = BatchRunner::new(args.batch.jobs);

    let result = runner.run(&tasks, "Histogramming", |task| {
        match summarise_task(task, &edges, &args.tables) {
            Ok(0) => ProcessResult::Skipped(format!("{}: no site tables", task.name)),
            Ok(n) => ProcessResult::Success(format!("{}: {} tables", task.name, n)),
            Err(e) => ProcessResult::Failed(task.name.clone(), e.to_string()),
        }
    })?;

    output::print_failures(&result.failures, 10);
    output::print_separator();
    output::print_done(&format!(
        "Summarised {} tasks ({} skipped, {} failed)",
        result.success, result.skipped, result.failed
    ));
    Ok(())
}

fn summarise_task(task: &TaskDir, edges: &[f64], prefixes: &[String]) -> Result<usize> {
    let tables = site_tables(&task.path, prefixes)?;
    if tables.is_empty() {
        return Ok(0);
    }
    let counts = tables
        .iter()
        .map(|(label, path)| table_counts(label, path, edges))
        .collect::<Result<Vec<_>>>()?;

    write_distribution(&task.file(DIST_FILE), edges, &counts)?;
    write_kind_counts(&task.file(KIND_FILE), &counts)?;
    Ok(counts.len())
}

/// 目录下名字以给定前缀开头的 `*.txt` 位点表（按名排序）
pub fn site_tables(dir: &Path, prefixes: &[String]) -> Result<Vec<(String, PathBuf)>> {
    Ok(FileCollector::new(dir)
        .with_pattern("*.txt")?
        .collect()
        .into_iter()
        .filter_map(|p| {
            let label = p.file_stem()?.to_string_lossy().into_owned();
            prefixes
                .iter()
                .any(|pre| label.starts_with(pre.as_str()))
                .then_some((label, p))
        })
        .collect())
}

pub fn table_counts(label: &str, path: &Path, edges: &[f64]) -> Result<TableCounts> {
    let records = site_table::read_site_table(path)?;
    let distances: Vec<f64> = records.iter().map(|r| r.distance).collect();
    Ok(TableCounts {
        label: label.to_string(),
        bins: stats::histogram(&distances, edges),
        bulk: records.iter().filter(|r| r.is_bulk()).count(),
        surface: records.iter().filter(|r| r.is_surface()).count(),
    })
}

/// `bin_start,bin_end,<表>...`
pub fn write_distribution(path: &Path, edges: &[f64], counts: &[TableCounts]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    let mut header = vec!["bin_start".to_string(), "bin_end".to_string()];
    header.extend(counts.iter().map(|c| c.label.clone()));
    wtr.write_record(&header)?;

    for (i, pair) in edges.windows(2).enumerate() {
        let mut row = vec![pair[0].to_string(), pair[1].to_string()];
        row.extend(counts.iter().map(|c| c.bins[i].to_string()));
        wtr.write_record(&row)?;
    }
    wtr.flush().map_err(|e| GulpkitError::write(path, e))?;
    Ok(())
}

/// 首列为表名，随后 `Bulk,Surface`
pub fn write_kind_counts(path: &Path, counts: &[TableCounts]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["", "Bulk", "Surface"])?;
    for c in counts {
        wtr.write_record(&[c.label.clone(), c.bulk.to_string(), c.surface.to_string()])?;
    }
    wtr.flush().map_err(|e| GulpkitError::write(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::BatchOpts;

    #[test]
    fn test_table_counts() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("VO.txt");
        std::fs::write(
            &p,
            "O 0 0 0 2.0 4 bulk\nO 0 0 0 6.0 3 surface\nO 0 0 0 30.0 3 surface\nO 0 0 0 31.0 2 surface\n",
        )
        .unwrap();
        let c = table_counts("VO", &p, &stats::bin_edges(0.0, 30.0, 6.0)).unwrap();
        assert_eq!(c.bins, vec![1, 1, 0, 0, 1]);
        assert_eq!((c.bulk, c.surface), (1, 3));
    }

    #[test]
    fn test_execute_writes_both_tables() {
        let dir = tempfile::tempdir().unwrap();
        let task = dir.path().join("A1");
        std::fs::create_dir(&task).unwrap();
        std::fs::write(task.join("VO.txt"), "O 0 0 0 7.5 4 bulk\n").unwrap();
        std::fs::write(task.join("La.txt"), "La 0 0 0 1.0 7 surface\n").unwrap();
        std::fs::write(task.join("notes.txt"), "ignored\n").unwrap();

        execute(DistributionArgs {
            root: dir.path().to_path_buf(),
            batch: BatchOpts {
                jobs: 1,
                prefix: "A".into(),
            },
            bin_start: 0.0,
            bin_end: 30.0,
            bin_step: 6.0,
            tables: vec!["O".into(), "V".into(), "C".into(), "L".into()],
        })
        .unwrap();

        let dist = std::fs::read_to_string(task.join(DIST_FILE)).unwrap();
        let lines: Vec<&str> = dist.lines().collect();
        assert_eq!(lines[0], "bin_start,bin_end,La,VO");
        assert_eq!(lines[1], "0,6,1,0");
        assert_eq!(lines[2], "6,12,0,1");
        assert_eq!(lines.len(), 6);

        let kinds = std::fs::read_to_string(task.join(KIND_FILE)).unwrap();
        assert_eq!(kinds, ",Bulk,Surface\nLa,0,1\nVO,1,0\n");
    }
}
