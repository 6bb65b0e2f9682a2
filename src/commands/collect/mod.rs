//! # collect 子命令实现
//!
//! 从每个任务目录提取一行数值记录，写出三张表：
//! - `energy_origin.csv`: 所有字段齐全的行
//! - `energy_filtered.csv`: 通过收敛筛选的行
//! - `summary.csv`: 筛选后按能量升序
//!
//! ## 依赖关系
//! - 使用 `cli/collect.rs` 定义的参数
//! - 子模块: bulk, nanoparticle, defect, freq

pub mod bulk;
pub mod defect;
pub mod freq;
pub mod nanoparticle;

use crate::cli::collect::{CollectArgs, CollectCommands, SummaryOpts};
use crate::error::{GulpkitError, Result};
use crate::thermo;
use crate::utils::{fsio, output};

use std::path::{Path, PathBuf};
use tabled::{Table, Tabled};

/// 执行 collect 命令
pub fn execute(args: CollectArgs) -> Result<()> {
    match args.command {
        CollectCommands::Bulk(a) => bulk::execute(a),
        CollectCommands::Nanoparticle(a) => nanoparticle::execute(a),
        CollectCommands::Defect(a) => defect::execute(a),
        CollectCommands::Freq(a) => freq::execute(a),
    }
}

// ─────────────────────────────────────────────────────────────
// 汇总表
// ─────────────────────────────────────────────────────────────

/// 一个任务的数值记录；缺失字段为 None
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub taskid: u64,
    pub values: Vec<Option<f64>>,
}

impl Record {
    /// 所有字段齐全时返回数值
    pub fn complete(&self) -> Option<Vec<f64>> {
        self.values.iter().copied().collect()
    }
}

/// 字段齐全的一行
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub taskid: u64,
    pub values: Vec<f64>,
}

/// 汇总表：列名（不含 taskid）与行
#[derive(Debug, Clone)]
pub struct SummaryTable {
    pub header: Vec<String>,
    pub rows: Vec<Row>,
}

impl SummaryTable {
    /// 由记录构造，丢弃字段不全的行
    pub fn from_records(header: Vec<String>, records: Vec<Record>) -> Self {
        let rows = records
            .into_iter()
            .filter_map(|r| {
                r.complete().map(|values| Row {
                    taskid: r.taskid,
                    values,
                })
            })
            .collect();
        Self { header, rows }
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| GulpkitError::MissingColumn {
                column: name.to_string(),
                path: "summary".to_string(),
            })
    }

    /// 保留满足条件的行
    pub fn filtered<F: Fn(&Row) -> bool>(&self, keep: F) -> Self {
        Self {
            header: self.header.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// 按某列升序
    pub fn sorted_by(&self, column: usize) -> Self {
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| a.values[column].total_cmp(&b.values[column]));
        Self {
            header: self.header.clone(),
            rows,
        }
    }

    /// 追加 Boltzmann `Weight = exp(-(E - E_min)/kT)` 与归一化 `Wi` 两列
    pub fn with_weights(&self, energy_column: usize, temperature: f64) -> Self {
        let energies: Vec<f64> = self.rows.iter().map(|r| r.values[energy_column]).collect();
        let wi = thermo::boltzmann_weights(&energies, temperature);
        let w_max = wi.iter().copied().fold(0.0, f64::max);

        let mut header = self.header.clone();
        header.push("Weight".to_string());
        header.push("Wi".to_string());

        let rows = self
            .rows
            .iter()
            .zip(&wi)
            .map(|(r, w)| {
                let mut values = r.values.clone();
                values.push(if w_max > 0.0 { w / w_max } else { 0.0 });
                values.push(*w);
                Row {
                    taskid: r.taskid,
                    values,
                }
            })
            .collect();
        Self { header, rows }
    }

    /// 写出 CSV，最后一列为 taskid
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path)?;
        let mut header = self.header.clone();
        header.push("taskid".to_string());
        wtr.write_record(&header)?;
        for row in &self.rows {
            let mut record: Vec<String> = row.values.iter().map(|v| v.to_string()).collect();
            record.push(row.taskid.to_string());
            wtr.write_record(&record)?;
        }
        wtr.flush().map_err(|e| GulpkitError::write(path, e))?;
        Ok(())
    }
}

/// 写出三张表并按需导出；返回 summary.csv 路径
pub fn write_summaries(
    table: &SummaryTable,
    filtered: &SummaryTable,
    energy_column: usize,
    temperature: Option<f64>,
    root: &Path,
    opts: &SummaryOpts,
) -> Result<PathBuf> {
    fsio::ensure_dir(&opts.output_dir)?;

    let (filtered, summary) = match temperature {
        Some(t) => {
            let weighted = filtered.with_weights(energy_column, t);
            let sorted = weighted.sorted_by(energy_column);
            (weighted, sorted)
        }
        None => (filtered.clone(), filtered.sorted_by(energy_column)),
    };

    let origin_path = opts.output_dir.join("energy_origin.csv");
    table.write_csv(&origin_path)?;
    output::print_written("all complete rows", &origin_path, table.rows.len());

    let filtered_path = opts.output_dir.join("energy_filtered.csv");
    filtered.write_csv(&filtered_path)?;
    output::print_written("filtered rows", &filtered_path, filtered.rows.len());

    let summary_path = opts.output_dir.join("summary.csv");
    summary.write_csv(&summary_path)?;
    output::print_written("sorted summary", &summary_path, summary.rows.len());

    print_lowest(&summary, energy_column, 5);

    if let Some(dir) = &opts.export_dir {
        fsio::ensure_dir(dir)?;
        let target = dir.join(export_name(root));
        fsio::copy_file(&summary_path, &target)?;
        output::print_success(&format!("Exported summary to '{}'", target.display()));
    }

    Ok(summary_path)
}

/// 导出文件名 `E_<root-name>_.csv`
pub fn export_name(root: &Path) -> String {
    let name = root
        .canonicalize()
        .ok()
        .as_deref()
        .map(fsio::file_name)
        .unwrap_or_else(|| fsio::file_name(root));
    format!("E_{}_.csv", name)
}

#[derive(Tabled)]
struct LowestRow {
    #[tabled(rename = "Rank")]
    rank: usize,
    #[tabled(rename = "Task")]
    task: u64,
    #[tabled(rename = "Energy (eV)")]
    energy: String,
    #[tabled(rename = "ΔE (eV)")]
    delta: String,
}

fn print_lowest(summary: &SummaryTable, energy_column: usize, count: usize) {
    let Some(first) = summary.rows.first() else {
        output::print_warning("No rows passed the filter");
        return;
    };
    let e0 = first.values[energy_column];
    let rows: Vec<LowestRow> = summary
        .rows
        .iter()
        .take(count)
        .enumerate()
        .map(|(i, r)| LowestRow {
            rank: i + 1,
            task: r.taskid,
            energy: format!("{:.6}", r.values[energy_column]),
            delta: format!("{:.6}", r.values[energy_column] - e0),
        })
        .collect();
    println!("{}", Table::new(&rows));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> SummaryTable {
        SummaryTable::from_records(
            vec!["Energy".into(), "Gnorm".into()],
            vec![
                Record {
                    taskid: 1,
                    values: vec![Some(-10.0), Some(0.01)],
                },
                Record {
                    taskid: 2,
                    values: vec![Some(-12.0), Some(0.0001)],
                },
                Record {
                    taskid: 3,
                    values: vec![None, Some(0.0)],
                },
                Record {
                    taskid: 4,
                    values: vec![Some(-11.0), Some(0.0002)],
                },
            ],
        )
    }

    #[test]
    fn test_incomplete_rows_dropped_and_sorted() {
        let t = table();
        assert_eq!(t.rows.len(), 3);
        let f = t.filtered(|r| r.values[1] < 0.001);
        let ids: Vec<u64> = f.sorted_by(0).rows.iter().map(|r| r.taskid).collect();
        assert_eq!(ids, vec![2, 4]);
    }

    #[test]
    fn test_weights_columns() {
        let t = table().with_weights(0, 300.0);
        assert_eq!(t.header.last().map(String::as_str), Some("Wi"));
        let wi: f64 = t.rows.iter().map(|r| r.values[3]).sum();
        assert!((wi - 1.0).abs() < 1e-12);
        // 最低能量的 Weight 为 1
        let lowest = t.rows.iter().find(|r| r.taskid == 2).unwrap();
        assert!((lowest.values[2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_write_summaries_and_export() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("VO_3");
        std::fs::create_dir(&root).unwrap();
        let opts = SummaryOpts {
            gout: "gulp_klmc.gout".into(),
            output_dir: dir.path().join("out"),
            export_dir: Some(dir.path().join("export")),
        };
        let t = table();
        let f = t.filtered(|r| r.values[1] < 0.001);
        let summary = write_summaries(&t, &f, 0, None, &root, &opts).unwrap();

        let text = std::fs::read_to_string(&summary).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Energy,Gnorm,taskid");
        assert_eq!(lines[1], "-12,0.0001,2");
        assert!(dir.path().join("export/E_VO_3_.csv").exists());
        assert!(dir.path().join("out/energy_origin.csv").exists());
    }
}
