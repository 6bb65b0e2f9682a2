//! # collect bulk 实现
//!
//! 汇总 Monte-Carlo 体相计算：能量、Gnorm、晶胞、介电、弹性与各物种静电势。
//!
//! ## 依赖关系
//! - 使用 `cli/collect.rs` 定义的 BulkArgs
//! - 使用 `parsers/gout.rs` 解析输出
//! - 使用 `batch/` 并行遍历任务目录

use super::{write_summaries, Record, SummaryTable};
use crate::batch::{BatchRunner, TaskDirs};
use crate::cli::collect::BulkArgs;
use crate::error::Result;
use crate::models::{DielectricTensor, GoutSummary};
use crate::parsers::gout;
use crate::utils::output;

/// 固定列（静电势列按物种追加在其后）
pub const BASE_COLUMNS: [&str; 31] = [
    "Energy",
    "Gnorm",
    "a",
    "b",
    "c",
    "alpha",
    "beta",
    "gamma",
    "V",
    "Density",
    "Static_xx",
    "Static_yy",
    "Static_zz",
    "eps0",
    "HighFreq_xx",
    "HighFreq_yy",
    "HighFreq_zz",
    "eps_inf",
    "Bulk0",
    "Shear0",
    "Young0",
    "C11",
    "C12",
    "C44",
    "Bulk_Voigt",
    "Bulk_Hill",
    "Shear_Voigt",
    "Shear_Hill",
    "Young_y",
    "Young_z",
    "Compressibility",
];

/// 执行 collect bulk
pub fn execute(args: BulkArgs) -> Result<()> {
    output::print_header("Collecting Bulk GULP Results");

    let tasks = TaskDirs::new(&args.root)
        .with_prefix(&args.batch.prefix)
        .collect_non_empty()?;
    output::print_info(&format!(
        "Found {} task directories under '{}'",
        tasks.len(),
        args.root.display()
    ));

    let runner = BatchRunner::new(args.batch.jobs);
    let records: Vec<Option<Record>> = runner.map(&tasks, "Parsing", |task| {
        let path = task.file(&args.summary.gout);
        if !path.is_file() {
            return None;
        }
        let summary = gout::parse_gout_file(&path).ok()?;
        if args.require_finished && !summary.finished {
            return None;
        }
        Some(Record {
            taskid: task.id,
            values: bulk_values(&summary, &args.species),
        })
    })?;

    let parsed = records.iter().flatten().count();
    output::print_info(&format!("{} of {} outputs parsed", parsed, tasks.len()));

    let table = SummaryTable::from_records(header(&args.species), records.into_iter().flatten().collect());
    let gnorm = table.column_index("Gnorm")?;
    let tol = args.gnorm_tol;
    let filtered = table.filtered(|r| r.values[gnorm] < tol);

    write_summaries(&table, &filtered, 0, args.temperature, &args.root, &args.summary)?;
    output::print_done("Bulk collection finished");
    Ok(())
}

/// 列名：固定列 + 每个物种的 V_<sp>_min/max/avg
pub fn header(species: &[String]) -> Vec<String> {
    let mut header: Vec<String> = BASE_COLUMNS.iter().map(|s| s.to_string()).collect();
    for sp in species {
        for stat in ["min", "max", "avg"] {
            header.push(format!("V_{}_{}", sp, stat));
        }
    }
    header
}

/// 一行的数值，顺序与 [`header`] 一致
pub fn bulk_values(s: &GoutSummary, species: &[String]) -> Vec<Option<f64>> {
    let mut v = vec![s.final_energy, s.final_gnorm];
    v.extend(s.cell);
    v.push(s.volume);
    v.push(s.density);

    v.extend(diagonal(&s.static_dielectric));
    v.push(s.eps0());
    v.extend(diagonal(&s.high_freq_dielectric));
    v.push(s.eps_inf());

    v.push(s.bulk_modulus.and_then(|m| m.reuss));
    v.push(s.shear_modulus.and_then(|m| m.reuss));
    v.push(s.youngs_moduli.and_then(|y| y[0]));

    let elastic = s.elastic.as_ref();
    v.push(elastic.and_then(|e| e.c11()));
    v.push(elastic.and_then(|e| e.c12()));
    v.push(elastic.and_then(|e| e.c44()));

    v.push(s.bulk_modulus.and_then(|m| m.voigt));
    v.push(s.bulk_modulus.and_then(|m| m.hill));
    v.push(s.shear_modulus.and_then(|m| m.voigt));
    v.push(s.shear_modulus.and_then(|m| m.hill));
    v.push(s.youngs_moduli.and_then(|y| y[1]));
    v.push(s.youngs_moduli.and_then(|y| y[2]));
    v.push(s.compressibility);

    for sp in species {
        match s.potential_stats(sp) {
            Some((min, max, avg)) => v.extend([Some(min), Some(max), Some(avg)]),
            None => v.extend([None; 3]),
        }
    }
    v
}

fn diagonal(tensor: &Option<DielectricTensor>) -> [Option<f64>; 3] {
    tensor.as_ref().map(DielectricTensor::diagonal).unwrap_or([None; 3])
}
