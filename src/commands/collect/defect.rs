//! # collect defect 实现
//!
//! Mott-Littleton 缺陷计算汇总：缺陷能量、Gnorm、第一振动频率、
//! region 1 静电势、掺杂原子坐标与最大位移。
//!
//! ## 依赖关系
//! - 使用 `cli/collect.rs` 定义的 DefectArgs
//! - 使用 `parsers/gout.rs`, `parsers/gin.rs`

use super::{write_summaries, Record, SummaryTable};
use crate::batch::{BatchRunner, TaskDir, TaskDirs};
use crate::cli::collect::DefectArgs;
use crate::error::Result;
use crate::models::GoutSummary;
use crate::parsers::{gin, gout};
use crate::utils::{fsio, output};

/// 执行 collect defect
pub fn execute(args: DefectArgs) -> Result<()> {
    output::print_header("Collecting Mott-Littleton Defect Results");

    let tasks = TaskDirs::new(&args.root)
        .with_prefix(&args.batch.prefix)
        .collect_non_empty()?;
    output::print_info(&format!("Found {} task directories", tasks.len()));

    let runner = BatchRunner::new(args.batch.jobs);
    let records: Vec<Option<Record>> = runner.map(&tasks, "Parsing", |task| collect_task(task, &args))?;

    let table = SummaryTable::from_records(header(&args.species, args.impurities), records.into_iter().flatten().collect());
    let (gnorm, freq, disp) = (
        table.column_index("Gnorm")?,
        table.column_index("first_freq")?,
        table.column_index("max_displacement")?,
    );
    let (tol, max_disp) = (args.gnorm_tol, args.max_displacement);
    let filtered = table.filtered(|r| passes(r.values[gnorm], r.values[freq], r.values[disp], tol, max_disp));

    output::print_info(&format!(
        "{} rows passed, {} failed",
        filtered.rows.len(),
        tasks.len() - filtered.rows.len()
    ));

    write_summaries(&table, &filtered, 0, None, &args.root, &args.summary)?;
    output::print_done("Defect collection finished");
    Ok(())
}

fn collect_task(task: &TaskDir, args: &DefectArgs) -> Option<Record> {
    let gout_path = task.file(&args.summary.gout);
    let gin_path = task.file(&args.gin);
    if !gout_path.is_file() || !gin_path.is_file() {
        return None;
    }
    let summary = gout::parse_gout_file(&gout_path).ok()?;
    let deck = fsio::read_text(&gin_path).ok()?;
    let impurities = gin::impurity_coords(&deck, &args.dopant);

    let values = defect_values(&summary, &impurities, &args.species, args.impurities)?;
    Some(Record {
        taskid: task.id,
        values,
    })
}

/// 列名
pub fn header(species: &[String], impurities: usize) -> Vec<String> {
    let mut cols: Vec<String> = vec!["Energy".into(), "Gnorm".into(), "first_freq".into()];
    for sp in species {
        for stat in ["min", "max", "avg"] {
            cols.push(format!("V_{}_{}", sp, stat));
        }
    }
    for i in 1..=impurities {
        for axis in ["x", "y", "z"] {
            cols.push(format!("d{}{}", i, axis));
        }
    }
    cols.push("max_displacement".into());
    cols
}

/// 一行的数值；缺少能量、Gnorm 或掺杂数不对时返回 None。
///
/// 缺少频率或位移段时写 NaN，该行保留在 origin 表但不会通过筛选。
pub fn defect_values(
    s: &GoutSummary,
    impurities: &[[f64; 3]],
    species: &[String],
    expected: usize,
) -> Option<Vec<Option<f64>>> {
    let energy = s.defect_energy?;
    let gnorm = s.defect_gnorm?;
    if impurities.len() != expected {
        return None;
    }

    let mut v = vec![
        Some(energy),
        Some(gnorm),
        Some(s.first_frequency().unwrap_or(f64::NAN)),
    ];
    for sp in species {
        match s.potential_stats(sp) {
            Some((min, max, avg)) => v.extend([Some(min), Some(max), Some(avg)]),
            None => v.extend([None; 3]),
        }
    }
    for p in impurities {
        v.extend(p.iter().copied().map(Some));
    }
    v.push(Some(s.max_displacement.unwrap_or(f64::NAN)));
    Some(v)
}

/// 筛选：Gnorm 低于阈值、第一频率非负、位移绝对值不超过上限
pub fn passes(gnorm: f64, first_freq: f64, displacement: f64, tol: f64, max_disp: f64) -> bool {
    gnorm < tol && first_freq >= 0.0 && displacement.abs() <= max_disp
}
