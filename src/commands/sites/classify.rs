//! # sites classify 实现
//!
//! 为 `VO.txt` 追加 `d1 d2 N1 N2 d3 VO_Class`，为掺杂表追加 `d4 <掺杂>_Class`。
//! 重复运行时覆盖已有的附加列。
//!
//! ## 依赖关系
//! - 使用 `geometry/neighbors.rs`, `geometry/classify.rs`

use super::report;
use crate::batch::{BatchRunner, ProcessResult, TaskDir, TaskDirs};
use crate::cli::sites::ClassifyArgs;
use crate::error::Result;
use crate::geometry::classify::{dopant_pair_label, vacancy_dopant_label, vacancy_pair_label};
use crate::geometry::neighbors::nearest_other;
use crate::geometry::{k_nearest, PointSet};
use crate::models::SiteRecord;
use crate::parsers::site_table;
use crate::utils::output;

/// 执行 sites classify
pub fn execute(args: ClassifyArgs) -> Result<()> {
    output::print_header("Classifying Vacancy and Dopant Distances");

    let tasks = TaskDirs::new(&args.root)
        .with_prefix(&args.batch.prefix)
        .collect_non_empty()?;
    let runner = BatchRunner::new(args.batch.jobs);
    let dopant_table = format!("{}.txt", args.dopant);

    let result = runner.run(&tasks, "Classifying", |task| {
        for name in ["VO.txt", dopant_table.as_str()] {
            if !task.file(name).is_file() {
                return ProcessResult::Skipped(format!("{}: {} not found", task.name, name));
            }
        }
        match classify_task(task, &dopant_table, &args.dopant) {
            Ok(()) => ProcessResult::Success(task.name.clone()),
            Err(e) => ProcessResult::Failed(task.name.clone(), e.to_string()),
        }
    })?;

    report(&result, "Classified");
    Ok(())
}

fn classify_task(task: &TaskDir, dopant_table: &str, dopant: &str) -> Result<()> {
    let vo_path = task.file("VO.txt");
    let dopant_path = task.file(dopant_table);
    let mut vacancies = site_table::read_site_table(&vo_path)?;
    let mut dopants = site_table::read_site_table(&dopant_path)?;

    classify(&mut vacancies, &mut dopants, dopant);

    site_table::write_site_table(&vo_path, &vacancies)?;
    site_table::write_site_table(&dopant_path, &dopants)?;
    Ok(())
}

/// 计算并替换两张表的附加列
pub fn classify(vacancies: &mut [SiteRecord], dopants: &mut [SiteRecord], dopant: &str) {
    let vo_points: PointSet = vacancies.iter().map(|r| r.position).collect();
    let dopant_points: PointSet = dopants.iter().map(|r| r.position).collect();

    let d3 = nearest_other(&vo_points);
    for (vo, d3) in vacancies.iter_mut().zip(d3) {
        let nearest = k_nearest(&vo.position, &dopant_points, 2);
        // 掺杂不足两个时按无穷远处理
        let d1 = nearest.first().copied().unwrap_or(f64::INFINITY);
        let d2 = nearest.get(1).copied().unwrap_or(f64::INFINITY);
        vo.extra = vec![
            format_distance(d1),
            format_distance(d2),
            vacancy_dopant_label(d1).to_string(),
            vacancy_dopant_label(d2).to_string(),
            format_distance(d3),
            vacancy_pair_label(d3).to_string(),
        ];
    }

    let d4 = nearest_other(&dopant_points);
    for (r, d4) in dopants.iter_mut().zip(d4) {
        r.extra = vec![format_distance(d4), dopant_pair_label(dopant, d4)];
    }
}

fn format_distance(d: f64) -> String {
    format!("{:.6}", d)
}
