//! # sites update 实现
//!
//! 用 `gulp.res` 中优化后的核坐标（按物种顺序）替换位点表坐标并重算 D 列；
//! 存在 `VO_opt.txt` 时只重算其 D 列。
//!
//! ## 依赖关系
//! - 使用 `parsers/restart.rs`, `parsers/site_table.rs`

use super::report;
use crate::batch::{BatchRunner, ProcessResult, TaskDir, TaskDirs};
use crate::cli::sites::UpdateArgs;
use crate::error::{GulpkitError, Result};
use crate::models::SiteRecord;
use crate::parsers::restart::{self, CoreSite};
use crate::parsers::site_table;
use crate::utils::{fsio, output};

/// 执行 sites update
pub fn execute(args: UpdateArgs) -> Result<()> {
    output::print_header("Updating Site Tables from gulp.res");

    let tasks = TaskDirs::new(&args.root)
        .with_prefix(&args.batch.prefix)
        .collect_non_empty()?;
    let runner = BatchRunner::new(args.batch.jobs);

    let result = runner.run(&tasks, "Updating", |task| {
        if !task.file("gulp.res").is_file() {
            return ProcessResult::Skipped(format!("{}: gulp.res not found", task.name));
        }
        match update_task(task, &args) {
            Ok(()) => ProcessResult::Success(task.name.clone()),
            Err(e) => ProcessResult::Failed(task.name.clone(), e.to_string()),
        }
    })?;

    report(&result, "Updated");
    Ok(())
}

fn update_task(task: &TaskDir, args: &UpdateArgs) -> Result<()> {
    let res_path = task.file("gulp.res");
    let cores = restart::parse_cartesian_cores(&fsio::read_text(&res_path)?);

    for sp in &args.species {
        let path = task.file(&format!("{}.txt", sp));
        if !path.is_file() {
            continue;
        }
        let mut records = site_table::read_site_table(&path)?;
        apply_cores(&mut records, sp, &cores, &args.center).map_err(|reason| {
            GulpkitError::parse("gulp.res", &res_path, format!("{}.txt: {}", sp, reason))
        })?;
        site_table::write_site_table(&path, &records)?;
    }

    let vo_opt = task.file("VO_opt.txt");
    if vo_opt.is_file() {
        let mut records = site_table::read_site_table(&vo_opt)?;
        for r in records.iter_mut() {
            r.update_distance(&args.center);
        }
        site_table::write_site_table(&vo_opt, &records)?;
    }
    Ok(())
}

/// 依次把该物种的核坐标写入同元素的行并重算距离；核数不足时报错
pub fn apply_cores(
    records: &mut [SiteRecord],
    species: &str,
    cores: &[CoreSite],
    center: &[f64; 3],
) -> std::result::Result<(), String> {
    let mut positions = cores.iter().filter(|c| c.element == species).map(|c| c.position);
    for r in records.iter_mut().filter(|r| r.element == species) {
        let p = positions
            .next()
            .ok_or_else(|| format!("fewer {} cores than table rows", species))?;
        r.position = p;
        r.update_distance(center);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::BatchOpts;

    const RES: &str = "\
cartesian
Ce core 0.0 0.0 1/2
O  core 1.0 0.0 0.0
La core 0.0 3.0 0.0
O  core 0.0 0.0 2.0
totalenergy -10.0 eV
";

    #[test]
    fn test_apply_cores() {
        let cores = restart::parse_cartesian_cores(RES);
        let mut rows = vec![
            SiteRecord::new("O", [9.0; 3], "4"),
            SiteRecord::new("O", [9.0; 3], "3"),
        ];
        apply_cores(&mut rows, "O", &cores, &[0.0; 3]).unwrap();
        assert_eq!(rows[1].position, [0.0, 0.0, 2.0]);
        assert_eq!(rows[1].distance, 2.0);
        assert_eq!(rows[1].cn, "3");

        let mut three = vec![SiteRecord::new("La", [0.0; 3], "7"); 2];
        assert!(apply_cores(&mut three, "La", &cores, &[0.0; 3]).is_err());
    }

    #[test]
    fn test_execute_updates_tables() {
        let dir = tempfile::tempdir().unwrap();
        let task = dir.path().join("A1");
        std::fs::create_dir(&task).unwrap();
        std::fs::write(task.join("gulp.res"), RES).unwrap();
        std::fs::write(task.join("Ce.txt"), "Ce 5.0 5.0 5.0 8.66 8 bulk\n").unwrap();
        std::fs::write(task.join("VO_opt.txt"), "O 0.0 4.0 0.0 0.00 4 bulk\n").unwrap();

        execute(UpdateArgs {
            root: dir.path().to_path_buf(),
            batch: BatchOpts {
                jobs: 1,
                prefix: "A".into(),
            },
            center: [0.0; 3],
            species: vec!["La".into(), "Ce".into(), "O".into()],
        })
        .unwrap();

        let ce = site_table::read_site_table(&task.join("Ce.txt")).unwrap();
        assert_eq!(ce[0].position, [0.0, 0.0, 0.5]);
        assert_eq!(ce[0].distance, 0.5);
        let vo = site_table::read_site_table(&task.join("VO_opt.txt")).unwrap();
        assert_eq!(vo[0].distance, 4.0);
    }
}
