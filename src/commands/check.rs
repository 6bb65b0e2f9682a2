//! # check 命令实现
//!
//! ## 功能
//! - `restart`: 找出缺少 `gulp.res` 的任务，可选清理与重置 task farm
//! - `errors`: 输出含 `ERROR` 的任务与最终能量行
//! - `freq`: 找出虚频或缺陷 Gnorm 未收敛的任务，可选生成重启输入
//! - `displacement`: 递归统计每个 `.gout` 的最大位移
//! - `empty`: 列出空文件
//!
//! ## 依赖关系
//! - 使用 `cli/check.rs` 定义的参数
//! - 使用 `batch/`, `parsers/gout.rs`, `parsers/restart.rs`, `parsers/gin.rs`

use crate::batch::{BatchRunner, FileCollector, TaskDir, TaskDirs};
use crate::cli::check::{
    CheckArgs, CheckCommands, DisplacementArgs, EmptyArgs, ErrorsArgs, FreqCheckArgs, RestartArgs,
};
use crate::error::{GulpkitError, Result};
use crate::models::GoutSummary;
use crate::parsers::{gin, gout, restart};
use crate::utils::{fsio, output};

use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tabled::{Table, Tabled};

static TASK_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"task_start.*").expect("static regex"));

/// 执行 check 命令
pub fn execute(args: CheckArgs) -> Result<()> {
    match args.command {
        CheckCommands::Restart(a) => check_restart(a),
        CheckCommands::Errors(a) => check_errors(a),
        CheckCommands::Freq(a) => check_freq(a),
        CheckCommands::Displacement(a) => check_displacement(a),
        CheckCommands::Empty(a) => check_empty(a),
    }
}

// ─────────────────────────────────────────────────────────────
// restart
// ─────────────────────────────────────────────────────────────

fn check_restart(args: RestartArgs) -> Result<()> {
    output::print_header("Checking Unfinished Tasks");

    if args.clean {
        let removed = clean_task_farm(&args.root)?;
        output::print_info(&format!("Removed {} task-farm leftovers", removed));
    }

    let tasks = TaskDirs::new(&args.root).with_prefix(&args.prefix).collect()?;
    let unfinished = unfinished_tasks(&tasks, &args.marker);

    let names: Vec<&str> = unfinished.iter().map(|t| t.name.as_str()).collect();
    fsio::write_lines(&args.output, &names)?;
    output::print_written("tasks without marker", &args.output, names.len());

    let (Some(first), Some(last)) = (unfinished.first(), unfinished.last()) else {
        output::print_success("No restart is needed");
        return Ok(());
    };
    output::print_info(&format!("Restart from No.: {}", first.id));
    output::print_info(&format!("Restart to No.: {}", last.id));

    if args.reset {
        for id in first.id..=last.id {
            fsio::remove_path(&args.root.join(format!("{}{}", args.prefix, id)))?;
        }
        let config = args.root.join(&args.config);
        let text = fsio::read_text(&config)?;
        fsio::write_text(&config, &reset_task_start(&text, first.id))?;
        output::print_success(&format!(
            "Removed {}{}..={}{} and set task_start {} in '{}'",
            args.prefix,
            first.id,
            args.prefix,
            last.id,
            first.id,
            config.display()
        ));
    }

    Ok(())
}

/// 缺少标记文件的任务（保持编号顺序）
pub fn unfinished_tasks<'a>(tasks: &'a [TaskDir], marker: &str) -> Vec<&'a TaskDir> {
    tasks.iter().filter(|t| !t.file(marker).exists()).collect()
}

/// 删除 `std*`、`workgroup*` 目录与 `master.log`，返回删除数量
pub fn clean_task_farm(root: &Path) -> Result<usize> {
    let entries = fs::read_dir(root).map_err(|e| GulpkitError::read(root, e))?;
    let mut removed = 0;
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        let name = fsio::file_name(&path);
        let leftover = (path.is_dir() && (name.starts_with("std") || name.starts_with("workgroup")))
            || name == "master.log";
        if leftover {
            fsio::remove_path(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// 把 `task_start ...` 改写为新的起始编号
pub fn reset_task_start(config: &str, start: u64) -> String {
    TASK_START
        .replace_all(config, format!("task_start {}", start).as_str())
        .into_owned()
}

// ─────────────────────────────────────────────────────────────
// errors
// ─────────────────────────────────────────────────────────────

/// 错误任务与能量行的扫描结果
#[derive(Debug, Default)]
pub struct ErrorScan {
    /// 输出含 `ERROR` 的任务名
    pub errors: Vec<String>,
    /// `Final energy`（或 `totalenergy`）行
    pub energies: Vec<String>,
}

/// 并行扫描任务的错误与能量行
pub fn scan_errors(
    tasks: &[TaskDir],
    gout_name: &str,
    from_restart: bool,
    runner: &BatchRunner,
) -> Result<ErrorScan> {
    let per_task = runner.map(tasks, "Scanning", |task| {
        let text = fsio::read_text(&task.file(gout_name)).ok();
        let failed = text.as_deref().is_some_and(|t| t.contains("ERROR"));
        let energies: Vec<String> = if from_restart {
            fsio::read_text(&task.file("gulp.res"))
                .ok()
                .and_then(|t| restart::total_energy_line(&t))
                .into_iter()
                .collect()
        } else {
            text.as_deref()
                .map(|t| {
                    t.lines()
                        .filter(|l| l.contains("Final energy"))
                        .map(|l| l.trim().to_string())
                        .collect()
                })
                .unwrap_or_default()
        };
        (failed, energies)
    })?;

    let mut scan = ErrorScan::default();
    for (task, (failed, energies)) in tasks.iter().zip(per_task) {
        if failed {
            scan.errors.push(task.name.clone());
        }
        scan.energies.extend(energies);
    }
    Ok(scan)
}

/// 把扫描结果写为 `error.txt` 与 `energy.txt`
pub fn write_error_scan(dir: &Path, scan: &ErrorScan) -> Result<()> {
    let errors = dir.join("error.txt");
    fsio::write_lines(&errors, &scan.errors)?;
    output::print_written("erroneous tasks", &errors, scan.errors.len());

    let energies = dir.join("energy.txt");
    fsio::write_lines(&energies, &scan.energies)?;
    output::print_written("energy lines", &energies, scan.energies.len());
    Ok(())
}

fn check_errors(args: ErrorsArgs) -> Result<()> {
    output::print_header("Checking GULP Errors");

    let tasks = TaskDirs::new(&args.root)
        .with_prefix(&args.batch.prefix)
        .collect_non_empty()?;
    let runner = BatchRunner::new(args.batch.jobs);
    let scan = scan_errors(&tasks, &args.gout, args.from_restart, &runner)?;

    write_error_scan(&args.root, &scan)?;
    if scan.errors.is_empty() {
        output::print_success("No ERROR found");
    } else {
        for name in &scan.errors {
            output::print_error(name);
        }
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────
// freq
// ─────────────────────────────────────────────────────────────

/// 是否需要重启：第一频率为负或缺陷 Gnorm 超过阈值
pub fn needs_restart(summary: &GoutSummary, gnorm_tol: f64) -> bool {
    let imaginary = summary.first_frequency().is_some_and(|f| f < 0.0);
    let unconverged = summary.defect_gnorm.is_some_and(|g| g > gnorm_tol);
    imaginary || unconverged
}

fn check_freq(args: FreqCheckArgs) -> Result<()> {
    output::print_header("Checking Frequencies and Defect Gnorm");

    let tasks = TaskDirs::new(&args.root)
        .with_prefix(&args.batch.prefix)
        .collect_non_empty()?;
    let runner = BatchRunner::new(args.batch.jobs);

    let flags = runner.map(&tasks, "Checking", |task| {
        match gout::parse_gout_file(&task.file(&args.gout)) {
            Ok(summary) => needs_restart(&summary, args.gnorm_tol),
            // 无法读取的输出同样需要重启
            Err(_) => true,
        }
    })?;

    let restart: Vec<&str> = tasks
        .iter()
        .zip(&flags)
        .filter(|(_, flag)| **flag)
        .map(|(t, _)| t.name.as_str())
        .collect();

    fsio::write_lines(&args.output, &restart)?;
    output::print_written("tasks needing restart", &args.output, restart.len());

    if args.prepare {
        let run_dir = args.root.join(&args.run_dir);
        let restart_dir = args.root.join(&args.restart_dir);
        let written = prepare_restart_decks(&restart, &run_dir, &restart_dir, &args.replace)?;
        output::print_done(&format!(
            "Wrote {} restart decks to '{}'",
            written,
            restart_dir.display()
        ));
    }
    Ok(())
}

/// 把 `run/<task>.gin` 复制为 `run_restart/A<i>.gin` 并做文本替换；
/// 重启目录会被重新创建。返回写出的数量
pub fn prepare_restart_decks(
    tasks: &[&str],
    run_dir: &Path,
    restart_dir: &Path,
    replace: &[(String, String)],
) -> Result<usize> {
    fsio::remove_path(restart_dir)?;
    fsio::ensure_dir(restart_dir)?;

    let mut written = 0;
    for (i, task) in tasks.iter().enumerate() {
        let source = run_dir.join(format!("{}.gin", task));
        if !source.is_file() {
            output::print_skip(&format!("File not found: {}", source.display()));
            continue;
        }
        let text = fsio::read_text(&source)?;
        let target = restart_dir.join(format!("A{}.gin", i));
        fsio::write_text(&target, &gin::apply_replacements(&text, replace))?;
        written += 1;
    }
    Ok(written)
}

// ─────────────────────────────────────────────────────────────
// displacement
// ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Tabled)]
struct DisplacementRow {
    #[serde(rename = "Directory")]
    #[tabled(rename = "Directory")]
    directory: String,
    #[serde(rename = "Max_Displacement")]
    #[tabled(rename = "Max displacement (Å)")]
    max_displacement: f64,
}

fn check_displacement(args: DisplacementArgs) -> Result<()> {
    output::print_header("Checking Maximum Displacements");

    if !args.root.is_dir() {
        return Err(GulpkitError::DirectoryNotFound {
            path: args.root.display().to_string(),
        });
    }
    let files = FileCollector::new(&args.root)
        .with_pattern(&args.pattern)?
        .recursive(true)
        .collect();
    if files.is_empty() {
        return Err(GulpkitError::NoFilesFound {
            pattern: args.pattern.clone(),
        });
    }
    output::print_info(&format!("Total files to process: {}", files.len()));

    let runner = BatchRunner::new(args.jobs);
    let maxima: Vec<Option<f64>> = runner.map(&files, "Parsing", |path| {
        gout::parse_gout_file(path).ok().and_then(|s| s.max_displacement)
    })?;

    let rows: Vec<DisplacementRow> = files
        .iter()
        .zip(maxima)
        .filter_map(|(path, max)| {
            max.map(|m| DisplacementRow {
                directory: parent_name(path),
                max_displacement: m,
            })
        })
        .collect();

    write_rows(&args.output, &rows)?;
    output::print_written("maximum displacements", &args.output, rows.len());

    let mut largest: Vec<&DisplacementRow> = rows.iter().collect();
    largest.sort_by(|a, b| b.max_displacement.abs().total_cmp(&a.max_displacement.abs()));
    largest.truncate(5);
    if !largest.is_empty() {
        println!("{}", Table::new(largest));
    }
    Ok(())
}

/// 文件所在目录名
fn parent_name(path: &Path) -> String {
    path.parent().map(fsio::file_name).unwrap_or_default()
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush().map_err(|e| GulpkitError::write(path, e))?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────
// empty
// ─────────────────────────────────────────────────────────────

/// 零长度文件
pub fn empty_files(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(GulpkitError::DirectoryNotFound {
            path: dir.display().to_string(),
        });
    }
    Ok(FileCollector::new(dir)
        .recursive(recursive)
        .collect()
        .into_iter()
        .filter(|p| fs::metadata(p).map(|m| m.len() == 0).unwrap_or(false))
        .collect())
}

fn check_empty(args: EmptyArgs) -> Result<()> {
    output::print_header("Checking Empty Files");

    let empty = empty_files(&args.dir, args.recursive)?;
    if empty.is_empty() {
        output::print_success("No empty files found");
        return Ok(());
    }
    for path in &empty {
        output::print_warning(&path.display().to_string());
    }
    output::print_info(&format!("{} empty files", empty.len()));
    Ok(())
}
