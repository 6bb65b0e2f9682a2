//! # prepare 命令实现
//!
//! ## 功能
//! - `restart`: 归档已完成的任务，由 `gulp.res` + 势函数文件生成新输入
//! - `fix-gin`: 重命名 `X*.gin` → `A*.gin` 并规范化内容
//! - `combinations`: 从模板的指定行中取 k 行组合生成输入
//! - `launch`: 在 `VO_<i>` 目录运行输入生成程序并修正其输出
//!
//! ## 依赖关系
//! - 使用 `cli/prepare.rs` 定义的参数
//! - 使用 `parsers/gin.rs`, `parsers/restart.rs`
//! - 使用 `commands/check.rs` 的错误扫描

use crate::batch::{BatchRunner, FileCollector, ProcessResult, TaskDirs};
use crate::cli::prepare::{
    CombinationsArgs, FixGinArgs, LaunchArgs, PrepareArgs, PrepareCommands, RestartDeckArgs,
};
use crate::commands::check;
use crate::error::{GulpkitError, Result};
use crate::parsers::{gin, restart};
use crate::utils::{fsio, output};

use itertools::Itertools;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;

/// 执行 prepare 命令
pub fn execute(args: PrepareArgs) -> Result<()> {
    match args.command {
        PrepareCommands::Restart(a) => prepare_restart(a),
        PrepareCommands::FixGin(a) => {
            output::print_header("Fixing GULP Input Decks");
            let n = fix_gin_dir(&a.dir, &a.from, &a.replace)?;
            output::print_done(&format!("Processed {} decks in '{}'", n, a.dir.display()));
            Ok(())
        }
        PrepareCommands::Combinations(a) => prepare_combinations(a),
        PrepareCommands::Launch(a) => launch(a),
    }
}

// ─────────────────────────────────────────────────────────────
// restart
// ─────────────────────────────────────────────────────────────

fn prepare_restart(args: RestartDeckArgs) -> Result<()> {
    output::print_header("Preparing Restart Decks");

    let potential = fsio::read_text(&args.potential)?;
    let archive = args.root.join(&args.archive);
    let run_dir = args.root.join(&args.run_dir);

    // Step 1: 归档任务目录，清理 workgroup 与 run
    fsio::ensure_dir(&archive)?;
    let tasks = TaskDirs::new(&args.root).with_prefix(&args.prefix).collect()?;
    for task in &tasks {
        let target = archive.join(&task.name);
        if target.exists() {
            return Err(GulpkitError::Other(format!(
                "'{}' already exists in the archive",
                task.name
            )));
        }
        fs::rename(&task.path, &target).map_err(|e| GulpkitError::write(&target, e))?;
    }
    remove_prefixed_dirs(&args.root, "workgroup")?;
    fsio::remove_path(&run_dir)?;
    fsio::ensure_dir(&run_dir)?;
    output::print_info(&format!(
        "Moved {} task directories into '{}'",
        tasks.len(),
        archive.display()
    ));

    // Step 2: 错误任务与能量
    let runner = BatchRunner::new(0);
    let mut tasks = TaskDirs::new(&archive).with_prefix(&args.prefix).collect()?;
    if !args.no_error_check {
        let scan = check::scan_errors(&tasks, &args.gout, false, &runner)?;
        check::write_error_scan(&archive, &scan)?;
        tasks.retain(|t| !scan.errors.contains(&t.name));
    }
    let names: Vec<&str> = tasks.iter().map(|t| t.name.as_str()).collect();
    let name_log = archive.join("name.log");
    fsio::write_lines(&name_log, &names)?;
    output::print_written("tasks to restart", &name_log, names.len());

    // Step 3: 生成新输入
    let result = runner.run(&tasks, "Writing decks", |task| {
        let res = task.file("gulp.res");
        if !res.is_file() {
            return ProcessResult::Skipped(format!("{} - gulp.res not found", task.name));
        }
        let written = fsio::read_text(&res).and_then(|text| {
            let deck = restart_deck(&text, &potential, &args.replace);
            let path = task.file(&format!("{}.gin", task.name));
            fsio::write_text(&path, &deck)?;
            fsio::copy_file(&path, &run_dir.join(format!("{}.gin", task.name)))
        });
        match written {
            Ok(()) => ProcessResult::Success(task.name.clone()),
            Err(e) => ProcessResult::Failed(task.name.clone(), e.to_string()),
        }
    })?;

    for skip in &result.skips {
        output::print_skip(skip);
    }
    output::print_failures(&result.failures, 10);
    output::print_done(&format!(
        "{} decks written to '{}', {} skipped, {} failed",
        result.success,
        run_dir.display(),
        result.skipped,
        result.failed
    ));
    Ok(())
}

/// 重启输入：截断的 `gulp.res` + 势函数 + 文本替换
pub fn restart_deck(res_text: &str, potential: &str, replace: &[(String, String)]) -> String {
    let mut deck = restart::truncate_for_input(res_text);
    deck.push_str(potential);
    gin::apply_replacements(&deck, replace)
}

fn remove_prefixed_dirs(root: &Path, prefix: &str) -> Result<()> {
    let entries = fs::read_dir(root).map_err(|e| GulpkitError::read(root, e))?;
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.is_dir() && fsio::file_name(&path).starts_with(prefix) {
            fsio::remove_path(&path)?;
        }
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────
// fix-gin
// ─────────────────────────────────────────────────────────────

/// 规范化一个输入：固定位点标志、删除 `output xyz` 行、文本替换
pub fn fix_gin_text(text: &str, replace: &[(String, String)]) -> String {
    let text = gin::normalize_flags(text);
    let text = gin::strip_output_xyz(&text);
    gin::apply_replacements(&text, replace)
}

/// 重命名 `<from><rest>.gin` → `A<rest>.gin` 并修正目录中所有 `.gin`；返回处理数量
pub fn fix_gin_dir(dir: &Path, from: &str, replace: &[(String, String)]) -> Result<usize> {
    if !dir.is_dir() {
        return Err(GulpkitError::DirectoryNotFound {
            path: dir.display().to_string(),
        });
    }

    if from != "A" {
        let generated = FileCollector::new(dir)
            .with_pattern(&format!("{}*.gin", from))?
            .collect();
        for path in generated {
            let name = fsio::file_name(&path);
            let Some(rest) = name.strip_prefix(from) else {
                continue;
            };
            let target = dir.join(format!("A{}", rest));
            fs::rename(&path, &target).map_err(|e| GulpkitError::write(&target, e))?;
        }
    }

    let decks = FileCollector::new(dir).with_pattern("*.gin")?.collect();
    for path in &decks {
        let text = fsio::read_text(path)?;
        fsio::write_text(path, &fix_gin_text(&text, replace))?;
    }
    Ok(decks.len())
}

// ─────────────────────────────────────────────────────────────
// combinations
// ─────────────────────────────────────────────────────────────

/// 由模板生成全部组合输入的内容（1 起始闭区间 `lines`）
pub fn combination_decks(template: &str, lines: (usize, usize), k: usize) -> Result<Vec<String>> {
    let all: Vec<&str> = template.split_inclusive('\n').collect();
    let (first, last) = lines;
    if first == 0 || last > all.len() || first > last {
        return Err(GulpkitError::InvalidRange(format!(
            "lines {}-{} outside a template of {} lines",
            first,
            last,
            all.len()
        )));
    }
    let prefix = all[..first - 1].concat();
    let body = &all[first - 1..last];
    let suffix = all[last..].concat();

    // 字典序，与逐层嵌套循环的顺序一致
    Ok((0..body.len())
        .combinations(k)
        .map(|combo| {
            let mut deck = prefix.clone();
            for i in combo {
                deck.push_str(body[i]);
            }
            deck.push_str(&suffix);
            deck
        })
        .collect())
}

fn prepare_combinations(args: CombinationsArgs) -> Result<()> {
    output::print_header("Generating Line Combinations");

    let template = fsio::read_text(&args.template)?;
    let decks = combination_decks(&template, args.lines, args.k)?;
    output::print_info(&format!("Total combinations: {}", decks.len()));

    fsio::ensure_dir(&args.output_dir)?;
    for (i, deck) in decks.iter().enumerate() {
        fsio::write_text(&args.output_dir.join(format!("A{}.gin", i)), deck)?;
    }
    output::print_done(&format!(
        "Wrote {} decks to '{}'",
        decks.len(),
        args.output_dir.display()
    ));
    Ok(())
}

// ─────────────────────────────────────────────────────────────
// launch
// ─────────────────────────────────────────────────────────────

fn launch(args: LaunchArgs) -> Result<()> {
    output::print_header("Launching Deck Generator");

    let (start, end) = args.range;
    let mut done = 0;
    for i in start..=end {
        let dir = args.base.join(format!("{}{}", args.dir_prefix, i));
        if !dir.is_dir() {
            output::print_skip(&format!("{} does not exist", dir.display()));
            continue;
        }
        output::print_info(&format!("Running {} in {}", args.program, dir.display()));

        match run_program(&args.program, &args.program_args, &dir) {
            Ok(()) => {}
            Err(e @ GulpkitError::CommandNotFound { .. }) => return Err(e),
            Err(e) => {
                output::print_error(&e.to_string());
                continue;
            }
        }

        let run = dir.join("run");
        let stale = remove_stale_outputs(&run)?;
        let fixed = fix_gin_dir(&run, &args.from, &args.replace)?;
        output::print_success(&format!(
            "{}: {} decks fixed, {} stale outputs removed",
            fsio::file_name(&dir),
            fixed,
            stale
        ));
        done += 1;
    }

    output::print_done(&format!("Launched in {} directories", done));
    Ok(())
}

/// 在目录中运行外部程序
fn run_program(program: &str, program_args: &[String], dir: &Path) -> Result<()> {
    let out = Command::new(program)
        .args(program_args)
        .current_dir(dir)
        .output()
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => GulpkitError::CommandNotFound {
                command: program.to_string(),
            },
            _ => GulpkitError::CommandFailed {
                command: program.to_string(),
                stderr: e.to_string(),
            },
        })?;

    if !out.status.success() {
        return Err(GulpkitError::CommandFailed {
            command: format!("{} (in {})", program, dir.display()),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        });
    }
    Ok(())
}

/// 删除上一次运行留下的 `.out` 文件
fn remove_stale_outputs(run: &Path) -> Result<usize> {
    let stale = FileCollector::new(run).with_pattern("*.out")?.collect();
    for path in &stale {
        fsio::remove_path(path)?;
    }
    Ok(stale.len())
}
