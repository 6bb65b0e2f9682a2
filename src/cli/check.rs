//! # check 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/check.rs`

use super::{parse_replacement, BatchOpts};
use clap::{Args, Subcommand};
use std::path::PathBuf;

/// check 主命令参数
#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(subcommand)]
    pub command: CheckCommands,
}

/// check 子命令
#[derive(Subcommand, Debug)]
pub enum CheckCommands {
    /// List task directories that still need a restart
    Restart(RestartArgs),

    /// List failed runs and collect final energies
    Errors(ErrorsArgs),

    /// List runs with imaginary modes or unconverged defect Gnorm
    Freq(FreqCheckArgs),

    /// Report the largest displacement of every GULP output
    Displacement(DisplacementArgs),

    /// List zero-length files
    Empty(EmptyArgs),
}

/// check restart 参数
#[derive(Args, Debug)]
pub struct RestartArgs {
    /// Root directory holding A<id> task directories
    pub root: PathBuf,

    /// Task directory prefix
    #[arg(long, default_value = "A")]
    pub prefix: String,

    /// File whose absence marks an unfinished task
    #[arg(long, default_value = "gulp.res")]
    pub marker: String,

    /// Output list of unfinished tasks
    #[arg(short, long, default_value = "restart_list.txt")]
    pub output: PathBuf,

    /// Remove std*, workgroup* directories and master.log
    #[arg(long, default_value_t = false)]
    pub clean: bool,

    /// Remove unfinished tasks and restart the task farm from the first one
    #[arg(long, default_value_t = false)]
    pub reset: bool,

    /// Task farm configuration rewritten by --reset
    #[arg(long, default_value = "taskfarm.config")]
    pub config: PathBuf,
}

/// check errors 参数
#[derive(Args, Debug)]
pub struct ErrorsArgs {
    /// Root directory holding A<id> task directories
    pub root: PathBuf,

    #[command(flatten)]
    pub batch: BatchOpts,

    /// GULP output file name inside each task directory
    #[arg(long, default_value = "gulp_klmc.gout")]
    pub gout: String,

    /// Read energies from the totalenergy line of gulp.res instead
    #[arg(long, default_value_t = false)]
    pub from_restart: bool,
}

/// check freq 参数
#[derive(Args, Debug)]
pub struct FreqCheckArgs {
    /// Root directory holding A<id> task directories
    pub root: PathBuf,

    #[command(flatten)]
    pub batch: BatchOpts,

    /// GULP output file name inside each task directory
    #[arg(long, default_value = "gulp_klmc.gout")]
    pub gout: String,

    /// Defect Gnorm above this value requires a restart
    #[arg(long, default_value_t = 1e-6)]
    pub gnorm_tol: f64,

    /// Output list of tasks to restart
    #[arg(short, long, default_value = "need_restart.txt")]
    pub output: PathBuf,

    /// Copy the decks of listed tasks into the restart directory
    #[arg(long, default_value_t = false)]
    pub prepare: bool,

    /// Directory holding the original <task>.gin decks
    #[arg(long, default_value = "run")]
    pub run_dir: PathBuf,

    /// Directory receiving A<i>.gin restart decks
    #[arg(long, default_value = "run_restart")]
    pub restart_dir: PathBuf,

    /// Text replacement applied to restart decks (FROM=TO, repeatable)
    #[arg(long, value_parser = parse_replacement, default_value = "# switch rfo 0.001=switch rfo 0.01")]
    pub replace: Vec<(String, String)>,
}

/// check displacement 参数
#[derive(Args, Debug)]
pub struct DisplacementArgs {
    /// Directory scanned recursively for GULP outputs
    pub root: PathBuf,

    /// Number of parallel jobs (0 = all cores)
    #[arg(short, long, default_value_t = 0, env = "GULPKIT_JOBS")]
    pub jobs: usize,

    /// Glob pattern of output files
    #[arg(long, default_value = "*.gout")]
    pub pattern: String,

    /// Output table (Directory,Max_Displacement)
    #[arg(short, long, default_value = "summary_max_differences.csv")]
    pub output: PathBuf,
}

/// check empty 参数
#[derive(Args, Debug)]
pub struct EmptyArgs {
    /// Directory to scan
    pub dir: PathBuf,

    /// Recurse into subdirectories
    #[arg(long, default_value_t = false)]
    pub recursive: bool,
}
