//! # prepare 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/prepare.rs`

use super::{parse_replacement, parse_span};
use clap::{Args, Subcommand};
use std::path::PathBuf;

/// 默认的 fix-gin 替换
pub const DEFAULT_GIN_FIX: &str = "lbfgs_order 2000=lbfgs_order 5000";

/// prepare 主命令参数
#[derive(Args, Debug)]
pub struct PrepareArgs {
    #[command(subcommand)]
    pub command: PrepareCommands,
}

/// prepare 子命令
#[derive(Subcommand, Debug)]
pub enum PrepareCommands {
    /// Archive finished tasks and build restart decks from gulp.res
    Restart(RestartDeckArgs),

    /// Rename decks to A<id>.gin and normalise their options
    FixGin(FixGinArgs),

    /// Build one deck per k-combination of template lines
    Combinations(CombinationsArgs),

    /// Run a deck generator in VO_<i> directories and fix its decks
    Launch(LaunchArgs),
}

/// prepare restart 参数
#[derive(Args, Debug)]
pub struct RestartDeckArgs {
    /// Directory holding A<id> task directories
    pub root: PathBuf,

    /// Potential file appended to every restart deck
    #[arg(long)]
    pub potential: PathBuf,

    /// Task directory prefix
    #[arg(long, default_value = "A")]
    pub prefix: String,

    /// Archive directory (relative to root) receiving the finished tasks
    #[arg(long, default_value = "_data_rigid")]
    pub archive: String,

    /// Run directory (relative to root) receiving the new decks
    #[arg(long, default_value = "run")]
    pub run_dir: String,

    /// GULP output file name inside each task directory
    #[arg(long, default_value = "gulp_klmc.gout")]
    pub gout: String,

    /// Keep erroneous tasks
    #[arg(long, default_value_t = false)]
    pub no_error_check: bool,

    /// Text replacement applied to the new decks (FROM=TO, repeatable)
    #[arg(long, value_parser = parse_replacement)]
    pub replace: Vec<(String, String)>,
}

/// prepare fix-gin 参数
#[derive(Args, Debug)]
pub struct FixGinArgs {
    /// Directory holding the decks
    pub dir: PathBuf,

    /// Prefix of deck names to rename to A
    #[arg(long, default_value = "X")]
    pub from: String,

    /// Text replacement (FROM=TO, repeatable)
    #[arg(long, value_parser = parse_replacement, default_value = DEFAULT_GIN_FIX)]
    pub replace: Vec<(String, String)>,
}

/// prepare combinations 参数
#[derive(Args, Debug)]
pub struct CombinationsArgs {
    /// Template deck
    pub template: PathBuf,

    /// Inclusive 1-based line range to choose from
    #[arg(long, value_parser = parse_span, default_value = "22-43")]
    pub lines: (usize, usize),

    /// Number of lines per combination
    #[arg(short, default_value_t = 4)]
    pub k: usize,

    /// Output directory for A<i>.gin
    #[arg(short, long, default_value = "run")]
    pub output_dir: PathBuf,
}

/// prepare launch 参数
#[derive(Args, Debug)]
pub struct LaunchArgs {
    /// Deck generator to run in every directory
    #[arg(long)]
    pub program: String,

    /// Inclusive range of directory indices (a-b)
    #[arg(long, value_parser = parse_span)]
    pub range: (usize, usize),

    /// Parent directory of the VO_<i> directories
    #[arg(long, default_value = ".")]
    pub base: PathBuf,

    /// Directory prefix
    #[arg(long, default_value = "VO_")]
    pub dir_prefix: String,

    /// Prefix of generated deck names to rename to A
    #[arg(long, default_value = "X")]
    pub from: String,

    /// Text replacement applied to the generated decks (FROM=TO, repeatable)
    #[arg(long, value_parser = parse_replacement, default_value = DEFAULT_GIN_FIX)]
    pub replace: Vec<(String, String)>,

    /// Extra arguments passed to the program
    #[arg(last = true)]
    pub program_args: Vec<String>,
}
