//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `batch/`, `parsers/`, `models/`, `utils/`
//! - 子模块: collect, check, prepare, sites, analyze

pub mod analyze;
pub mod check;
pub mod collect;
pub mod prepare;
pub mod sites;

use crate::cli::Commands;
use crate::error::Result;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Collect(args) => collect::execute(args),
        Commands::Check(args) => check::execute(args),
        Commands::Prepare(args) => prepare::execute(args),
        Commands::Sites(args) => sites::execute(args),
        Commands::Analyze(args) => analyze::execute(args),
    }
}
