//! # sites 子命令实现
//!
//! 纳米颗粒计算的空位定位与位点表维护。位点表格式见 `parsers/site_table.rs`。
//!
//! ## 依赖关系
//! - 使用 `cli/sites.rs` 定义的参数
//! - 子模块: missing, locate, refine, update, classify, coord
//! - 使用 `geometry/` 的近邻与优化工具

pub mod classify;
pub mod coord;
pub mod locate;
pub mod missing;
pub mod refine;
pub mod update;

use crate::batch::BatchResult;
use crate::cli::sites::{SitesArgs, SitesCommands};
use crate::error::Result;
use crate::utils::output;

/// 执行 sites 命令
pub fn execute(args: SitesArgs) -> Result<()> {
    match args.command {
        SitesCommands::Missing(a) => missing::execute(a),
        SitesCommands::Locate(a) => locate::execute(a),
        SitesCommands::Refine(a) => refine::execute(a),
        SitesCommands::Update(a) => update::execute(a),
        SitesCommands::Classify(a) => classify::execute(a),
        SitesCommands::Coord(a) => coord::execute(a),
    }
}

/// 打印批处理汇总
fn report(result: &BatchResult, action: &str) {
    for skip in &result.skips {
        output::print_skip(skip);
    }
    output::print_failures(&result.failures, 10);
    output::print_separator();
    output::print_done(&format!(
        "{} {} tasks ({} skipped, {} failed, {} total)",
        action,
        result.success,
        result.skipped,
        result.failed,
        result.total()
    ));
}
