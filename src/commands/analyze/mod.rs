//! # analyze 命令实现
//!
//! 分析功能统一入口，包含多个子命令：
//! - `distribution` / `sample` / `radius`: 位点径向分布统计
//! - `ensemble`: 巨正则系综分析
//! - `dos`: 能量态密度
//! - `xrd`: 加权 X 射线衍射图样
//! - `freq-lookup`: 查询频率归档
//!
//! ## 依赖关系
//! - 使用 `cli/analyze.rs` 定义的参数
//! - 子模块: distribution, sample, radius, ensemble, dos, xrd, freq_lookup

pub mod distribution;
pub mod dos;
pub mod ensemble;
pub mod freq_lookup;
pub mod radius;
pub mod sample;
pub mod xrd;

use crate::cli::analyze::{AnalyzeArgs, AnalyzeCommands};
use crate::error::Result;

/// 执行 analyze 命令
pub fn execute(args: AnalyzeArgs) -> Result<()> {
    match args.command {
        AnalyzeCommands::Distribution(a) => distribution::execute(a),
        AnalyzeCommands::Sample(a) => sample::execute(a),
        AnalyzeCommands::Radius(a) => radius::execute(a),
        AnalyzeCommands::Ensemble(a) => ensemble::execute(a),
        AnalyzeCommands::Dos(a) => dos::execute(a),
        AnalyzeCommands::Xrd(a) => xrd::execute(a),
        AnalyzeCommands::FreqLookup(a) => freq_lookup::execute(a),
    }
}
