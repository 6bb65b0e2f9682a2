//! # gulpkit - GULP 缺陷计算批处理工具箱
//!
//! 把蒙特卡洛 / Mott-Littleton / 纳米颗粒计算流程中分散的后处理脚本
//! 统一成单一可执行文件。
//!
//! ## 子命令
//! - `collect` - 汇总 GULP 结果（bulk / nanoparticle / defect / freq）
//! - `check`   - 检查任务状态（restart / errors / freq / displacement / empty）
//! - `prepare` - 生成与修改输入文件
//! - `sites`   - 空位与位点表维护
//! - `analyze` - 统计、系综热力学与绘图
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── batch/     (任务目录收集与并行执行)
//!   │     ├── parsers/   (GULP 与表格解析器)
//!   │     ├── geometry/  (近邻、分类与位置优化)
//!   │     ├── thermo/    (系综热力学)
//!   │     ├── xrd/       (衍射计算)
//!   │     └── models/    (数据模型)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod batch;
mod cli;
mod commands;
mod error;
mod geometry;
mod models;
mod parsers;
mod thermo;
mod utils;
mod xrd;

use clap::Parser;
use cli::Cli;

fn main() {
    // Windows 终端启用 ANSI 颜色
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
