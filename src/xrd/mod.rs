//! # XRD 计算模块
//!
//! 由 GULP 重启文件中的结构计算粉末衍射图样，并做多结构加权。
//!
//! ## 子模块
//! - `scattering`: 原子散射因子
//! - `calculator`: 衍射峰计算与 Gaussian 展宽
//! - `plot`: 加权图谱绘制
//! - `export`: 加权汇总与 CSV 导出
//!
//! ## 依赖关系
//! - 被 `commands/analyze/xrd.rs` 使用
//! - 使用 `models/structure.rs`

pub mod calculator;
pub mod export;
pub mod plot;
pub mod scattering;

pub use calculator::{two_theta_grid, XrdCalculator, XrdPattern, DEFAULT_WAVELENGTH};
