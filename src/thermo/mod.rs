//! # 统计热力学模块
//!
//! Boltzmann 权重、正则配分函数与巨正则系综分析。
//!
//! ## 子模块
//! - `ensemble`: 对数空间的配分函数、化学势扫描与巨势
//!
//! ## 依赖关系
//! - 被 `commands/collect/bulk.rs`, `commands/analyze/ensemble.rs`,
//!   `commands/analyze/xrd.rs` 使用

pub mod ensemble;

pub use ensemble::{boltzmann_weights, GrandCanonical, KB_EV, WAVENUMBER_TO_EV};
