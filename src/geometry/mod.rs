//! # 几何工具模块
//!
//! 点集距离、近邻查询、配位分类以及有界优化。
//!
//! ## 子模块
//! - `neighbors`: 距离与近邻
//! - `classify`: 基于距离阈值的分类标签
//! - `optimize`: 盒约束下的投影梯度上升
//!
//! ## 依赖关系
//! - 被 `commands/sites/` 使用
//! - 被 `models/site.rs` 用于计算距离

pub mod classify;
pub mod neighbors;
pub mod optimize;

pub use neighbors::{count_within, distance, k_nearest, nearest_distance, PointSet};
