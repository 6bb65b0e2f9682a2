//! # 数据模型模块
//!
//! 定义 GULP 输出摘要、位点记录和晶体结构数据模型。
//!
//! ## 依赖关系
//! - 被 `parsers/` 和 `commands/` 使用
//! - 子模块: gout, site, structure

pub mod gout;
pub mod site;
pub mod structure;

pub use gout::{DielectricTensor, ElasticMatrix, GoutSummary, Moduli, SitePotentials};
pub use site::{SiteKind, SiteRecord};
pub use structure::{Atom, Crystal, Lattice};
