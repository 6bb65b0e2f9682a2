//! # 解析器模块
//!
//! 提供 GULP 输入/输出/重启文件以及位点表、XYZ、CSV 汇总表的解析器。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: gout, gin, restart, site_table, xyz, table

pub mod gin;
pub mod gout;
pub mod restart;
pub mod site_table;
pub mod table;
pub mod xyz;
