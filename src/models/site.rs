//! # 位点记录数据模型
//!
//! 位点表（`VO.txt`, `O.txt`, `La.txt`, `Ce.txt` 等）中的一行：
//! `元素 X Y Z D CN 类型 [附加列...]`。
//!
//! ## 依赖关系
//! - 被 `parsers/site_table.rs` 读写
//! - 被 `commands/sites/`, `commands/collect/`, `commands/analyze/` 使用

use std::fmt;

/// 位点所处区域
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SiteKind {
    Bulk,
    Surface,
    Other(String),
}

impl SiteKind {
    pub fn parse(s: &str) -> Self {
        match s {
            "bulk" => SiteKind::Bulk,
            "surface" => SiteKind::Surface,
            other => SiteKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for SiteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteKind::Bulk => write!(f, "bulk"),
            SiteKind::Surface => write!(f, "surface"),
            SiteKind::Other(s) => write!(f, "{}", s),
        }
    }
}

/// 位点表中的一行
#[derive(Debug, Clone, PartialEq)]
pub struct SiteRecord {
    /// 元素符号
    pub element: String,
    /// 笛卡尔坐标 (Å)
    pub position: [f64; 3],
    /// 到参考点（纳米颗粒中心）的距离 (Å)
    pub distance: f64,
    /// 配位标签
    pub cn: String,
    /// bulk / surface
    pub kind: SiteKind,
    /// 分类步骤追加的列（d1, d2, N1, ...），原样保留
    pub extra: Vec<String>,
}

impl SiteRecord {
    pub fn new(element: impl Into<String>, position: [f64; 3], cn: impl Into<String>) -> Self {
        SiteRecord {
            element: element.into(),
            position,
            distance: 0.0,
            cn: cn.into(),
            kind: SiteKind::Other(String::new()),
            extra: Vec::new(),
        }
    }

    pub fn with_kind(mut self, kind: SiteKind) -> Self {
        self.kind = kind;
        self
    }

    /// 以参考点重新计算距离
    pub fn update_distance(&mut self, center: &[f64; 3]) {
        self.distance = crate::geometry::distance(&self.position, center);
    }

    pub fn is_bulk(&self) -> bool {
        self.kind == SiteKind::Bulk
    }

    pub fn is_surface(&self) -> bool {
        self.kind == SiteKind::Surface
    }

    /// 附加列（0 起始）解析为浮点数
    pub fn extra_f64(&self, index: usize) -> Option<f64> {
        self.extra.get(index).and_then(|s| s.parse().ok())
    }

    pub fn extra_str(&self, index: usize) -> Option<&str> {
        self.extra.get(index).map(String::as_str)
    }
}
