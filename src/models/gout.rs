//! # GULP 输出摘要数据模型
//!
//! 存储从 `*.gout` 中提取的标量与张量信息。
//!
//! ## 功能
//! - 最终能量、Gnorm（体相与缺陷计算）
//! - 晶胞参数、体积、密度
//! - 介电张量、弹性常数矩阵、模量
//! - 各物种的静电势
//! - 振动频率与最大位移
//!
//! ## 依赖关系
//! - 被 `parsers/gout.rs` 填充
//! - 被 `commands/collect/`, `commands/check.rs` 使用

use crate::utils::stats;

use std::collections::BTreeMap;

/// 3x3 介电张量，缺失的分量为 None
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DielectricTensor {
    pub rows: [[Option<f64>; 3]; 3],
}

impl DielectricTensor {
    /// 对角分量 (xx, yy, zz)
    pub fn diagonal(&self) -> [Option<f64>; 3] {
        [self.rows[0][0], self.rows[1][1], self.rows[2][2]]
    }

    /// 对角平均；缺失的分量按 0 计，除数固定为 3
    pub fn average(&self) -> f64 {
        self.diagonal().iter().flatten().sum::<f64>() / 3.0
    }
}

/// 6x6 弹性常数矩阵 (GPa)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElasticMatrix {
    pub rows: [[Option<f64>; 6]; 6],
}

impl ElasticMatrix {
    pub fn c11(&self) -> Option<f64> {
        self.rows[0][0]
    }

    pub fn c12(&self) -> Option<f64> {
        self.rows[0][1]
    }

    pub fn c44(&self) -> Option<f64> {
        self.rows[3][3]
    }
}

/// Reuss / Voigt / Hill 三种平均的模量 (GPa)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Moduli {
    pub reuss: Option<f64>,
    pub voigt: Option<f64>,
    pub hill: Option<f64>,
}

/// 按物种分组的位点静电势 (V)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SitePotentials {
    pub by_species: BTreeMap<String, Vec<f64>>,
}

impl SitePotentials {
    pub fn push(&mut self, species: &str, value: f64) {
        self.by_species
            .entry(species.to_string())
            .or_default()
            .push(value);
    }

    /// (min, max, avg)；该物种无数据时为 (0, 0, 0)
    pub fn stats(&self, species: &str) -> (f64, f64, f64) {
        self.by_species
            .get(species)
            .map(|v| stats::min_max_avg(v))
            .unwrap_or((0.0, 0.0, 0.0))
    }
}

/// 单个 GULP 输出文件的摘要
#[derive(Debug, Clone, Default)]
pub struct GoutSummary {
    /// 是否出现正常结束标志
    pub finished: bool,
    /// 输出中是否含有 ERROR
    pub has_error: bool,

    /// 最终能量 (eV)
    pub final_energy: Option<f64>,
    /// 最终 Gnorm
    pub final_gnorm: Option<f64>,
    /// Mott-Littleton 缺陷能量 (eV)
    pub defect_energy: Option<f64>,
    /// Mott-Littleton 缺陷 Gnorm
    pub defect_gnorm: Option<f64>,

    /// 最终晶胞参数 (a, b, c, alpha, beta, gamma)
    pub cell: [Option<f64>; 6],
    /// 非原胞体积 (Å³)
    pub volume: Option<f64>,
    /// 密度 (g/cm³)
    pub density: Option<f64>,

    pub static_dielectric: Option<DielectricTensor>,
    pub high_freq_dielectric: Option<DielectricTensor>,

    pub bulk_modulus: Option<Moduli>,
    pub shear_modulus: Option<Moduli>,
    /// 杨氏模量 (x, y, z)
    pub youngs_moduli: Option<[Option<f64>; 3]>,
    /// 压缩率 (GPa⁻¹)
    pub compressibility: Option<f64>,
    pub elastic: Option<ElasticMatrix>,

    /// 静电势段；输出中没有该段时为 None
    pub potentials: Option<SitePotentials>,

    /// 第一组振动频率 (cm⁻¹)
    pub frequencies: Vec<f64>,

    /// 所有 "Difference" 段中绝对值最大的位移（保留符号）
    pub max_displacement: Option<f64>,
}

impl GoutSummary {
    pub fn first_frequency(&self) -> Option<f64> {
        self.frequencies.first().copied()
    }

    /// ε₀：静态介电张量对角平均
    pub fn eps0(&self) -> Option<f64> {
        self.static_dielectric.as_ref().map(DielectricTensor::average)
    }

    /// ε∞：高频介电张量对角平均
    pub fn eps_inf(&self) -> Option<f64> {
        self.high_freq_dielectric
            .as_ref()
            .map(DielectricTensor::average)
    }

    /// 某物种的静电势统计；没有静电势段时为 None
    pub fn potential_stats(&self, species: &str) -> Option<(f64, f64, f64)> {
        self.potentials.as_ref().map(|p| p.stats(species))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dielectric_average_counts_missing_as_zero() {
        let mut t = DielectricTensor::default();
        t.rows[0][0] = Some(3.0);
        t.rows[1][1] = Some(6.0);
        assert!((t.average() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_potential_stats_for_absent_species() {
        let mut p = SitePotentials::default();
        p.push("Ce", -30.0);
        p.push("Ce", -28.0);
        assert_eq!(p.stats("La"), (0.0, 0.0, 0.0));
        let (min, max, avg) = p.stats("Ce");
        assert_eq!((min, max, avg), (-30.0, -28.0, -29.0));
    }
}
