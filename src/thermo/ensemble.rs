//! # 正则 / 巨正则系综
//!
//! 所有配分函数都以 `ln Z` 的形式保存，求和统一走 log-sum-exp，
//! 几百 eV 的总能也不会溢出。
//!
//! ## 功能
//! - 反应能重标定 `E' = (E - E_host + s (ionisation + reduction + correction)) / n`
//! - 正则配分函数 `ln Z_s`（可选零点能因子）与自由能 `G_s = -kT ln Z_s`
//! - 巨正则权重 `w_x(u)`、平均浓度 `<x>(u)`、反演 `u(<x>)`、巨势 `Ω(u)`
//!
//! ## 依赖关系
//! - 被 `commands/analyze/ensemble.rs` 使用
//! - `boltzmann_weights` 被 `commands/collect/bulk.rs` 与 `commands/analyze/xrd.rs` 使用

use crate::error::{GulpkitError, Result};

/// Boltzmann 常数 (eV/K)
pub const KB_EV: f64 = 8.617333262e-5;

/// 波数 (cm⁻¹) 到 eV
pub const WAVENUMBER_TO_EV: f64 = 1.239841984332e-4;

/// 化学势扫描步长 (eV)
pub const U_STEP: f64 = 0.0025;

/// 化学势网格下界 `-3000 × U_STEP`
pub const U_LOWER_BINS: i64 = 3000;

/// 化学势网格上界 `2000 × U_STEP`
pub const U_UPPER_BINS: i64 = 2000;

/// 可反演的浓度范围
pub const X_MIN: f64 = 0.0001;
pub const X_MAX: f64 = 1.0;

/// `ln Σ exp(v)`；空输入为 -inf
pub fn log_sum_exp(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    let sum: f64 = values.iter().map(|v| (v - max).exp()).sum();
    max + sum.ln()
}

/// 归一化的 Boltzmann 权重，以最低能量为参考
pub fn boltzmann_weights(energies: &[f64], temperature: f64) -> Vec<f64> {
    if energies.is_empty() {
        return Vec::new();
    }
    let kt = KB_EV * temperature;
    let exponents: Vec<f64> = energies.iter().map(|e| -e / kt).collect();
    let ln_z = log_sum_exp(&exponents);
    exponents.iter().map(|a| (a - ln_z).exp()).collect()
}

/// 反应能重标定参数
#[derive(Debug, Clone, Copy)]
pub struct Recalibration {
    /// 主体晶胞能量 E_host
    pub host_energy: f64,
    /// 电离能（气相 Li → Li⁺）
    pub ionisation: f64,
    /// 还原能（Mn⁴⁺ → Mn³⁺）
    pub reduction: f64,
    /// 经验修正
    pub correction: f64,
    /// 归一化的化学式单元数 n
    pub formula_units: f64,
}

impl Recalibration {
    /// 尺寸 `size` 的结构能量 → 每化学式单元的反应能
    pub fn apply(&self, energy: f64, size: usize) -> f64 {
        let per_unit = self.ionisation + self.reduction + self.correction;
        (energy - self.host_energy + size as f64 * per_unit) / self.formula_units
    }
}

/// 零点能 `Σ ½ ν` (eV)
pub fn zero_point_energy(frequencies: &[f64]) -> f64 {
    frequencies.iter().map(|f| 0.5 * f * WAVENUMBER_TO_EV).sum()
}

/// 正则配分函数的对数 `ln Σ exp(-(E_i + ZPE_i)/kT)`
///
/// `zpe` 给出时必须与 `energies` 等长。
pub fn canonical_ln_z(energies: &[f64], zpe: Option<&[f64]>, temperature: f64) -> Result<f64> {
    let kt = KB_EV * temperature;
    let exponents: Vec<f64> = match zpe {
        Some(zpe) => {
            if zpe.len() != energies.len() {
                return Err(GulpkitError::InvalidArgument(format!(
                    "{} energies but {} zero-point energies",
                    energies.len(),
                    zpe.len()
                )));
            }
            energies
                .iter()
                .zip(zpe)
                .map(|(e, z)| -(e + z) / kt)
                .collect()
        }
        None => energies.iter().map(|e| -e / kt).collect(),
    };
    Ok(log_sum_exp(&exponents))
}

/// 自由能 `G = -kT ln Z`
pub fn free_energy(ln_z: f64, temperature: f64) -> f64 {
    -KB_EV * temperature * ln_z
}

/// 巨正则系综：各浓度 x 及其正则 `ln Z_x`
#[derive(Debug, Clone)]
pub struct GrandCanonical {
    xs: Vec<f64>,
    ln_z: Vec<f64>,
    kt: f64,
}

impl GrandCanonical {
    pub fn new(xs: Vec<f64>, ln_z: Vec<f64>, temperature: f64) -> Result<Self> {
        if xs.is_empty() || xs.len() != ln_z.len() {
            return Err(GulpkitError::InvalidArgument(format!(
                "ensemble needs matching concentrations and partition functions ({} vs {})",
                xs.len(),
                ln_z.len()
            )));
        }
        if temperature <= 0.0 {
            return Err(GulpkitError::InvalidArgument(format!(
                "temperature must be positive, got {}",
                temperature
            )));
        }
        Ok(Self {
            xs,
            ln_z,
            kt: KB_EV * temperature,
        })
    }

    fn exponents(&self, u: f64) -> Vec<f64> {
        self.xs
            .iter()
            .zip(&self.ln_z)
            .map(|(x, lz)| x * u / self.kt + lz)
            .collect()
    }

    /// `w_x(u) = Z_x e^{xu/kT} / Σ_x' Z_x' e^{x'u/kT}`
    pub fn weights(&self, u: f64) -> Vec<f64> {
        let a = self.exponents(u);
        let norm = log_sum_exp(&a);
        a.iter().map(|v| (v - norm).exp()).collect()
    }

    /// `<x>(u)`
    pub fn mean_x(&self, u: f64) -> f64 {
        self.weights(u)
            .iter()
            .zip(&self.xs)
            .map(|(w, x)| w * x)
            .sum()
    }

    /// 巨势 `Ω(u) = -kT ln Σ_x e^{xu/kT} Z_x`
    pub fn grand_potential(&self, u: f64) -> f64 {
        -self.kt * log_sum_exp(&self.exponents(u))
    }

    /// 在网格上扫描 `<x>(u)`
    pub fn scan(&self, grid: Vec<f64>) -> PotentialScan {
        let mean_x = grid.iter().map(|&u| self.mean_x(u)).collect();
        PotentialScan { u: grid, mean_x }
    }
}

/// 默认化学势网格 `u = i · 0.0025, i ∈ [-3000, 2000]`
pub fn chemical_potential_grid() -> Vec<f64> {
    (-U_LOWER_BINS..=U_UPPER_BINS)
        .map(|i| i as f64 * U_STEP)
        .collect()
}

/// 巨势求值点 `x = i / bins, i = 1..=bins`
pub fn evaluation_points(bins: usize) -> Vec<f64> {
    (1..=bins).map(|i| i as f64 / bins as f64).collect()
}

/// `<x>(u)` 的扫描结果
#[derive(Debug, Clone)]
pub struct PotentialScan {
    pub u: Vec<f64>,
    pub mean_x: Vec<f64>,
}

impl PotentialScan {
    /// 反演 `u(<x>)`：取 `<x>` 最接近的网格点（并列取第一个）
    pub fn u_by_x(&self, x: f64) -> Result<f64> {
        if !(X_MIN..=X_MAX).contains(&x) {
            return Err(GulpkitError::OutOfRange {
                x,
                min: X_MIN,
                max: X_MAX,
            });
        }
        self.mean_x
            .iter()
            .enumerate()
            .min_by(|a, b| (a.1 - x).abs().total_cmp(&(b.1 - x).abs()))
            .map(|(i, _)| self.u[i])
            .ok_or_else(|| GulpkitError::Other("empty chemical potential scan".into()))
    }
}
