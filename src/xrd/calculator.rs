//! # XRD 衍射峰计算器
//!
//! 由 `gulp.res` 给出的晶胞与分数坐标计算粉末衍射图样。
//!
//! ## 算法概述
//! 1. 计算倒格矢
//! 2. 遍历限制球内的 (hkl) 点
//! 3. 计算 Bragg 角和 d 间距
//! 4. 计算结构因子 F(hkl) = Σ f_j exp(2πi (h x_j + k y_j + l z_j))
//! 5. 应用 Lorentz 极化校正
//! 6. 在公共 2θ 网格上做 Gaussian 展宽，便于多个结构逐点加权
//!
//! ## 依赖关系
//! - 被 `commands/analyze/xrd.rs` 调用
//! - 使用 `models/structure.rs` 的 Crystal, Lattice
//! - 使用 `xrd/scattering.rs` 获取原子散射因子

use crate::error::{GulpkitError, Result};
use crate::models::{Crystal, Lattice};
use crate::xrd::scattering;

use std::f64::consts::PI;

/// 默认 X 射线波长 (Å)
pub const DEFAULT_WAVELENGTH: f64 = 1.5498;

/// 衍射峰
#[derive(Debug, Clone)]
pub struct Peak {
    /// 衍射角 2θ（度）
    pub two_theta: f64,
    /// d 间距（Å）
    pub d_spacing: f64,
    /// 相对强度（0-100）
    pub intensity: f64,
    /// Miller 指数
    pub hkl: [i32; 3],
}

/// XRD 衍射图谱
#[derive(Debug, Clone)]
pub struct XrdPattern {
    /// 衍射峰列表（按 2θ 升序）
    pub peaks: Vec<Peak>,
    /// 使用的波长（Å）
    pub wavelength: f64,
    /// 结构名称
    pub structure_name: String,
}

impl XrdPattern {
    /// 在等间距网格上做 Gaussian 展宽（FWHM 单位为度），返回每个网格点的强度
    pub fn profile(&self, grid: &[f64], fwhm: f64) -> Vec<f64> {
        let sigma = fwhm / (2.0 * (2.0 * 2f64.ln()).sqrt());
        let mut out = vec![0.0; grid.len()];
        if grid.len() < 2 || sigma <= 0.0 {
            return out;
        }
        let start = grid[0];
        let step = grid[1] - grid[0];
        let reach = 5.0 * sigma;

        for peak in &self.peaks {
            let lo = ((peak.two_theta - reach - start) / step).floor().max(0.0) as usize;
            let hi = (((peak.two_theta + reach - start) / step).ceil().max(0.0) as usize)
                .min(grid.len() - 1);
            for (i, value) in out.iter_mut().enumerate().take(hi + 1).skip(lo) {
                let dx = grid[i] - peak.two_theta;
                *value += peak.intensity * (-0.5 * dx * dx / (sigma * sigma)).exp();
            }
        }
        out
    }
}

/// 等间距 2θ 网格 `[start, end]`
pub fn two_theta_grid(start: f64, end: f64, step: f64) -> Vec<f64> {
    if step <= 0.0 || end < start {
        return Vec::new();
    }
    let n = ((end - start) / step).round() as usize;
    (0..=n).map(|i| start + i as f64 * step).collect()
}

/// XRD 计算器
pub struct XrdCalculator {
    /// X 射线波长（Å）
    wavelength: f64,
}

impl XrdCalculator {
    pub fn new(wavelength: f64) -> Self {
        Self { wavelength }
    }

    /// 计算 [two_theta_min, two_theta_max] 内的衍射峰
    pub fn calculate(
        &self,
        crystal: &Crystal,
        two_theta_min: f64,
        two_theta_max: f64,
    ) -> Result<XrdPattern> {
        if self.wavelength <= 0.0 {
            return Err(GulpkitError::InvalidArgument(format!(
                "wavelength must be positive, got {}",
                self.wavelength
            )));
        }

        let recip = reciprocal_lattice(&crystal.lattice).ok_or_else(|| {
            GulpkitError::Other(format!("{}: degenerate lattice", crystal.name))
        })?;

        // 2θ_max 对应 |G| = 2 sin(θ_max) / λ（不含 2π）
        let theta_max = (two_theta_max.min(180.0) / 2.0).to_radians();
        let g_max = 2.0 * theta_max.sin() / self.wavelength;
        let (a, b, c, ..) = crystal.lattice.parameters();
        let max_hkl = ((g_max * a.max(b).max(c)) as i32 + 1).min(30);

        let mut peaks = Vec::new();
        for h in -max_hkl..=max_hkl {
            for k in -max_hkl..=max_hkl {
                for l in -max_hkl..=max_hkl {
                    if h == 0 && k == 0 && l == 0 {
                        continue;
                    }
                    let g = reciprocal_vector(&recip, h, k, l);
                    let g_mag = (g[0] * g[0] + g[1] * g[1] + g[2] * g[2]).sqrt();
                    if g_mag < 1e-10 || g_mag > g_max + 1e-12 {
                        continue;
                    }

                    let d = 1.0 / g_mag;
                    let sin_theta = self.wavelength / (2.0 * d);
                    if sin_theta > 1.0 {
                        continue;
                    }
                    let theta = sin_theta.asin();
                    let two_theta = 2.0 * theta.to_degrees();
                    if two_theta < two_theta_min || two_theta > two_theta_max {
                        continue;
                    }

                    let (re, im) = structure_factor(crystal, [h, k, l], sin_theta / self.wavelength);
                    let f_sq = re * re + im * im;
                    if f_sq < 1e-10 {
                        continue;
                    }

                    peaks.push(Peak {
                        two_theta,
                        d_spacing: d,
                        intensity: f_sq * lorentz_polarization(theta),
                        hkl: [h, k, l],
                    });
                }
            }
        }

        let mut peaks = merge_equivalent_peaks(peaks, 0.01);

        let max_i = peaks.iter().map(|p| p.intensity).fold(0.0, f64::max);
        if max_i > 0.0 {
            for p in &mut peaks {
                p.intensity = 100.0 * p.intensity / max_i;
            }
        }

        Ok(XrdPattern {
            peaks,
            wavelength: self.wavelength,
            structure_name: crystal.name.clone(),
        })
    }
}

/// 倒格矢矩阵（行向量，不含 2π 因子）
fn reciprocal_lattice(lattice: &Lattice) -> Option<[[f64; 3]; 3]> {
    let [a, b, c] = lattice.matrix;
    let volume = lattice.volume();
    if volume.abs() < 1e-10 {
        return None;
    }
    let scale = |v: [f64; 3]| [v[0] / volume, v[1] / volume, v[2] / volume];
    Some([
        scale(crate::models::structure::cross(&b, &c)),
        scale(crate::models::structure::cross(&c, &a)),
        scale(crate::models::structure::cross(&a, &b)),
    ])
}

fn reciprocal_vector(recip: &[[f64; 3]; 3], h: i32, k: i32, l: i32) -> [f64; 3] {
    let (hf, kf, lf) = (h as f64, k as f64, l as f64);
    [
        hf * recip[0][0] + kf * recip[1][0] + lf * recip[2][0],
        hf * recip[0][1] + kf * recip[1][1] + lf * recip[2][1],
        hf * recip[0][2] + kf * recip[1][2] + lf * recip[2][2],
    ]
}

/// 结构因子 (实部, 虚部)；`s = sin(θ)/λ`
fn structure_factor(crystal: &Crystal, hkl: [i32; 3], s: f64) -> (f64, f64) {
    crystal.atoms.iter().fold((0.0, 0.0), |(re, im), atom| {
        let f = scattering::calculate_scattering_factor(&atom.element, s);
        let phase = 2.0
            * PI
            * (hkl[0] as f64 * atom.position[0]
                + hkl[1] as f64 * atom.position[1]
                + hkl[2] as f64 * atom.position[2]);
        (re + f * phase.cos(), im + f * phase.sin())
    })
}

/// Lorentz 极化校正
fn lorentz_polarization(theta: f64) -> f64 {
    let (sin_t, cos_t) = theta.sin_cos();
    if sin_t.abs() < 1e-10 || cos_t.abs() < 1e-10 {
        return 0.0;
    }
    let cos_2t = (2.0 * theta).cos();
    (1.0 + cos_2t * cos_2t) / (sin_t * sin_t * cos_t)
}

/// 合并 2θ 相差小于 `tolerance` 的峰，强度累加
fn merge_equivalent_peaks(mut peaks: Vec<Peak>, tolerance: f64) -> Vec<Peak> {
    peaks.sort_by(|a, b| a.two_theta.total_cmp(&b.two_theta));
    let mut merged: Vec<Peak> = Vec::new();
    for peak in peaks {
        match merged.last_mut() {
            Some(last) if (peak.two_theta - last.two_theta).abs() < tolerance => {
                last.intensity += peak.intensity;
            }
            _ => merged.push(peak),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Atom;

    fn fluorite(a: f64) -> Crystal {
        let lattice = Lattice::from_parameters(a, a, a, 90.0, 90.0, 90.0);
        let mut atoms = Vec::new();
        for f in [[0.0, 0.0, 0.0], [0.5, 0.5, 0.0], [0.5, 0.0, 0.5], [0.0, 0.5, 0.5]] {
            atoms.push(Atom::new("Ce", f));
        }
        for x in [0.25, 0.75] {
            for y in [0.25, 0.75] {
                for z in [0.25, 0.75] {
                    atoms.push(Atom::new("O", [x, y, z]));
                }
            }
        }
        Crystal::new("CeO2", lattice, atoms)
    }

    #[test]
    fn test_ceria_strongest_peak_is_111() {
        let a = 5.411;
        let pattern = XrdCalculator::new(DEFAULT_WAVELENGTH)
            .calculate(&fluorite(a), 0.0, 120.0)
            .unwrap();
        assert!(!pattern.peaks.is_empty());

        let strongest = pattern
            .peaks
            .iter()
            .max_by(|x, y| x.intensity.total_cmp(&y.intensity))
            .unwrap();
        let d111 = a / 3f64.sqrt();
        let expected = 2.0 * (DEFAULT_WAVELENGTH / (2.0 * d111)).asin().to_degrees();
        assert!((strongest.two_theta - expected).abs() < 0.05);
        assert!((strongest.intensity - 100.0).abs() < 1e-9);

        // fcc 消光：(100) 不出现
        let d100 = a;
        let t100 = 2.0 * (DEFAULT_WAVELENGTH / (2.0 * d100)).asin().to_degrees();
        assert!(pattern
            .peaks
            .iter()
            .all(|p| (p.two_theta - t100).abs() > 0.05));
    }

    #[test]
    fn test_profile_is_broadened() {
        let pattern = XrdPattern {
            peaks: vec![Peak {
                two_theta: 30.0,
                d_spacing: 3.0,
                intensity: 100.0,
                hkl: [1, 1, 1],
            }],
            wavelength: DEFAULT_WAVELENGTH,
            structure_name: "test".into(),
        };
        let grid = two_theta_grid(0.0, 120.0, 0.02);
        assert_eq!(grid.len(), 6001);
        let y = pattern.profile(&grid, 0.1);
        assert!((y[1500] - 100.0).abs() < 1e-6);
        assert!(y[1500 + 10] < 1.0);
        assert_eq!(y[0], 0.0);
    }

    #[test]
    fn test_invalid_wavelength() {
        assert!(XrdCalculator::new(0.0)
            .calculate(&fluorite(5.4), 0.0, 120.0)
            .is_err());
    }
}
