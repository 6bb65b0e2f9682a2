//! # 原子散射因子
//!
//! f(s) = Σᵢ aᵢ exp(-bᵢ s²) + c，s = sin(θ)/λ。
//!
//! 参数取自 International Tables for Crystallography, Vol. C, Table 6.1.1.4，
//! 只收录氧化物缺陷体系中常见的元素（主体阳离子、稀土掺杂与碱土/过渡金属）。
//!
//! ## 依赖关系
//! - 被 `xrd/calculator.rs` 调用
//! - 纯静态数据，无外部依赖

/// 原子散射因子参数
#[derive(Debug, Clone, Copy)]
pub struct ScatteringFactorParams {
    pub a: [f64; 4],
    pub b: [f64; 4],
    pub c: f64,
}

impl ScatteringFactorParams {
    /// 计算散射因子 f(s)
    pub fn calculate(&self, s: f64) -> f64 {
        let s2 = s * s;
        self.a
            .iter()
            .zip(&self.b)
            .fold(self.c, |f, (a, b)| f + a * (-b * s2).exp())
    }
}

const fn p(a: [f64; 4], b: [f64; 4], c: f64) -> ScatteringFactorParams {
    ScatteringFactorParams { a, b, c }
}

static TABLE: &[(&str, ScatteringFactorParams)] = &[
    ("Li", p([1.1282, 0.7508, 0.6175, 0.4653], [3.9546, 1.0524, 85.3905, 168.261], 0.0377)),
    ("O", p([3.0485, 2.2868, 1.5463, 0.8670], [13.2771, 5.7011, 0.3239, 32.9089], 0.2508)),
    ("F", p([3.5392, 2.6412, 1.5170, 1.0243], [10.2825, 4.2944, 0.2615, 26.1476], 0.2776)),
    ("Na", p([4.7626, 3.1736, 1.2674, 1.1128], [3.2850, 8.8422, 0.3136, 129.424], 0.6760)),
    ("Mg", p([5.4204, 2.1735, 1.2269, 2.3073], [2.8275, 79.2611, 0.3808, 7.1937], 0.8584)),
    ("Al", p([6.4202, 1.9002, 1.5936, 1.9646], [3.0387, 0.7426, 31.5472, 85.0886], 1.1151)),
    ("Ca", p([8.6266, 7.3873, 1.5899, 1.0211], [10.4421, 0.6599, 85.7484, 178.437], 1.3751)),
    ("Sc", p([9.1890, 7.3679, 1.6409, 1.4680], [9.0213, 0.5729, 136.108, 51.3531], 1.3329)),
    ("Ti", p([9.7595, 7.3558, 1.6991, 1.9021], [7.8508, 0.5000, 35.6338, 116.105], 1.2807)),
    ("Mn", p([11.2819, 7.3573, 3.0193, 2.2441], [5.3409, 0.3432, 17.8674, 83.7543], 1.0896)),
    ("Fe", p([11.7695, 7.3573, 3.5222, 2.3045], [4.7611, 0.3072, 15.3535, 76.8805], 1.0369)),
    ("Co", p([12.2841, 7.3409, 4.0034, 2.3488], [4.2791, 0.2784, 13.5359, 71.1692], 1.0118)),
    ("Ni", p([12.8376, 7.2920, 4.4438, 2.3800], [3.8785, 0.2565, 12.1763, 66.3421], 1.0341)),
    ("Sr", p([17.5663, 9.8184, 5.4220, 2.6694], [1.5564, 14.0988, 0.1664, 132.376], 2.5064)),
    ("Y", p([17.7760, 10.2946, 5.7263, 3.2656], [1.4029, 12.8006, 0.1255, 104.354], 1.9341)),
    ("Zr", p([17.8765, 10.9480, 5.4173, 3.6577], [1.2761, 11.9160, 0.1176, 87.6627], 2.0690)),
    ("Ba", p([20.3361, 19.2970, 10.8880, 2.6959], [3.2160, 0.2756, 20.2073, 167.202], 2.7731)),
    ("La", p([20.5780, 19.5990, 11.3727, 3.2879], [2.9480, 0.2440, 18.7726, 133.124], 2.1461)),
    ("Ce", p([21.1671, 19.7695, 11.8513, 3.3303], [2.8129, 0.2268, 17.6083, 127.113], 1.8623)),
    ("Pr", p([21.3727, 19.7491, 12.1329, 0.97518], [2.6452, 0.214299, 15.323, 36.4065], 1.77132)),
    ("Nd", p([22.6845, 19.6847, 12.774, 2.85137], [2.66248, 0.210628, 15.885, 137.903], 1.98486)),
    ("Sm", p([24.0042, 19.4258, 13.4396, 2.89604], [2.47274, 0.196451, 14.3996, 128.007], 2.20963)),
    ("Gd", p([25.0709, 19.0798, 13.8518, 3.54545], [2.25341, 0.181951, 12.9331, 101.398], 2.4196)),
];

/// 获取元素的散射因子参数
///
/// GULP 物种名可能带编号或后缀（如 `O2`、`Ce_s`），只取开头的字母部分。
pub fn get_scattering_factor(species: &str) -> Option<&'static ScatteringFactorParams> {
    let symbol: String = species
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .take(2)
        .collect();
    TABLE
        .iter()
        .find(|(el, _)| el.eq_ignore_ascii_case(&symbol))
        .or_else(|| {
            let first: String = symbol.chars().take(1).collect();
            TABLE.iter().find(|(el, _)| el.eq_ignore_ascii_case(&first))
        })
        .map(|(_, params)| params)
}

/// 计算散射因子；未收录的元素返回 0
pub fn calculate_scattering_factor(species: &str, s: f64) -> f64 {
    get_scattering_factor(species)
        .map(|params| params.calculate(s))
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f0_close_to_atomic_number() {
        for (el, z) in [("O", 8.0), ("Ce", 58.0), ("La", 57.0), ("Gd", 64.0)] {
            let f0 = get_scattering_factor(el).unwrap().calculate(0.0);
            assert!((f0 - z).abs() < 1.0, "{} f(0) = {}", el, f0);
        }
    }

    #[test]
    fn test_species_labels() {
        assert!(get_scattering_factor("O2").is_some());
        assert!(get_scattering_factor("Ce_core").is_some());
        assert!(get_scattering_factor("Xx").is_none());
        assert_eq!(calculate_scattering_factor("Xx", 0.1), 0.0);
        // 散射因子随 s 单调下降
        assert!(calculate_scattering_factor("Ce", 0.5) < calculate_scattering_factor("Ce", 0.1));
    }
}
