//! # 盒约束优化
//!
//! 对三维位置做投影梯度上升：中心差分求梯度，回溯线搜索，每一步都
//! 投影回盒子内。目标函数不光滑（含最近邻排序），因此只保证返回值不劣于
//! 起点。

/// 盒约束最大化器
#[derive(Debug, Clone)]
pub struct BoxMaximizer {
    /// 有限差分步长
    pub eps: f64,
    /// 最大迭代次数
    pub max_iter: usize,
    /// 目标函数增量收敛阈值
    pub tol: f64,
    /// 初始步长
    pub initial_step: f64,
}

impl Default for BoxMaximizer {
    fn default() -> Self {
        Self {
            eps: 1e-3,
            max_iter: 200,
            tol: 1e-9,
            initial_step: 0.1,
        }
    }
}

impl BoxMaximizer {
    /// 在 `[lower, upper]` 内从 `start` 出发最大化 `f`，返回 (位置, 目标值)
    pub fn maximize<F>(
        &self,
        f: F,
        start: [f64; 3],
        lower: [f64; 3],
        upper: [f64; 3],
    ) -> ([f64; 3], f64)
    where
        F: Fn(&[f64; 3]) -> f64,
    {
        let mut x = project(start, &lower, &upper);
        let mut fx = f(&x);
        if !fx.is_finite() {
            return (start, f(&start));
        }

        let mut step = self.initial_step;
        for _ in 0..self.max_iter {
            let g = self.gradient(&f, &x, &lower, &upper);
            let gnorm = (g[0] * g[0] + g[1] * g[1] + g[2] * g[2]).sqrt();
            if gnorm < 1e-12 {
                break;
            }

            // 回溯线搜索
            let mut improved = false;
            let mut trial_step = step;
            while trial_step > 1e-8 {
                let candidate = project(
                    [
                        x[0] + trial_step * g[0] / gnorm,
                        x[1] + trial_step * g[1] / gnorm,
                        x[2] + trial_step * g[2] / gnorm,
                    ],
                    &lower,
                    &upper,
                );
                let fc = f(&candidate);
                if fc.is_finite() && fc > fx {
                    let gain = fc - fx;
                    x = candidate;
                    fx = fc;
                    improved = gain > self.tol;
                    break;
                }
                trial_step *= 0.5;
            }

            if !improved {
                break;
            }
            step = (trial_step * 2.0).min(self.initial_step * 4.0);
        }

        (x, fx)
    }

    /// 中心差分梯度；靠近边界时退化为单侧差分
    fn gradient<F>(&self, f: &F, x: &[f64; 3], lower: &[f64; 3], upper: &[f64; 3]) -> [f64; 3]
    where
        F: Fn(&[f64; 3]) -> f64,
    {
        let mut g = [0.0; 3];
        for i in 0..3 {
            let mut hi = *x;
            let mut lo = *x;
            hi[i] = (x[i] + self.eps).min(upper[i]);
            lo[i] = (x[i] - self.eps).max(lower[i]);
            let h = hi[i] - lo[i];
            if h > 0.0 {
                let d = (f(&hi) - f(&lo)) / h;
                g[i] = if d.is_finite() { d } else { 0.0 };
            }
        }
        g
    }
}

fn project(p: [f64; 3], lower: &[f64; 3], upper: &[f64; 3]) -> [f64; 3] {
    [
        p[0].clamp(lower[0], upper[0]),
        p[1].clamp(lower[1], upper[1]),
        p[2].clamp(lower[2], upper[2]),
    ]
}

/// 以 `center` 为中心、半宽 `half_width` 的盒子
pub fn box_around(center: &[f64; 3], half_width: f64) -> ([f64; 3], [f64; 3]) {
    (
        [
            center[0] - half_width,
            center[1] - half_width,
            center[2] - half_width,
        ],
        [
            center[0] + half_width,
            center[1] + half_width,
            center[2] + half_width,
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_interior_maximum() {
        let target = [0.3, -0.2, 0.1];
        let f = |p: &[f64; 3]| {
            -((p[0] - target[0]).powi(2) + (p[1] - target[1]).powi(2) + (p[2] - target[2]).powi(2))
        };
        let (lo, hi) = box_around(&[0.0; 3], 1.0);
        let (x, fx) = BoxMaximizer::default().maximize(f, [0.0; 3], lo, hi);
        for i in 0..3 {
            assert!((x[i] - target[i]).abs() < 1e-2, "{:?}", x);
        }
        assert!(fx > -1e-3);
    }

    #[test]
    fn test_stays_inside_box() {
        // 单调递增，最优点在盒子角上
        let f = |p: &[f64; 3]| p[0] + p[1] + p[2];
        let (lo, hi) = box_around(&[5.0, 5.0, 5.0], 1.0);
        let (x, _) = BoxMaximizer::default().maximize(f, [5.0; 3], lo, hi);
        for v in x {
            assert!(v <= 6.0 + 1e-12);
            assert!(v > 5.9);
        }
    }

    #[test]
    fn test_never_worse_than_start() {
        let f = |p: &[f64; 3]| (10.0 * p[0]).sin() + (7.0 * p[1]).cos();
        let start = [0.2, 0.4, 0.0];
        let (lo, hi) = box_around(&start, 1.0);
        let (_, fx) = BoxMaximizer::default().maximize(f, start, lo, hi);
        assert!(fx >= f(&start));
    }
}
