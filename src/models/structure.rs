//! # 晶体结构数据模型
//!
//! 由 `gulp.res` 的晶胞与核坐标构成的晶体结构，供 XRD 计算使用。
//!
//! ## 依赖关系
//! - 被 `parsers/restart.rs` 和 `xrd/` 使用
//! - 无外部模块依赖

/// 晶格参数表示
#[derive(Debug, Clone)]
pub struct Lattice {
    /// 晶格向量矩阵 (3x3)，行向量表示 a, b, c
    pub matrix: [[f64; 3]; 3],
}

impl Lattice {
    /// 从晶格参数 (a, b, c, alpha, beta, gamma) 创建晶格，角度单位：度
    pub fn from_parameters(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Self {
        let (cos_alpha, cos_beta) = (alpha.to_radians().cos(), beta.to_radians().cos());
        let (sin_gamma, cos_gamma) = gamma.to_radians().sin_cos();

        let c1 = c * cos_beta;
        let c2 = c * (cos_alpha - cos_beta * cos_gamma) / sin_gamma;
        let c3 = (c * c - c1 * c1 - c2 * c2).max(0.0).sqrt();

        Lattice {
            matrix: [
                [a, 0.0, 0.0],
                [b * cos_gamma, b * sin_gamma, 0.0],
                [c1, c2, c3],
            ],
        }
    }

    /// 获取晶格参数 (a, b, c, alpha, beta, gamma)
    pub fn parameters(&self) -> (f64, f64, f64, f64, f64, f64) {
        let [av, bv, cv] = self.matrix;
        let (a, b, c) = (norm(&av), norm(&bv), norm(&cv));

        let alpha = (dot(&bv, &cv) / (b * c)).acos().to_degrees();
        let beta = (dot(&av, &cv) / (a * c)).acos().to_degrees();
        let gamma = (dot(&av, &bv) / (a * b)).acos().to_degrees();

        (a, b, c, alpha, beta, gamma)
    }

    /// 计算晶格体积（行列式，可能为负）
    pub fn volume(&self) -> f64 {
        let [a, b, c] = self.matrix;
        a[0] * (b[1] * c[2] - b[2] * c[1]) - a[1] * (b[0] * c[2] - b[2] * c[0])
            + a[2] * (b[0] * c[1] - b[1] * c[0])
    }

    /// 笛卡尔坐标转分数坐标；晶格退化时返回 None
    pub fn cart_to_frac(&self, cart: &[f64; 3]) -> Option<[f64; 3]> {
        let vol = self.volume();
        if vol.abs() < 1e-12 {
            return None;
        }
        let [a, b, c] = self.matrix;
        // 逆矩阵的列 = (b×c, c×a, a×b) / V
        let bc = cross(&b, &c);
        let ca = cross(&c, &a);
        let ab = cross(&a, &b);
        Some([
            dot(cart, &bc) / vol,
            dot(cart, &ca) / vol,
            dot(cart, &ab) / vol,
        ])
    }
}

/// 原子信息
#[derive(Debug, Clone)]
pub struct Atom {
    /// 元素符号（GULP 物种名，如 "Ce", "O"）
    pub element: String,

    /// 分数坐标 [x, y, z]
    pub position: [f64; 3],
}

impl Atom {
    pub fn new(element: impl Into<String>, position: [f64; 3]) -> Self {
        Atom {
            element: element.into(),
            position,
        }
    }
}

/// 晶体结构
#[derive(Debug, Clone)]
pub struct Crystal {
    /// 结构名称（任务目录名）
    pub name: String,

    /// 晶格
    pub lattice: Lattice,

    /// 原子列表
    pub atoms: Vec<Atom>,

    /// 能量 (eV)
    pub energy: Option<f64>,
}

impl Crystal {
    pub fn new(name: impl Into<String>, lattice: Lattice, atoms: Vec<Atom>) -> Self {
        Crystal {
            name: name.into(),
            lattice,
            atoms,
            energy: None,
        }
    }

    /// 计算化学式
    pub fn formula(&self) -> String {
        use std::collections::BTreeMap;
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();

        for atom in &self.atoms {
            *counts.entry(atom.element.as_str()).or_insert(0) += 1;
        }

        counts
            .into_iter()
            .map(|(el, count)| match count {
                1 => el.to_string(),
                n => format!("{}{}", el, n),
            })
            .collect()
    }
}

pub(crate) fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub(crate) fn cross(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn norm(a: &[f64; 3]) -> f64 {
    dot(a, a).sqrt()
}
