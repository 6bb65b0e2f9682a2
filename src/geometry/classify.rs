//! # 距离分类
//!
//! 空位-掺杂、空位-空位、掺杂-掺杂最近距离的壳层标签，以及按配位数的
//! 体相/表面划分。

/// 空位到掺杂离子的距离：`<3` 为 2N，`3..=5` 为 3N，其余为 fN
pub fn vacancy_dopant_label(d: f64) -> &'static str {
    if d < 3.0 {
        "2N"
    } else if d <= 5.0 {
        "3N"
    } else {
        "fN"
    }
}

/// 最近空位-空位距离对应的方向壳层
pub fn vacancy_pair_label(d: f64) -> &'static str {
    if d < 3.3 {
        "VO_100"
    } else if d < 4.2 {
        "VO_110"
    } else if d < 5.1 {
        "VO_111"
    } else {
        "VO_far"
    }
}

/// 最近掺杂-掺杂距离：`<4.6` 第一近邻，`<6` 第二近邻
pub fn dopant_pair_label(dopant: &str, d: f64) -> String {
    let shell = if d < 4.6 {
        "1N"
    } else if d < 6.0 {
        "2N"
    } else {
        "far"
    };
    format!("{}_{}", dopant, shell)
}

/// 配位数低于体相值即为表面
pub fn surface_or_bulk(cn: usize, bulk_cn: usize) -> &'static str {
    if cn < bulk_cn {
        "surface"
    } else {
        "bulk"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vacancy_dopant_boundaries() {
        assert_eq!(vacancy_dopant_label(2.99), "2N");
        assert_eq!(vacancy_dopant_label(3.0), "3N");
        assert_eq!(vacancy_dopant_label(5.0), "3N");
        assert_eq!(vacancy_dopant_label(5.01), "fN");
        assert_eq!(vacancy_dopant_label(f64::INFINITY), "fN");
    }

    #[test]
    fn test_vacancy_pair_boundaries() {
        assert_eq!(vacancy_pair_label(2.7), "VO_100");
        assert_eq!(vacancy_pair_label(3.3), "VO_110");
        assert_eq!(vacancy_pair_label(4.2), "VO_111");
        assert_eq!(vacancy_pair_label(5.1), "VO_far");
    }

    #[test]
    fn test_dopant_pair_label() {
        assert_eq!(dopant_pair_label("La", 3.9), "La_1N");
        assert_eq!(dopant_pair_label("La", 5.5), "La_2N");
        assert_eq!(dopant_pair_label("Gd", 6.0), "Gd_far");
    }

    #[test]
    fn test_surface_or_bulk() {
        assert_eq!(surface_or_bulk(7, 8), "surface");
        assert_eq!(surface_or_bulk(8, 8), "bulk");
    }
}
