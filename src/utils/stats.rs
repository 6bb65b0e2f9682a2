//! # 统计工具
//!
//! 均值、百分位数（线性插值）、直方图以及最小/最大/平均值汇总。
//!
//! ## 依赖关系
//! - 被 `commands/collect/`, `commands/analyze/` 使用
//! - 无外部模块依赖

/// 算术平均；空切片返回 NaN
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// 百分位数，`q` 取 0..=100，相邻秩之间线性插值
pub fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// (min, max, avg)；空切片返回 (0, 0, 0)
pub fn min_max_avg(values: &[f64]) -> (f64, f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0, 0.0);
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (min, max, mean(values))
}

/// 等宽分箱边界 `start, start+step, ..., end`
pub fn bin_edges(start: f64, end: f64, step: f64) -> Vec<f64> {
    let n = ((end - start) / step).round() as usize;
    (0..=n).map(|i| start + i as f64 * step).collect()
}

/// 直方图计数：区间左闭右开，最后一个区间右端闭合，超出范围的值被忽略
pub fn histogram(values: &[f64], edges: &[f64]) -> Vec<usize> {
    if edges.len() < 2 {
        return Vec::new();
    }
    let mut counts = vec![0; edges.len() - 1];
    let last = edges.len() - 1;

    for &v in values {
        if v < edges[0] || v > edges[last] || v.is_nan() {
            continue;
        }
        let idx = if v == edges[last] {
            last - 1
        } else {
            edges.partition_point(|&e| e <= v) - 1
        };
        counts[idx] += 1;
    }

    counts
}

/// 两个可能为零的计数之比；分母为零时返回 0
pub fn safe_ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_interpolates() {
        let v = [4.0, 1.0, 3.0, 2.0];
        assert!((percentile(&v, 50.0) - 2.5).abs() < 1e-12);
        assert!((percentile(&v, 25.0) - 1.75).abs() < 1e-12);
        assert_eq!(percentile(&v, 100.0), 4.0);
        assert!(percentile(&[], 50.0).is_nan());
    }

    #[test]
    fn test_histogram_closes_last_bin() {
        let edges = bin_edges(0.0, 30.0, 6.0);
        assert_eq!(edges, vec![0.0, 6.0, 12.0, 18.0, 24.0, 30.0]);

        let counts = histogram(&[0.0, 5.99, 6.0, 29.0, 30.0, 31.0, -1.0], &edges);
        assert_eq!(counts, vec![2, 1, 0, 0, 2]);
    }

    #[test]
    fn test_min_max_avg() {
        assert_eq!(min_max_avg(&[]), (0.0, 0.0, 0.0));
        let (min, max, avg) = min_max_avg(&[-3.0, 1.0, 5.0]);
        assert_eq!((min, max), (-3.0, 5.0));
        assert!((avg - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_safe_ratio() {
        assert_eq!(safe_ratio(3.0, 0.0), 0.0);
        assert_eq!(safe_ratio(1.0, 4.0), 0.25);
    }
}
