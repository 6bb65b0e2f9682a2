//! # 距离与近邻查询
//!
//! 位点数目在几千量级，直接线性扫描即可。

/// 笛卡尔点集
pub type PointSet = Vec<[f64; 3]>;

/// 欧氏距离
pub fn distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// 到点集中最近点的距离；点集为空时为 +inf
pub fn nearest_distance(p: &[f64; 3], points: &[[f64; 3]]) -> f64 {
    points
        .iter()
        .map(|q| distance(p, q))
        .fold(f64::INFINITY, f64::min)
}

/// 升序排列的 k 个最近距离（点集不足 k 个时返回全部）
pub fn k_nearest(p: &[f64; 3], points: &[[f64; 3]], k: usize) -> Vec<f64> {
    let mut d: Vec<f64> = points.iter().map(|q| distance(p, q)).collect();
    d.sort_by(|a, b| a.total_cmp(b));
    d.truncate(k);
    d
}

/// 半径 `cutoff` 内的点的距离（升序）
pub fn within(p: &[f64; 3], points: &[[f64; 3]], cutoff: f64) -> Vec<(usize, f64)> {
    let mut hits: Vec<(usize, f64)> = points
        .iter()
        .enumerate()
        .map(|(i, q)| (i, distance(p, q)))
        .filter(|(_, d)| *d <= cutoff)
        .collect();
    hits.sort_by(|a, b| a.1.total_cmp(&b.1));
    hits
}

/// 半径 `cutoff` 内的点数
pub fn count_within(p: &[f64; 3], points: &[[f64; 3]], cutoff: f64) -> usize {
    points.iter().filter(|q| distance(p, q) <= cutoff).count()
}

/// 每个点到同一点集内其他点的最近距离；只有一个点时为 +inf
pub fn nearest_other(points: &[[f64; 3]]) -> Vec<f64> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            points
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, q)| distance(p, q))
                .fold(f64::INFINITY, f64::min)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_k_nearest_and_within() {
        let pts = vec![[0.0, 0.0, 3.0], [0.0, 0.0, 1.0], [0.0, 2.0, 0.0]];
        let origin = [0.0; 3];
        assert_eq!(k_nearest(&origin, &pts, 2), vec![1.0, 2.0]);
        assert_eq!(k_nearest(&origin, &pts, 10).len(), 3);
        assert_eq!(within(&origin, &pts, 2.0), vec![(1, 1.0), (2, 2.0)]);
        assert_eq!(count_within(&origin, &pts, 2.5), 2);
        assert_eq!(nearest_distance(&origin, &pts), 1.0);
        assert_eq!(nearest_distance(&origin, &[]), f64::INFINITY);
    }

    #[test]
    fn test_nearest_other() {
        let pts = vec![[0.0; 3], [0.0, 0.0, 1.0], [0.0, 0.0, 5.0]];
        assert_eq!(nearest_other(&pts), vec![1.0, 1.0, 4.0]);
        assert_eq!(nearest_other(&[[0.0; 3]]), vec![f64::INFINITY]);
    }
}
