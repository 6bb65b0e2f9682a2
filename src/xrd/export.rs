//! # XRD 数据汇总与导出
//!
//! ## 功能
//! - 多个结构在公共 2θ 网格上的加权平均与最小-最大包络
//! - `xrd_weighted.csv`: `Two_Theta, Intensity1..N, Total_Weighted_Intensity`
//! - `powder.csv`: 单个结构的展宽图谱 `two_theta, intensity`
//!
//! ## 依赖关系
//! - 被 `commands/analyze/xrd.rs` 调用
//! - 使用 `csv` 库写入 CSV 文件

use crate::error::{GulpkitError, Result};

use std::path::Path;

/// 逐点加权平均 `Σ w_i I_i / Σ w_i`；权重和为 0 时返回全 0
pub fn weighted_average(columns: &[Vec<f64>], weights: &[f64]) -> Vec<f64> {
    let len = columns.first().map(|c| c.len()).unwrap_or(0);
    let total: f64 = weights.iter().sum();
    let mut out = vec![0.0; len];
    if total == 0.0 {
        return out;
    }
    for (col, w) in columns.iter().zip(weights) {
        for (o, v) in out.iter_mut().zip(col) {
            *o += w * v;
        }
    }
    out.iter_mut().for_each(|o| *o /= total);
    out
}

/// 逐点最小值与最大值
pub fn envelope(columns: &[Vec<f64>]) -> (Vec<f64>, Vec<f64>) {
    let len = columns.first().map(|c| c.len()).unwrap_or(0);
    let mut lower = vec![f64::INFINITY; len];
    let mut upper = vec![f64::NEG_INFINITY; len];
    for col in columns {
        for (i, v) in col.iter().enumerate().take(len) {
            lower[i] = lower[i].min(*v);
            upper[i] = upper[i].max(*v);
        }
    }
    if columns.is_empty() {
        return (Vec::new(), Vec::new());
    }
    (lower, upper)
}

/// 写出加权汇总表
pub fn write_weighted_csv(
    path: &Path,
    two_theta: &[f64],
    columns: &[Vec<f64>],
    total: &[f64],
) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    let mut header = vec!["Two_Theta".to_string()];
    header.extend((1..=columns.len()).map(|i| format!("Intensity{}", i)));
    header.push("Total_Weighted_Intensity".to_string());
    wtr.write_record(&header)?;

    for (i, x) in two_theta.iter().enumerate() {
        let mut row = vec![format!("{:.4}", x)];
        row.extend(columns.iter().map(|c| format!("{:.6}", c[i])));
        row.push(format!("{:.6}", total[i]));
        wtr.write_record(&row)?;
    }

    wtr.flush().map_err(|e| GulpkitError::write(path, e))?;
    Ok(())
}

/// 写出单个结构的展宽图谱
pub fn write_powder_csv(path: &Path, two_theta: &[f64], intensity: &[f64]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["two_theta", "intensity"])?;
    for (x, y) in two_theta.iter().zip(intensity) {
        wtr.write_record(&[format!("{:.4}", x), format!("{:.6}", y)])?;
    }
    wtr.flush().map_err(|e| GulpkitError::write(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_average_and_envelope() {
        let cols = vec![vec![1.0, 4.0], vec![3.0, 0.0]];
        assert_eq!(weighted_average(&cols, &[1.0, 1.0]), vec![2.0, 2.0]);
        assert_eq!(weighted_average(&cols, &[3.0, 1.0]), vec![1.5, 3.0]);
        assert_eq!(weighted_average(&cols, &[0.0, 0.0]), vec![0.0, 0.0]);

        let (lo, hi) = envelope(&cols);
        assert_eq!(lo, vec![1.0, 0.0]);
        assert_eq!(hi, vec![3.0, 4.0]);
        assert!(envelope(&[]).0.is_empty());
    }

    #[test]
    fn test_weighted_csv_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xrd_weighted.csv");
        let cols = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        write_weighted_csv(&path, &[10.0, 10.02], &cols, &[2.0, 3.0]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Two_Theta,Intensity1,Intensity2,Total_Weighted_Intensity")
        );
        assert_eq!(lines.next(), Some("10.0000,1.000000,3.000000,2.000000"));
        assert_eq!(text.lines().count(), 3);
    }
}
