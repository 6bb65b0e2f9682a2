//! # analyze dos 实现
//!
//! 把若干能量表画成堆叠的 Gaussian 展宽态密度曲线。
//!
//! ## 功能
//! - 能量除以 `--scale`，去除高于百分位阈值的离群值，平移到从 0 开始
//! - 在 `--bins` 个等距网格点上做 Gaussian 展宽并归一化到 [0, 1]
//! - 依次向上偏移 `--offset` 堆叠，输出 PNG/SVG 与 CSV
//!
//! ## 依赖关系
//! - 使用 `parsers/table.rs`, `utils/stats.rs`
//! - 使用 `plotters` 绘图

use crate::cli::analyze::DosArgs;
use crate::error::{GulpkitError, Result};
use crate::parsers::table::CsvTable;
use crate::utils::{fsio, output, stats};

use plotters::prelude::*;
use std::f64::consts::PI;
use std::fmt::Debug;
use std::path::Path;

/// 一条态密度曲线
#[derive(Debug, Clone, PartialEq)]
pub struct DosCurve {
    pub label: String,
    pub energy: Vec<f64>,
    pub dos: Vec<f64>,
}

/// 执行 analyze dos
pub fn execute(args: DosArgs) -> Result<()> {
    output::print_header("Energy Density of States");

    if args.bins < 2 || args.sigma <= 0.0 || args.scale == 0.0 {
        return Err(GulpkitError::InvalidArgument(
            "dos needs at least 2 bins, a positive sigma and a non-zero scale".into(),
        ));
    }

    let mut curves = Vec::new();
    for input in &args.inputs {
        let table = CsvTable::read(input)?;
        let raw: Vec<f64> = table
            .column(&args.column)?
            .iter()
            .filter_map(|c| c.parse::<f64>().ok())
            .collect();
        if raw.is_empty() {
            output::print_warning(&format!("{}: no energies in column '{}'", input.display(), args.column));
            continue;
        }
        let energies = prepare_energies(&raw, args.scale, args.percentile);
        let (energy, dos) = smeared_dos(&energies, args.sigma, args.bins);
        output::print_info(&format!(
            "{}: {} energies, span {:.6}",
            input.display(),
            energies.len(),
            energy.last().copied().unwrap_or(0.0)
        ));
        curves.push(DosCurve {
            label: fsio::file_name(input).trim_end_matches(".csv").to_string(),
            energy,
            dos: normalize(&dos),
        });
    }

    if curves.is_empty() {
        return Err(GulpkitError::Other("no input contained energies".into()));
    }

    write_curves(&args.csv, &curves)?;
    output::print_written("DOS curves", &args.csv, curves.iter().map(|c| c.energy.len()).sum());

    generate_stacked_plot(&curves, args.offset, &args.output, args.width, args.height)?;
    output::print_success(&format!("Plot saved to '{}'", args.output.display()));
    Ok(())
}

/// 缩放、去除高端离群值并平移到最小值为 0
pub fn prepare_energies(raw: &[f64], scale: f64, percentile: f64) -> Vec<f64> {
    let scaled: Vec<f64> = raw.iter().map(|e| e / scale).collect();
    let threshold = stats::percentile(&scaled, percentile);
    let kept: Vec<f64> = scaled.into_iter().filter(|e| *e <= threshold).collect();
    let min = kept.iter().copied().fold(f64::INFINITY, f64::min);
    kept.iter().map(|e| e - min).collect()
}

/// 在 `[min, max)` 上取 `bins` 个等距点做归一化 Gaussian 求和
pub fn smeared_dos(energies: &[f64], sigma: f64, bins: usize) -> (Vec<f64>, Vec<f64>) {
    let min = energies.iter().copied().fold(f64::INFINITY, f64::min);
    let max = energies.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() {
        return (Vec::new(), Vec::new());
    }
    let step = (max - min) / bins as f64;
    let grid: Vec<f64> = if step > 0.0 {
        (0..bins).map(|i| min + i as f64 * step).collect()
    } else {
        vec![min]
    };

    let norm = 1.0 / (sigma * (2.0 * PI).sqrt());
    let dos = grid
        .iter()
        .map(|g| {
            energies
                .iter()
                .map(|e| norm * (-(g - e).powi(2) / (2.0 * sigma * sigma)).exp())
                .sum()
        })
        .collect();
    (grid, dos)
}

/// 线性映射到 [0, 1]；常数序列映射为 0
pub fn normalize(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    values
        .iter()
        .map(|v| if span > 0.0 { (v - min) / span } else { 0.0 })
        .collect()
}

/// 长表 `label,energy,dos`
fn write_curves(path: &Path, curves: &[DosCurve]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["label", "energy", "dos"])?;
    for c in curves {
        for (e, d) in c.energy.iter().zip(&c.dos) {
            wtr.write_record(&[c.label.clone(), format!("{:.8}", e), format!("{:.6}", d)])?;
        }
    }
    wtr.flush().map_err(|e| GulpkitError::write(path, e))?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────
// 绘图
// ─────────────────────────────────────────────────────────────

const LIGHT: (f64, f64, f64) = (166.0, 189.0, 219.0);
const DARK: (f64, f64, f64) = (2.0, 56.0, 88.0);

fn plot_err<E: Debug>(e: E) -> GulpkitError {
    GulpkitError::PlotError(format!("{:?}", e))
}

/// 由浅到深的蓝色渐变
fn curve_color(index: usize, count: usize) -> RGBColor {
    let t = if count > 1 {
        index as f64 / (count - 1) as f64
    } else {
        1.0
    };
    let mix = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    RGBColor(mix(LIGHT.0, DARK.0), mix(LIGHT.1, DARK.1), mix(LIGHT.2, DARK.2))
}

/// 堆叠曲线图；扩展名为 `.svg` 时输出 SVG
pub fn generate_stacked_plot(
    curves: &[DosCurve],
    offset: f64,
    output_path: &Path,
    width: u32,
    height: u32,
) -> Result<()> {
    let use_svg = output_path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("svg"))
        .unwrap_or(false);

    if use_svg {
        let root = SVGBackend::new(output_path, (width, height)).into_drawing_area();
        draw_stacked_chart(&root, curves, offset)?;
        root.present().map_err(plot_err)?;
    } else {
        let root = BitMapBackend::new(output_path, (width, height)).into_drawing_area();
        draw_stacked_chart(&root, curves, offset)?;
        root.present().map_err(plot_err)?;
    }
    Ok(())
}

fn draw_stacked_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    curves: &[DosCurve],
    offset: f64,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).map_err(plot_err)?;

    let x_max = curves
        .iter()
        .filter_map(|c| c.energy.last().copied())
        .fold(0.0, f64::max);
    let x_max = if x_max > 0.0 { x_max * 1.05 } else { 1.0 };
    let y_max = offset * (curves.len().saturating_sub(1)) as f64 + 1.2;

    let mut chart = ChartBuilder::on(root)
        .margin(30)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..x_max, 0.0..y_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("Energy (eV)")
        .y_desc("DOS")
        .x_label_style(("sans-serif", 16))
        .y_label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 18))
        .draw()
        .map_err(plot_err)?;

    for (i, curve) in curves.iter().enumerate() {
        let color = curve_color(i, curves.len());
        let shift = offset * i as f64;
        chart
            .draw_series(LineSeries::new(
                curve.energy.iter().zip(&curve.dos).map(|(x, y)| (*x, y + shift)),
                color.stroke_width(2),
            ))
            .map_err(plot_err)?
            .label(curve.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(("sans-serif", 14))
        .draw()
        .map_err(plot_err)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_energies() {
        let raw: Vec<f64> = (0..10).map(|i| 180.0 * i as f64).collect();
        let e = prepare_energies(&raw, 180.0, 50.0);
        assert_eq!(e, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_smeared_dos_grid() {
        let (grid, dos) = smeared_dos(&[0.0, 1.0], 0.1, 4);
        assert_eq!(grid, vec![0.0, 0.25, 0.5, 0.75]);
        assert_eq!(dos.len(), 4);
        // 首点位于一个能量上，峰值约为 1/(σ√2π)
        assert!((dos[0] - 1.0 / (0.1 * (2.0 * PI).sqrt())).abs() < 1e-6);
        assert!(dos[2] < dos[0]);

        let (grid, _) = smeared_dos(&[2.0, 2.0], 0.1, 4);
        assert_eq!(grid, vec![2.0]);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(&[1.0, 3.0, 2.0]), vec![0.0, 1.0, 0.5]);
        assert_eq!(normalize(&[5.0, 5.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_curve_color_gradient() {
        assert_eq!(curve_color(0, 3), RGBColor(166, 189, 219));
        assert_eq!(curve_color(2, 3), RGBColor(2, 56, 88));
        assert_eq!(curve_color(0, 1), RGBColor(2, 56, 88));
    }
}
