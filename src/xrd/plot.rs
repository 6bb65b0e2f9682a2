//! # XRD 图表生成
//!
//! 使用 `plotters` 绘制加权衍射图谱：各结构强度的最小-最大范围作为阴影带，
//! Boltzmann 加权平均作为实线。支持 PNG 与 SVG。
//!
//! ## 依赖关系
//! - 被 `commands/analyze/xrd.rs` 调用
//! - 使用 `plotters` 渲染图表

use crate::error::{GulpkitError, Result};

use plotters::prelude::*;
use std::fmt::Debug;
use std::path::Path;

const LINE_COLOR: RGBColor = RGBColor(48, 70, 151);

fn plot_err<E: Debug>(e: E) -> GulpkitError {
    GulpkitError::PlotError(format!("{:?}", e))
}

/// 加权图谱数据
pub struct BandPlot<'a> {
    pub two_theta: &'a [f64],
    pub lower: &'a [f64],
    pub upper: &'a [f64],
    pub weighted: &'a [f64],
    pub title: &'a str,
}

/// 生成加权 XRD 图表；扩展名为 `.svg` 时输出 SVG
pub fn generate_band_plot(data: &BandPlot, output_path: &Path, width: u32, height: u32) -> Result<()> {
    let use_svg = output_path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("svg"))
        .unwrap_or(false);

    if use_svg {
        let root = SVGBackend::new(output_path, (width, height)).into_drawing_area();
        draw_band_chart(&root, data)?;
        root.present().map_err(plot_err)?;
    } else {
        let root = BitMapBackend::new(output_path, (width, height)).into_drawing_area();
        draw_band_chart(&root, data)?;
        root.present().map_err(plot_err)?;
    }
    Ok(())
}

fn draw_band_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    data: &BandPlot,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).map_err(plot_err)?;

    let x_min = data.two_theta.first().copied().unwrap_or(0.0);
    let x_max = data.two_theta.last().copied().unwrap_or(120.0);
    let y_max = data
        .upper
        .iter()
        .chain(data.weighted)
        .copied()
        .fold(0.0, f64::max);
    let y_max = if y_max > 0.0 { y_max * 1.05 } else { 1.0 };

    let mut chart = ChartBuilder::on(root)
        .caption(data.title, ("sans-serif", 28).into_font())
        .margin(30)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, 0.0..y_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("2θ (°)")
        .y_desc("Intensity")
        .x_label_style(("sans-serif", 16))
        .y_label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 18))
        .y_label_formatter(&|_| String::new())
        .draw()
        .map_err(plot_err)?;

    // 阴影带：上边界正序，下边界逆序，围成多边形
    let band: Vec<(f64, f64)> = data
        .two_theta
        .iter()
        .zip(data.upper)
        .map(|(x, y)| (*x, *y))
        .chain(
            data.two_theta
                .iter()
                .zip(data.lower)
                .rev()
                .map(|(x, y)| (*x, *y)),
        )
        .collect();
    if !band.is_empty() {
        chart
            .draw_series(std::iter::once(Polygon::new(band, LINE_COLOR.mix(0.3).filled())))
            .map_err(plot_err)?;
    }

    chart
        .draw_series(LineSeries::new(
            data.two_theta
                .iter()
                .zip(data.weighted)
                .map(|(x, y)| (*x, *y)),
            LINE_COLOR.stroke_width(1),
        ))
        .map_err(plot_err)?;

    Ok(())
}

