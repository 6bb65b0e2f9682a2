//! # analyze xrd 实现
//!
//! 取汇总表中能量最低的若干结构，由各自的 `gulp.res` 计算粉末衍射图样，
//! 在公共 2θ 网格上按 Boltzmann 权重平均。
//!
//! ## 功能
//! - 权重取汇总表的 `Weight` 列；没有时按 `--temperature` 计算
//! - 并行计算（rayon），失败的结构不参与平均
//! - `xrd_weighted.csv` 与带最小-最大阴影带的图 (PNG/SVG)
//! - 可选：每个任务目录写出 `powder.csv`
//!
//! ## 依赖关系
//! - 使用 `cli/analyze.rs` 定义的 XrdArgs
//! - 使用 `batch/` 模块进行批量处理
//! - 使用 `xrd/` 模块进行计算、导出与绘图
//! - 使用 `parsers/restart.rs` 读取结构

use crate::batch::BatchRunner;
use crate::cli::analyze::XrdArgs;
use crate::error::{GulpkitError, Result};
use crate::parsers::restart;
use crate::parsers::table::{normalize_taskid, CsvTable};
use crate::thermo::boltzmann_weights;
use crate::utils::output;
use crate::xrd::export::{envelope, weighted_average, write_powder_csv, write_weighted_csv};
use crate::xrd::plot::{generate_band_plot, BandPlot};
use crate::xrd::{two_theta_grid, XrdCalculator};

use std::path::PathBuf;
use tabled::{Table, Tabled};

/// 参与平均的一个结构
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub taskid: String,
    pub energy: f64,
    pub weight: f64,
}

/// 结果表格行
#[derive(Debug, Clone, Tabled)]
struct ResultRow {
    #[tabled(rename = "Rank")]
    rank: usize,
    #[tabled(rename = "Task")]
    task: String,
    #[tabled(rename = "Formula")]
    formula: String,
    #[tabled(rename = "Energy (eV)")]
    energy: String,
    #[tabled(rename = "Weight")]
    weight: String,
    #[tabled(rename = "Peaks")]
    peaks: String,
}

/// 执行 analyze xrd
pub fn execute(args: XrdArgs) -> Result<()> {
    output::print_header("Boltzmann-Weighted Powder Diffraction");

    if args.two_theta_max <= args.two_theta_min || args.step <= 0.0 {
        return Err(GulpkitError::InvalidRange(format!(
            "2θ {}..{} step {}",
            args.two_theta_min, args.two_theta_max, args.step
        )));
    }

    let summary = CsvTable::read(&args.summary)?;
    let candidates = select_candidates(&summary, &args.energy_column, args.top, args.temperature)?;
    if candidates.is_empty() {
        return Err(GulpkitError::Other(format!(
            "'{}' lists no structures",
            args.summary.display()
        )));
    }
    output::print_info(&format!(
        "{} structures, wavelength {:.4} Å, 2θ {:.1}°-{:.1}°",
        candidates.len(),
        args.wavelength,
        args.two_theta_min,
        args.two_theta_max
    ));

    let grid = two_theta_grid(args.two_theta_min, args.two_theta_max, args.step);
    let calculator = XrdCalculator::new(args.wavelength);
    let runner = BatchRunner::new(args.batch.jobs);

    let patterns = runner.map(&candidates, "Diffracting", |c| -> Result<(String, usize, Vec<f64>)> {
        let dir = task_dir(&args, &c.taskid);
        let crystal = restart::parse_restart_crystal(&dir.join(&args.restart), &c.taskid)?;
        let pattern = calculator.calculate(&crystal, args.two_theta_min, args.two_theta_max)?;
        let profile = pattern.profile(&grid, args.fwhm);
        if args.powder {
            write_powder_csv(&dir.join("powder.csv"), &grid, &profile)?;
        }
        Ok((crystal.formula(), pattern.peaks.len(), profile))
    })?;

    let mut rows = Vec::new();
    let mut columns = Vec::new();
    let mut weights = Vec::new();
    let mut failures = Vec::new();
    for (rank, (c, result)) in candidates.iter().zip(patterns).enumerate() {
        let (formula, peaks) = match result {
            Ok((formula, n, profile)) => {
                columns.push(profile);
                weights.push(c.weight);
                (formula, n.to_string())
            }
            Err(e) => {
                failures.push((c.taskid.clone(), e.to_string()));
                ("-".to_string(), "-".to_string())
            }
        };
        rows.push(ResultRow {
            rank: rank + 1,
            task: format!("{}{}", args.batch.prefix, c.taskid),
            formula,
            energy: format!("{:.6}", c.energy),
            weight: format!("{:.4}", c.weight),
            peaks,
        });
    }
    println!("{}", Table::new(rows));
    output::print_failures(&failures, 10);

    if columns.is_empty() {
        return Err(GulpkitError::Other("no diffraction pattern could be computed".into()));
    }

    let weighted = weighted_average(&columns, &weights);
    write_weighted_csv(&args.csv, &grid, &columns, &weighted)?;
    output::print_written("weighted pattern", &args.csv, grid.len());

    if !args.no_plot {
        let (lower, upper) = envelope(&columns);
        let title = format!("Weighted XRD ({} structures)", columns.len());
        generate_band_plot(
            &BandPlot {
                two_theta: &grid,
                lower: &lower,
                upper: &upper,
                weighted: &weighted,
                title: &title,
            },
            &args.output,
            args.width,
            args.height,
        )?;
        output::print_success(&format!("Plot saved to '{}'", args.output.display()));
    }

    output::print_done(&format!(
        "Averaged {} of {} structures",
        columns.len(),
        candidates.len()
    ));
    Ok(())
}

fn task_dir(args: &XrdArgs, taskid: &str) -> PathBuf {
    args.root.join(format!("{}{}", args.batch.prefix, taskid))
}

/// 能量最低的 `top` 个结构及其权重
///
/// 有 `Weight` 列时沿用表中的值，否则在所选结构内计算 Boltzmann 权重。
pub fn select_candidates(
    summary: &CsvTable,
    energy_column: &str,
    top: usize,
    temperature: f64,
) -> Result<Vec<Candidate>> {
    let energies = summary.f64_column(energy_column)?;
    let ids = summary.column("taskid")?;
    let given = if summary.has_column("Weight") {
        Some(summary.f64_column("Weight")?)
    } else {
        None
    };

    let mut order: Vec<usize> = (0..energies.len()).collect();
    order.sort_by(|&a, &b| energies[a].total_cmp(&energies[b]));
    order.truncate(top);

    let selected: Vec<f64> = order.iter().map(|&i| energies[i]).collect();
    let weights = match &given {
        Some(w) => order.iter().map(|&i| w[i]).collect(),
        None => boltzmann_weights(&selected, temperature),
    };

    Ok(order
        .iter()
        .zip(weights)
        .map(|(&i, weight)| Candidate {
            taskid: normalize_taskid(&ids[i]),
            energy: energies[i],
            weight,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::BatchOpts;

    const RES: &str = "\
cell
5.411 5.411 5.411 90.0 90.0 90.0
fractional
Ce core 0.0 0.0 0.0
Ce core 0.0 0.5 0.5
Ce core 0.5 0.0 0.5
Ce core 0.5 0.5 0.0
O  core 0.25 0.25 0.25
O  core 0.75 0.75 0.75
totalenergy -100.0 eV
";

    fn summary(dir: &std::path::Path, content: &str) -> CsvTable {
        let p = dir.join("summary.csv");
        std::fs::write(&p, content).unwrap();
        CsvTable::read(&p).unwrap()
    }

    #[test]
    fn test_select_candidates_boltzmann() {
        let dir = tempfile::tempdir().unwrap();
        let t = summary(dir.path(), "energy,taskid\n-1.0,A3\n-2.0,A1\n-2.0,A2\n");
        let c = select_candidates(&t, "energy", 2, 300.0).unwrap();
        assert_eq!(c.len(), 2);
        assert_eq!(c[0].taskid, "1");
        assert_eq!(c[1].taskid, "2");
        assert!((c[0].weight - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_select_candidates_uses_weight_column() {
        let dir = tempfile::tempdir().unwrap();
        let t = summary(dir.path(), "energy,taskid,Weight\n-1.0,3,0.2\n-2.0,1,0.8\n");
        let c = select_candidates(&t, "energy", 10, 300.0).unwrap();
        assert_eq!(c[0].weight, 0.8);
        assert_eq!(c[1].weight, 0.2);
    }

    #[test]
    fn test_execute_writes_weighted_table() {
        let dir = tempfile::tempdir().unwrap();
        for id in [1, 2] {
            let task = dir.path().join(format!("A{}", id));
            std::fs::create_dir(&task).unwrap();
            std::fs::write(task.join("gulp.res"), RES).unwrap();
        }
        let summary = dir.path().join("summary.csv");
        std::fs::write(&summary, "energy,taskid\n-100.0,1\n-99.0,2\n-98.0,3\n").unwrap();
        let csv = dir.path().join("xrd_weighted.csv");

        execute(XrdArgs {
            summary,
            root: dir.path().to_path_buf(),
            batch: BatchOpts {
                jobs: 1,
                prefix: "A".into(),
            },
            top: 3,
            energy_column: "energy".into(),
            restart: "gulp.res".into(),
            wavelength: 1.5498,
            temperature: 300.0,
            two_theta_min: 20.0,
            two_theta_max: 60.0,
            fwhm: 0.1,
            step: 0.02,
            powder: true,
            csv: csv.clone(),
            output: dir.path().join("xrd.png"),
            no_plot: true,
            width: 800,
            height: 400,
        })
        .unwrap();

        let text = std::fs::read_to_string(&csv).unwrap();
        assert!(text.starts_with("Two_Theta,Intensity1,Intensity2,Total_Weighted_Intensity\n"));
        assert_eq!(text.lines().count(), 2002);
        assert!(dir.path().join("A1/powder.csv").is_file());
    }
}
