//! # analyze ensemble 实现
//!
//! 读取各掺杂数 s = 0..=n 的能量表，重标定为反应能后构造正则配分函数，
//! 再在化学势网格上做巨正则分析。
//!
//! ## 输出（位于输出目录，`--vib` 时文件名带 `_vib`）
//! - `Gx_T<T>.csv`: `x,G`
//! - `invcheck_T<T>.csv`: 若干浓度处反演得到的化学势
//! - `raw_T<T>.csv`: `x,u,-u`（`<x>(u)` 扫描）
//! - `all_T<T>.csv`: `x,GrandPotential,u,-u`
//! - `imag_freqlist.txt`: 因虚频被剔除的任务
//!
//! ## 依赖关系
//! - 使用 `thermo/ensemble.rs`
//! - 使用 `commands/collect/freq.rs` 的频率归档读取

use crate::cli::analyze::EnsembleArgs;
use crate::commands::collect::freq::{read_archive, FreqArchive};
use crate::error::{GulpkitError, Result};
use crate::parsers::table::{normalize_taskid, CsvTable};
use crate::thermo::ensemble::{
    canonical_ln_z, chemical_potential_grid, evaluation_points, free_energy, zero_point_energy,
    PotentialScan, Recalibration,
};
use crate::thermo::GrandCanonical;
use crate::utils::{fsio, output, progress};

use std::path::{Path, PathBuf};
use tabled::{Table, Tabled};

/// 反演检查的浓度
const INVCHECK_POINTS: [f64; 11] = [0.01, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 0.995];

/// 巨势求值点个数
const EVAL_BINS: usize = 2000;

/// 一个尺寸过滤后的结构
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filtered {
    pub energies: Vec<f64>,
    pub zpe: Vec<f64>,
    /// 含虚频被剔除的任务
    pub imaginary: Vec<String>,
    /// 归档中没有频率的任务
    pub missing: Vec<String>,
}

/// 每个尺寸的汇总行
#[derive(Debug, Clone, Tabled)]
struct SizeRow {
    #[tabled(rename = "Size")]
    size: usize,
    #[tabled(rename = "x")]
    x: String,
    #[tabled(rename = "Used")]
    used: usize,
    #[tabled(rename = "Imaginary")]
    imaginary: usize,
    #[tabled(rename = "G (eV)")]
    g: String,
}

/// 执行 analyze ensemble
pub fn execute(args: EnsembleArgs) -> Result<()> {
    output::print_header("Grand-Canonical Ensemble Analysis");

    if args.sizes == 0 {
        return Err(GulpkitError::InvalidArgument("--sizes must be at least 1".into()));
    }
    if args.vib && args.freq_pattern.is_none() {
        return Err(GulpkitError::InvalidArgument(
            "--vib requires --freq-pattern".into(),
        ));
    }
    output::print_info(&format!(
        "T = {} K, vibrations: {}, sizes 0..={}",
        args.temperature, args.vib, args.sizes
    ));

    let recal = Recalibration {
        host_energy: args.host_energy,
        ionisation: args.ionisation,
        reduction: args.reduction,
        correction: args.correction,
        formula_units: args.sizes as f64,
    };

    fsio::ensure_dir(&args.output_dir)?;
    let pb = progress::create_progress_bar(args.sizes as u64 + 1, "Reading sizes");
    let mut xs = Vec::new();
    let mut ln_z = Vec::new();
    let mut rows = Vec::new();
    let mut imag_log = vec![" * imaginary frequency listing [taskid]".to_string()];

    for s in 0..=args.sizes {
        let (filtered, total) = load_size(s, &args)?;
        let energies: Vec<f64> = filtered.energies.iter().map(|&e| recal.apply(e, s)).collect();
        let zpe = args.vib.then_some(filtered.zpe.as_slice());
        let lz = canonical_ln_z(&energies, zpe, args.temperature)?;

        if !filtered.missing.is_empty() {
            pb.suspend(|| {
                output::print_warning(&format!(
                    "size {}: {} structures have no archived frequencies",
                    s,
                    filtered.missing.len()
                ))
            });
        }
        imag_log.push(format!(
            " * size {}: {}/{} structures with imaginary frequencies were found : {}",
            s,
            filtered.imaginary.len(),
            total,
            filtered.imaginary.join(", ")
        ));

        let x = s as f64 / args.sizes as f64;
        rows.push(SizeRow {
            size: s,
            x: format!("{:.4}", x),
            used: energies.len(),
            imaginary: filtered.imaginary.len(),
            g: format!("{:.6}", free_energy(lz, args.temperature)),
        });
        xs.push(x);
        ln_z.push(lz);
        pb.inc(1);
    }
    pb.finish_and_clear();
    println!("{}", Table::new(rows));

    if args.freq_pattern.is_some() {
        let path = args.output_dir.join("imag_freqlist.txt");
        fsio::write_lines(&path, &imag_log)?;
        output::print_written("imaginary-mode log", &path, imag_log.len() - 1);
    }

    let gc = GrandCanonical::new(xs.clone(), ln_z.clone(), args.temperature)?;
    let spinner = progress::create_spinner("Scanning chemical potential");
    let scan = gc.scan(chemical_potential_grid());
    spinner.finish_and_clear();

    let out = OutputNames::new(&args.output_dir, args.temperature, args.vib);
    write_free_energies(&out.gx, &xs, &ln_z, args.temperature)?;
    write_inversion_check(&out.invcheck, &scan)?;
    write_scan(&out.raw, &scan)?;
    write_grand_potential(&out.all, &gc, &scan)?;

    output::print_written("free energies", &out.gx, xs.len());
    output::print_written("inversion check", &out.invcheck, INVCHECK_POINTS.len());
    output::print_written("<x>(u) scan", &out.raw, scan.u.len());
    output::print_written("grand potential", &out.all, EVAL_BINS);
    output::print_done("Ensemble analysis complete");
    Ok(())
}

/// 读取一个尺寸；返回过滤后的结构与原始结构数
fn load_size(size: usize, args: &EnsembleArgs) -> Result<(Filtered, usize)> {
    let csv_path = PathBuf::from(args.csv_pattern.replace("{}", &size.to_string()));
    let table = CsvTable::read(&csv_path)?;
    let energies = table.f64_column("energy")?;
    let ids: Vec<String> = table
        .column("taskid")?
        .iter()
        .map(|t| normalize_taskid(t))
        .collect();

    let archive = match &args.freq_pattern {
        Some(pattern) => Some(read_archive(Path::new(
            &pattern.replace("{}", &size.to_string()),
        ))?),
        None => None,
    };

    let mut filtered = filter_structures(
        &ids,
        &energies,
        archive.as_ref(),
        args.imaginary_cutoff,
        args.skip_modes,
    );
    filtered.energies.truncate(args.max_samples);
    filtered.zpe.truncate(args.max_samples);
    Ok((filtered, ids.len()))
}

/// 剔除含虚频的结构，其余结构去掉前 `skip_modes` 个频率后求零点能
///
/// 没有归档时全部保留，零点能为 0。
pub fn filter_structures(
    ids: &[String],
    energies: &[f64],
    archive: Option<&FreqArchive>,
    cutoff: f64,
    skip_modes: usize,
) -> Filtered {
    let mut out = Filtered::default();
    for (id, &energy) in ids.iter().zip(energies) {
        let zpe = match archive.map(|a| a.get(id)) {
            None => 0.0,
            Some(None) => {
                out.missing.push(id.clone());
                continue;
            }
            Some(Some(freqs)) => {
                if freqs.iter().any(|&f| f < cutoff) {
                    out.imaginary.push(id.clone());
                    continue;
                }
                let kept: Vec<f64> = freqs.iter().skip(skip_modes).copied().collect();
                zero_point_energy(&kept)
            }
        };
        out.energies.push(energy);
        out.zpe.push(zpe);
    }
    out
}

struct OutputNames {
    gx: PathBuf,
    invcheck: PathBuf,
    raw: PathBuf,
    all: PathBuf,
}

impl OutputNames {
    fn new(dir: &Path, temperature: f64, vib: bool) -> Self {
        let suffix = if vib { "_vib" } else { "" };
        let name = |stem: &str| dir.join(format!("{}_T{}{}.csv", stem, temperature, suffix));
        Self {
            gx: name("Gx"),
            invcheck: name("invcheck"),
            raw: name("raw"),
            all: name("all"),
        }
    }
}

fn write_rows(path: &Path, header: &[&str], rows: impl Iterator<Item = Vec<String>>) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(header)?;
    for row in rows {
        wtr.write_record(&row)?;
    }
    wtr.flush().map_err(|e| GulpkitError::write(path, e))?;
    Ok(())
}

fn write_free_energies(path: &Path, xs: &[f64], ln_z: &[f64], temperature: f64) -> Result<()> {
    write_rows(
        path,
        &["x", "G"],
        xs.iter().zip(ln_z).map(|(x, lz)| {
            vec![
                format!("{:.8}", x),
                format!("{:.8}", free_energy(*lz, temperature)),
            ]
        }),
    )
}

fn write_inversion_check(path: &Path, scan: &PotentialScan) -> Result<()> {
    let rows = INVCHECK_POINTS
        .iter()
        .map(|&x| Ok(vec![x.to_string(), format!("{:.8}", scan.u_by_x(x)?)]))
        .collect::<Result<Vec<_>>>()?;
    write_rows(path, &["x", "u"], rows.into_iter())
}

fn write_scan(path: &Path, scan: &PotentialScan) -> Result<()> {
    write_rows(
        path,
        &["x", "u", "-u"],
        scan.mean_x.iter().zip(&scan.u).map(|(x, u)| {
            vec![format!("{:.8}", x), format!("{:.8}", u), format!("{:.8}", -u)]
        }),
    )
}

fn write_grand_potential(path: &Path, gc: &GrandCanonical, scan: &PotentialScan) -> Result<()> {
    let rows = evaluation_points(EVAL_BINS)
        .into_iter()
        .map(|x| {
            let u = scan.u_by_x(x)?;
            Ok(vec![
                format!("{:.8}", x),
                format!("{:.8}", gc.grand_potential(u)),
                format!("{:.8}", u),
                format!("{:.8}", -u),
            ])
        })
        .collect::<Result<Vec<_>>>()?;
    write_rows(path, &["x", "GrandPotential", "u", "-u"], rows.into_iter())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_filter_structures() {
        let mut archive = FreqArchive::new();
        archive.insert("1".into(), vec![0.0, 0.0, 0.0, 100.0, 200.0]);
        archive.insert("2".into(), vec![-3.0, 0.0, 0.0, 100.0]);
        let f = filter_structures(
            &ids(&["1", "2", "3"]),
            &[-1.0, -2.0, -3.0],
            Some(&archive),
            -0.5,
            3,
        );
        assert_eq!(f.energies, vec![-1.0]);
        assert_eq!(f.imaginary, vec!["2"]);
        assert_eq!(f.missing, vec!["3"]);
        assert!((f.zpe[0] - 150.0 * 1.239841984332e-4).abs() < 1e-12);

        let f = filter_structures(&ids(&["1", "2"]), &[-1.0, -2.0], None, -0.5, 3);
        assert_eq!(f.energies.len(), 2);
        assert_eq!(f.zpe, vec![0.0, 0.0]);
    }

    #[test]
    fn test_execute_writes_tables() {
        let dir = tempfile::tempdir().unwrap();
        for (s, rows) in [(0, "-10.0,1\n"), (1, "-12.0,1\n-11.5,2\n"), (2, "-14.5,3\n")] {
            std::fs::write(
                dir.path().join(format!("nconp{}.csv", s)),
                format!("energy,taskid\n{}", rows),
            )
            .unwrap();
        }
        std::fs::write(
            dir.path().join("freq1.csv"),
            "taskid,frequency\n1,0\n1,0\n1,0\n1,50\n2,-4\n",
        )
        .unwrap();
        for s in [0, 2] {
            std::fs::write(
                dir.path().join(format!("freq{}.csv", s)),
                format!("taskid,frequency\n{},0\n{},10\n", 1 + s, 1 + s),
            )
            .unwrap();
        }

        let pattern = |stem: &str| dir.path().join(stem).display().to_string();
        execute(EnsembleArgs {
            csv_pattern: pattern("nconp{}.csv"),
            freq_pattern: Some(pattern("freq{}.csv")),
            sizes: 2,
            temperature: 300.0,
            vib: true,
            max_samples: 10000,
            imaginary_cutoff: -0.5,
            skip_modes: 3,
            host_energy: -10.0,
            ionisation: 0.0,
            reduction: 0.0,
            correction: 0.0,
            output_dir: dir.path().to_path_buf(),
        })
        .unwrap();

        let gx = std::fs::read_to_string(dir.path().join("Gx_T300_vib.csv")).unwrap();
        assert_eq!(gx.lines().count(), 4);
        assert!(gx.starts_with("x,G\n0.00000000,"));
        let inv = std::fs::read_to_string(dir.path().join("invcheck_T300_vib.csv")).unwrap();
        assert_eq!(inv.lines().count(), 12);
        let raw = std::fs::read_to_string(dir.path().join("raw_T300_vib.csv")).unwrap();
        assert_eq!(raw.lines().count(), 5002);
        let all = std::fs::read_to_string(dir.path().join("all_T300_vib.csv")).unwrap();
        assert_eq!(all.lines().count(), 2001);

        let imag = std::fs::read_to_string(dir.path().join("imag_freqlist.txt")).unwrap();
        assert!(imag.contains("size 1: 1/2 structures with imaginary frequencies were found : 2"));
    }

    #[test]
    fn test_vib_requires_frequencies() {
        let err = execute(EnsembleArgs {
            csv_pattern: "nconp{}.csv".into(),
            freq_pattern: None,
            sizes: 2,
            temperature: 300.0,
            vib: true,
            max_samples: 10,
            imaginary_cutoff: -0.5,
            skip_modes: 3,
            host_energy: 0.0,
            ionisation: 0.0,
            reduction: 0.0,
            correction: 0.0,
            output_dir: PathBuf::from("."),
        });
        assert!(matches!(err, Err(GulpkitError::InvalidArgument(_))));
    }
}
