//! # collect nanoparticle 实现
//!
//! 纳米颗粒计算的能量与位点表统计：径向距离分位数、体相/表面计数与比例、
//! 空位-掺杂距离均值以及各分类标签的计数。
//!
//! ## 依赖关系
//! - 使用 `cli/collect.rs` 定义的 NanoparticleArgs
//! - 使用 `parsers/gout.rs`, `parsers/site_table.rs`
//! - 位点表的附加列由 `commands/sites/classify.rs` 写入

use super::{write_summaries, Record, SummaryTable};
use crate::batch::{BatchRunner, TaskDir, TaskDirs};
use crate::cli::collect::NanoparticleArgs;
use crate::error::Result;
use crate::models::SiteRecord;
use crate::parsers::{gout, site_table};
use crate::utils::{output, stats};

/// 空位表附加列
const VO_D1: usize = 0;
const VO_D2: usize = 1;
const VO_N1: usize = 2;
const VO_N2: usize = 3;
const VO_D3: usize = 4;
const VO_CLASS: usize = 5;
/// 掺杂表附加列
const DOPANT_D4: usize = 0;
const DOPANT_CLASS: usize = 1;

const SHELL_LABELS: [&str; 3] = ["2N", "3N", "fN"];
const PAIR_LABELS: [&str; 4] = ["VO_100", "VO_110", "VO_111", "VO_far"];

/// 参与统计的物种名
#[derive(Debug, Clone)]
pub struct Species {
    pub dopant: String,
    pub host: String,
    pub anion: String,
}

/// 执行 collect nanoparticle
pub fn execute(args: NanoparticleArgs) -> Result<()> {
    output::print_header("Collecting Nanoparticle GULP Results");

    let tasks = TaskDirs::new(&args.root)
        .with_prefix(&args.batch.prefix)
        .collect_non_empty()?;
    output::print_info(&format!("Found {} task directories", tasks.len()));

    let species = Species {
        dopant: args.dopant.clone(),
        host: args.host.clone(),
        anion: args.anion.clone(),
    };

    let runner = BatchRunner::new(args.batch.jobs);
    let records: Vec<Option<Record>> = runner.map(&tasks, "Parsing", |task| {
        collect_task(task, &args.summary.gout, &species)
    })?;

    let table = SummaryTable::from_records(header(&species), records.into_iter().flatten().collect());
    let gnorm = table.column_index("Gnorm")?;
    let tol = args.gnorm_tol;
    let filtered = table.filtered(|r| r.values[gnorm] < tol);

    write_summaries(&table, &filtered, 0, None, &args.root, &args.summary)?;
    output::print_done("Nanoparticle collection finished");
    Ok(())
}

fn collect_task(task: &TaskDir, gout_name: &str, species: &Species) -> Option<Record> {
    let summary = gout::parse_gout_file(&task.file(gout_name)).ok()?;
    let read = |name: &str| site_table::read_site_table_or_empty(&task.file(&format!("{}.txt", name)));

    let dopant = read(&species.dopant).ok()?;
    let vacancies = read("VO").ok()?;
    let host = read(&species.host).ok()?;
    let anion = read(&species.anion).ok()?;
    if dopant.is_empty() || vacancies.is_empty() {
        return None;
    }

    let mut values = vec![summary.final_energy, summary.final_gnorm];
    values.extend(site_values(&dopant, &vacancies, &host, &anion));
    Some(Record {
        taskid: task.id,
        values,
    })
}

/// 列名（不含 Energy / Gnorm 以外的固定前缀）
pub fn header(sp: &Species) -> Vec<String> {
    let (d, h, o) = (&sp.dopant, &sp.host, &sp.anion);
    let mut cols: Vec<String> = vec!["Energy".into(), "Gnorm".into()];
    cols.push(format!("d_{}_avg", d));
    cols.push("d_VO_avg".into());
    for q in [25, 50, 75] {
        cols.push(format!("{}_{}", d, q));
    }
    for q in [25, 50, 75] {
        cols.push(format!("VO_{}", q));
    }
    for name in ["VO", h.as_str(), o.as_str(), d.as_str()] {
        cols.push(format!("{}_bulk", name));
        cols.push(format!("{}_surface", name));
    }
    for region in ["bulk", "surface"] {
        cols.push(format!("ratio_VO_{}", region));
        cols.push(format!("ratio_{}_{}", d, region));
    }
    cols.push("ratio_bulk".into());
    cols.push("ratio_surface".into());
    for pair in [
        format!("VO_{}1", d),
        format!("VO_{}2", d),
        "VO_VO".to_string(),
        format!("{}_{}", d, d),
    ] {
        for region in ["bulk", "surface", "total"] {
            cols.push(format!("d_{}_{}", pair, region));
        }
    }
    for prefix in ["n", "n2"] {
        for label in SHELL_LABELS {
            for region in ["bulk", "surface"] {
                cols.push(format!("{}_{}_{}", prefix, label, region));
            }
        }
    }
    for label in PAIR_LABELS {
        for region in ["bulk", "surface"] {
            cols.push(format!("n_{}_{}", label, region));
        }
    }
    for shell in ["1N", "2N", "far"] {
        for region in ["bulk", "surface"] {
            cols.push(format!("n_{}_{}_{}", d, shell, region));
        }
    }
    cols
}

/// 位点表统计，顺序与 [`header`] 中 Energy / Gnorm 之后的列一致
pub fn site_values(
    dopant: &[SiteRecord],
    vacancies: &[SiteRecord],
    host: &[SiteRecord],
    anion: &[SiteRecord],
) -> Vec<Option<f64>> {
    let distances = |rows: &[SiteRecord]| -> Vec<f64> { rows.iter().map(|r| r.distance).collect() };
    let d_dopant = distances(dopant);
    let d_vo = distances(vacancies);

    let mut v = vec![Some(stats::mean(&d_dopant)), Some(stats::mean(&d_vo))];
    for q in [25.0, 50.0, 75.0] {
        v.push(Some(stats::percentile(&d_dopant, q)));
    }
    for q in [25.0, 50.0, 75.0] {
        v.push(Some(stats::percentile(&d_vo, q)));
    }

    let (vo_b, vo_s) = count_kinds(vacancies);
    let (h_b, h_s) = count_kinds(host);
    let (o_b, o_s) = count_kinds(anion);
    let (d_b, d_s) = count_kinds(dopant);
    for c in [vo_b, vo_s, h_b, h_s, o_b, o_s, d_b, d_s] {
        v.push(Some(c as f64));
    }

    let ratio_vo_bulk = stats::safe_ratio(vo_b as f64, (vo_b + o_b) as f64);
    let ratio_d_bulk = stats::safe_ratio(d_b as f64, (d_b + h_b) as f64);
    let ratio_vo_surface = stats::safe_ratio(vo_s as f64, (vo_s + o_s) as f64);
    let ratio_d_surface = stats::safe_ratio(d_s as f64, (d_s + h_s) as f64);
    v.extend([
        Some(ratio_vo_bulk),
        Some(ratio_d_bulk),
        Some(ratio_vo_surface),
        Some(ratio_d_surface),
        Some(stats::safe_ratio(ratio_d_bulk, ratio_vo_bulk) / 2.0),
        Some(stats::safe_ratio(ratio_d_surface, ratio_vo_surface) / 2.0),
    ]);

    for (rows, idx) in [
        (vacancies, VO_D1),
        (vacancies, VO_D2),
        (vacancies, VO_D3),
        (dopant, DOPANT_D4),
    ] {
        v.extend(region_means(rows, idx));
    }

    for idx in [VO_N1, VO_N2] {
        for label in SHELL_LABELS {
            v.extend(label_counts(vacancies, idx, label));
        }
    }
    for label in PAIR_LABELS {
        v.extend(label_counts(vacancies, VO_CLASS, label));
    }
    let dopant_name = dopant.first().map(|r| r.element.clone()).unwrap_or_default();
    for shell in ["1N", "2N", "far"] {
        let label = format!("{}_{}", dopant_name, shell);
        v.extend(label_counts(dopant, DOPANT_CLASS, &label));
    }
    v
}

fn count_kinds(rows: &[SiteRecord]) -> (usize, usize) {
    let bulk = rows.iter().filter(|r| r.is_bulk()).count();
    let surface = rows.iter().filter(|r| r.is_surface()).count();
    (bulk, surface)
}

/// 附加列在体相/表面/全部行上的均值；任一行缺少该列时为 None
fn region_means(rows: &[SiteRecord], idx: usize) -> [Option<f64>; 3] {
    let values: Option<Vec<(f64, &SiteRecord)>> = rows
        .iter()
        .map(|r| r.extra_f64(idx).map(|x| (x, r)))
        .collect();
    let Some(values) = values else {
        return [None; 3];
    };
    let pick = |keep: &dyn Fn(&SiteRecord) -> bool| -> f64 {
        let xs: Vec<f64> = values
            .iter()
            .filter(|(_, r)| keep(r))
            .map(|(x, _)| *x)
            .collect();
        stats::mean(&xs)
    };
    [
        Some(pick(&|r| r.is_bulk())),
        Some(pick(&|r| r.is_surface())),
        Some(pick(&|_| true)),
    ]
}

/// 某分类标签在体相/表面行上的个数；任一行缺少该列时为 None
fn label_counts(rows: &[SiteRecord], idx: usize, label: &str) -> [Option<f64>; 2] {
    if rows.iter().any(|r| r.extra_str(idx).is_none()) {
        return [None; 2];
    }
    let count = |bulk: bool| {
        rows.iter()
            .filter(|r| if bulk { r.is_bulk() } else { r.is_surface() })
            .filter(|r| r.extra_str(idx) == Some(label))
            .count() as f64
    };
    [Some(count(true)), Some(count(false))]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SiteKind;

    fn site(el: &str, d: f64, kind: SiteKind, extra: &[&str]) -> SiteRecord {
        let mut r = SiteRecord::new(el, [0.0; 3], "8").with_kind(kind);
        r.distance = d;
        r.extra = extra.iter().map(|s| s.to_string()).collect();
        r
    }

    fn species() -> Species {
        Species {
            dopant: "La".into(),
            host: "Ce".into(),
            anion: "O".into(),
        }
    }

    #[test]
    fn test_values_match_header() {
        let vo = vec![
            site("O", 5.0, SiteKind::Bulk, &["2.4", "3.9", "2N", "3N", "3.8", "VO_110"]),
            site("O", 15.0, SiteKind::Surface, &["6.0", "7.0", "fN", "fN", "3.8", "VO_110"]),
        ];
        let la = vec![
            site("La", 4.0, SiteKind::Bulk, &["4.2", "La_1N"]),
            site("La", 14.0, SiteKind::Surface, &["4.2", "La_1N"]),
        ];
        let ce = vec![site("Ce", 1.0, SiteKind::Bulk, &[])];
        let o = vec![site("O", 2.0, SiteKind::Bulk, &[]), site("O", 12.0, SiteKind::Surface, &[])];

        let values = site_values(&la, &vo, &ce, &o);
        let h = header(&species());
        assert_eq!(values.len() + 2, h.len());

        let col = |name: &str| values[h.iter().position(|c| c == name).unwrap() - 2];
        assert_eq!(col("d_VO_avg"), Some(10.0));
        assert_eq!(col("La_50"), Some(9.0));
        assert_eq!(col("VO_bulk"), Some(1.0));
        assert_eq!(col("ratio_VO_bulk"), Some(0.5));
        assert_eq!(col("ratio_La_bulk"), Some(0.5));
        assert_eq!(col("ratio_bulk"), Some(0.5));
        assert_eq!(col("d_VO_La1_bulk"), Some(2.4));
        assert_eq!(col("d_VO_La1_total"), Some(4.2));
        assert_eq!(col("n_2N_bulk"), Some(1.0));
        assert_eq!(col("n_fN_surface"), Some(1.0));
        assert_eq!(col("n_VO_110_surface"), Some(1.0));
        assert_eq!(col("n_La_1N_bulk"), Some(1.0));
        assert_eq!(col("n_La_far_bulk"), Some(0.0));
    }

    #[test]
    fn test_unclassified_tables_are_incomplete() {
        let vo = vec![site("O", 5.0, SiteKind::Bulk, &[])];
        let la = vec![site("La", 4.0, SiteKind::Bulk, &[])];
        let values = site_values(&la, &vo, &[], &[]);
        assert!(values.iter().any(Option::is_none));
        // 分母为 0 时比例为 0
        let h = header(&species());
        let idx = h.iter().position(|c| c == "ratio_VO_surface").unwrap() - 2;
        assert_eq!(values[idx], Some(0.0));
    }
}
