//! # sites refine 实现
//!
//! 修正不合理的空位位置：
//! 1. 空位附近有过近的晶格氧时，与 `O.txt` 中最空旷的候选位点交换记录
//! 2. 在 ±box 范围内移动每个空位，使其离阳离子/氧的距离最合理
//!
//! 覆盖写回 `VO.txt` 与 `O.txt`。
//!
//! ## 依赖关系
//! - 使用 `parsers/restart.rs` 读取优化后的核坐标
//! - 使用 `geometry/neighbors.rs`, `geometry/optimize.rs`

use super::report;
use crate::batch::{BatchRunner, ProcessResult, TaskDir, TaskDirs};
use crate::cli::sites::RefineArgs;
use crate::error::Result;
use crate::geometry::neighbors::within;
use crate::geometry::optimize::{box_around, BoxMaximizer};
use crate::geometry::{count_within, k_nearest, nearest_distance, PointSet};
use crate::models::SiteRecord;
use crate::parsers::{restart, site_table};
use crate::utils::{fsio, output, stats};

/// 近邻个数
const NEIGHBOURS: usize = 6;
/// 判断过近时检查的最近晶格氧个数
const CLOSE_OXYGENS: usize = 5;
/// 阳离子配位数为该值时只优化平均阳离子距离
const FULL_CATION_SHELL: usize = 4;

/// 优化参数
#[derive(Debug, Clone)]
pub struct RefineParams {
    pub min_distance: f64,
    pub shell: f64,
    pub swap_radius: f64,
    pub box_half_width: f64,
    pub target: f64,
}

impl From<&RefineArgs> for RefineParams {
    fn from(a: &RefineArgs) -> Self {
        Self {
            min_distance: a.min_distance,
            shell: a.shell,
            swap_radius: a.swap_radius,
            box_half_width: a.box_half_width,
            target: a.target,
        }
    }
}

/// 执行 sites refine
pub fn execute(args: RefineArgs) -> Result<()> {
    output::print_header("Refining Vacancy Positions");

    let tasks = TaskDirs::new(&args.root)
        .with_prefix(&args.batch.prefix)
        .collect_non_empty()?;
    let params = RefineParams::from(&args);
    let runner = BatchRunner::new(args.batch.jobs);

    let result = runner.run(&tasks, "Refining", |task| {
        for name in ["gulp.res", "VO.txt", "O.txt"] {
            if !task.file(name).is_file() {
                return ProcessResult::Skipped(format!("{}: {} not found", task.name, name));
            }
        }
        match refine_task(task, &args, &params) {
            Ok(swaps) => ProcessResult::Success(format!("{}: {} swaps", task.name, swaps)),
            Err(e) => ProcessResult::Failed(task.name.clone(), e.to_string()),
        }
    })?;

    report(&result, "Refined");
    Ok(())
}

fn refine_task(task: &TaskDir, args: &RefineArgs, params: &RefineParams) -> Result<usize> {
    let res = fsio::read_text(&task.file("gulp.res"))?;
    let cores = restart::parse_cartesian_cores(&res);
    let oxygens: PointSet = cores
        .iter()
        .filter(|c| c.element == args.anion)
        .map(|c| c.position)
        .collect();
    let cations: PointSet = cores
        .iter()
        .filter(|c| args.cations.contains(&c.element))
        .map(|c| c.position)
        .collect();

    let read = |name: &str| -> Result<Vec<SiteRecord>> {
        Ok(site_table::read_site_table(&task.file(name))?
            .into_iter()
            .filter(|r| r.element == args.anion)
            .collect())
    };
    let mut vacancies = read("VO.txt")?;
    let mut lattice = read("O.txt")?;

    let swaps = swap_implausible(&mut vacancies, &mut lattice, &oxygens, params);
    for vo in vacancies.iter_mut() {
        vo.position = optimise_position(&vo.position, &cations, &oxygens, params);
    }

    site_table::write_site_table(&task.file("VO.txt"), &vacancies)?;
    site_table::write_site_table(&task.file("O.txt"), &lattice)?;
    Ok(swaps)
}

/// 空位的最近几个晶格氧（在 shell 内）中有距离小于下限的即不合理
pub fn is_implausible(position: &[f64; 3], oxygens: &[[f64; 3]], params: &RefineParams) -> bool {
    within(position, oxygens, params.shell)
        .iter()
        .take(CLOSE_OXYGENS)
        .any(|(_, d)| *d < params.min_distance)
}

/// 与 swap_radius 内离最近晶格氧最远的 `O.txt` 记录交换；返回交换次数
pub fn swap_implausible(
    vacancies: &mut [SiteRecord],
    lattice: &mut [SiteRecord],
    oxygens: &[[f64; 3]],
    params: &RefineParams,
) -> usize {
    let candidates: PointSet = lattice.iter().map(|r| r.position).collect();

    let swaps: Vec<(usize, usize)> = vacancies
        .iter()
        .enumerate()
        .filter(|(_, vo)| is_implausible(&vo.position, oxygens, params))
        .filter_map(|(i, vo)| {
            within(&vo.position, &candidates, params.swap_radius)
                .into_iter()
                .map(|(j, _)| (j, nearest_distance(&candidates[j], oxygens)))
                .max_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(j, _)| (i, j))
        })
        .collect();

    for &(i, j) in &swaps {
        swap_core_fields(&mut vacancies[i], &mut lattice[j]);
    }
    swaps.len()
}

/// 交换前七列，附加列保持不动
fn swap_core_fields(a: &mut SiteRecord, b: &mut SiteRecord) {
    std::mem::swap(&mut a.element, &mut b.element);
    std::mem::swap(&mut a.position, &mut b.position);
    std::mem::swap(&mut a.distance, &mut b.distance);
    std::mem::swap(&mut a.cn, &mut b.cn);
    std::mem::swap(&mut a.kind, &mut b.kind);
}

/// 空位位置的得分
///
/// 阳离子满配位时为最近六个阳离子的平均距离，否则为
/// `max(六个最近氧距离) - |平均阳离子距离 - target|`。
pub fn site_score(
    p: &[f64; 3],
    full_shell: bool,
    cations: &[[f64; 3]],
    oxygens: &[[f64; 3]],
    target: f64,
) -> f64 {
    let cation_mean = stats::mean(&k_nearest(p, cations, NEIGHBOURS));
    if full_shell {
        return cation_mean;
    }
    let o_max = k_nearest(p, oxygens, NEIGHBOURS)
        .into_iter()
        .fold(f64::NEG_INFINITY, f64::max);
    o_max - (cation_mean - target).abs()
}

/// 在起点周围的盒子内最大化得分
pub fn optimise_position(
    start: &[f64; 3],
    cations: &[[f64; 3]],
    oxygens: &[[f64; 3]],
    params: &RefineParams,
) -> [f64; 3] {
    let full_shell = count_within(start, cations, params.shell) == FULL_CATION_SHELL;
    let (lower, upper) = box_around(start, params.box_half_width);
    let score = |p: &[f64; 3]| site_score(p, full_shell, cations, oxygens, params.target);

    let (best, value) = BoxMaximizer::default().maximize(score, *start, lower, upper);
    if value.is_finite() {
        best
    } else {
        *start
    }
}
