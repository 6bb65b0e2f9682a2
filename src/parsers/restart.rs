//! # GULP 重启文件 (gulp.res) 解析器
//!
//! ## 功能
//! - 截取可复用为新输入的头部（`totalenergy` / `species` 之前）
//! - 提取 `totalenergy` 行
//! - 读取 `cartesian` 段的核坐标（支持 `1/2` 形式的分数）
//! - 构造带晶胞的 `Crystal` 用于 XRD 计算
//!
//! ## 依赖关系
//! - 被 `commands/prepare.rs`, `commands/check.rs`, `commands/sites/`,
//!   `commands/analyze/xrd.rs` 使用
//! - 使用 `models/structure.rs`

use crate::error::{GulpkitError, Result};
use crate::models::{Atom, Crystal, Lattice};
use crate::utils::fsio;

use std::path::Path;

/// `cartesian` 段中的一个核
#[derive(Debug, Clone, PartialEq)]
pub struct CoreSite {
    pub element: String,
    pub position: [f64; 3],
}

/// 截取 `totalenergy` 之前的内容；没有时截取 `species` 之前；都没有则返回全文
pub fn truncate_for_input(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let cut = lines
        .iter()
        .position(|l| l.contains("totalenergy"))
        .or_else(|| lines.iter().position(|l| l.contains("species")))
        .unwrap_or(lines.len());

    let mut out = lines[..cut].join("\n");
    if cut > 0 {
        out.push('\n');
    }
    out
}

/// 第一条 `totalenergy` 行（去除首尾空白）
pub fn total_energy_line(text: &str) -> Option<String> {
    text.lines()
        .find(|l| l.contains("totalenergy"))
        .map(|l| l.trim().to_string())
}

/// 解析 `p/q` 形式的分数或普通浮点数
pub fn parse_coordinate(token: &str) -> Option<f64> {
    match token.split_once('/') {
        Some((num, den)) => {
            let (num, den): (f64, f64) = (num.parse().ok()?, den.parse().ok()?);
            (den != 0.0).then(|| num / den)
        }
        None => token.parse().ok(),
    }
}

/// 读取 `cartesian` 之后的核坐标；壳层行跳过，遇到其他行停止
pub fn parse_cartesian_cores(text: &str) -> Vec<CoreSite> {
    parse_core_block(text, "cartesian")
}

fn parse_core_block(text: &str, keyword: &str) -> Vec<CoreSite> {
    let mut cores = Vec::new();
    let mut lines = text
        .lines()
        .skip_while(|l| !l.trim_start().starts_with(keyword));
    if lines.next().is_none() {
        return cores;
    }

    for line in lines {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 5 {
            break;
        }
        match tokens[1] {
            "core" => {}
            "shel" => continue,
            _ => break,
        }
        let coords: Option<Vec<f64>> = tokens[2..5].iter().map(|t| parse_coordinate(t)).collect();
        match coords {
            Some(c) => cores.push(CoreSite {
                element: tokens[0].to_string(),
                position: [c[0], c[1], c[2]],
            }),
            None => break,
        }
    }

    cores
}

/// 解析晶胞行：`cell` 关键字的同一行或下一行中的 6 个数
fn parse_cell(text: &str) -> Option<[f64; 6]> {
    let lines: Vec<&str> = text.lines().collect();
    let idx = lines.iter().position(|l| {
        l.split_whitespace()
            .next()
            .map(|w| w == "cell")
            .unwrap_or(false)
    })?;

    let mut candidates = vec![lines[idx]];
    if let Some(next) = lines.get(idx + 1) {
        candidates.push(next);
    }
    candidates.into_iter().find_map(|l| {
        let nums: Vec<f64> = l
            .split_whitespace()
            .filter_map(|t| t.parse::<f64>().ok())
            .collect();
        (nums.len() >= 6).then(|| [nums[0], nums[1], nums[2], nums[3], nums[4], nums[5]])
    })
}

/// 从重启文件文本构造晶体结构（分数或笛卡尔坐标）
pub fn parse_crystal(text: &str, name: &str, path: &Path) -> Result<Crystal> {
    let [a, b, c, alpha, beta, gamma] =
        parse_cell(text).ok_or_else(|| GulpkitError::parse("gulp.res", path, "missing cell"))?;
    let lattice = Lattice::from_parameters(a, b, c, alpha, beta, gamma);

    let fractional = parse_core_block(text, "fractional");
    let atoms: Vec<Atom> = if !fractional.is_empty() {
        fractional
            .into_iter()
            .map(|s| Atom::new(s.element, s.position))
            .collect()
    } else {
        parse_cartesian_cores(text)
            .into_iter()
            .filter_map(|s| {
                lattice
                    .cart_to_frac(&s.position)
                    .map(|f| Atom::new(s.element, f))
            })
            .collect()
    };

    if atoms.is_empty() {
        return Err(GulpkitError::parse(
            "gulp.res",
            path,
            "no core coordinates",
        ));
    }

    let mut crystal = Crystal::new(name, lattice, atoms);
    crystal.energy = total_energy_line(text).and_then(|l| {
        l.split_whitespace()
            .nth(1)
            .and_then(|t| t.parse::<f64>().ok())
    });
    Ok(crystal)
}

/// 读取重启文件并构造晶体结构
pub fn parse_restart_crystal(path: &Path, name: &str) -> Result<Crystal> {
    let text = fsio::read_text(path)?;
    parse_crystal(&text, name, path)
}
