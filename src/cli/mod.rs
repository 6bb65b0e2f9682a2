//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `collect`: 汇总 GULP 计算结果（bulk / nanoparticle / defect / freq）
//! - `check`: 检查任务状态（restart / errors / freq / displacement / empty）
//! - `prepare`: 生成与修改输入文件（restart / fix-gin / combinations / launch）
//! - `sites`: 空位与位点表维护（missing / locate / refine / update / classify / coord）
//! - `analyze`: 统计、热力学与绘图（distribution / sample / radius / ensemble / dos / xrd / freq-lookup）
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: collect, check, prepare, sites, analyze

pub mod analyze;
pub mod check;
pub mod collect;
pub mod prepare;
pub mod sites;

use clap::{Args, Parser, Subcommand};

/// gulpkit - GULP 缺陷计算批处理工具箱
#[derive(Parser)]
#[command(name = "gulpkit")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "Batch post-processing toolkit for GULP defect and vacancy studies", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Aggregate GULP results of many task directories into CSV tables
    Collect(collect::CollectArgs),

    /// Inspect task directories for errors, restarts and unstable runs
    Check(check::CheckArgs),

    /// Build and edit GULP input decks
    Prepare(prepare::PrepareArgs),

    /// Maintain vacancy and site tables of nanoparticle runs
    Sites(sites::SitesArgs),

    /// Statistics, ensemble thermodynamics and plots
    Analyze(analyze::AnalyzeArgs),
}

// ─────────────────────────────────────────────────────────────
// 公共参数
// ─────────────────────────────────────────────────────────────

/// 批处理公共参数
#[derive(Args, Debug, Clone)]
pub struct BatchOpts {
    /// Number of parallel jobs (0 = all cores)
    #[arg(short, long, default_value_t = 0, env = "GULPKIT_JOBS")]
    pub jobs: usize,

    /// Task directory prefix (task directories are <prefix><id>)
    #[arg(long, default_value = "A")]
    pub prefix: String,
}

/// 解析 `x,y,z` 形式的坐标
pub fn parse_point(input: &str) -> Result<[f64; 3], String> {
    let values: Vec<f64> = input
        .split(',')
        .map(|s| s.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|_| format!("'{}' is not a point of the form x,y,z", input))?;
    match values.as_slice() {
        [x, y, z] => Ok([*x, *y, *z]),
        _ => Err(format!("'{}' must have exactly three components", input)),
    }
}

/// 解析 `FROM=TO` 形式的文本替换
pub fn parse_replacement(input: &str) -> Result<(String, String), String> {
    crate::parsers::gin::parse_replacement(input)
}

/// 解析闭区间 `a-b`（a <= b）
pub fn parse_span(input: &str) -> Result<(usize, usize), String> {
    let err = || format!("'{}' is not a range of the form a-b", input);
    let (a, b) = input.split_once('-').ok_or_else(err)?;
    let a: usize = a.trim().parse().map_err(|_| err())?;
    let b: usize = b.trim().parse().map_err(|_| err())?;
    if b < a {
        return Err(format!("range '{}' is reversed", input));
    }
    Ok((a, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_point() {
        assert_eq!(
            parse_point("-24.261094, 24.290531,-24.284251").unwrap(),
            [-24.261094, 24.290531, -24.284251]
        );
        assert!(parse_point("1,2").is_err());
        assert!(parse_point("1,a,3").is_err());
    }

    #[test]
    fn test_parse_span() {
        assert_eq!(parse_span("22-43").unwrap(), (22, 43));
        assert!(parse_span("43-22").is_err());
        assert!(parse_span("22").is_err());
    }

    #[test]
    fn test_defaults_parse() {
        let cli = Cli::try_parse_from(["gulpkit", "collect", "bulk", "runs"]).unwrap();
        match cli.command {
            Commands::Collect(args) => match args.command {
                collect::CollectCommands::Bulk(b) => {
                    assert_eq!(b.species, vec!["O", "La", "Ce"]);
                    assert_eq!(b.gnorm_tol, 0.001);
                }
                _ => panic!("wrong subcommand"),
            },
            _ => panic!("wrong command"),
        }

        let cli = Cli::try_parse_from(["gulpkit", "check", "freq", "runs"]).unwrap();
        match cli.command {
            Commands::Check(args) => match args.command {
                check::CheckCommands::Freq(f) => {
                    assert_eq!(
                        f.replace,
                        vec![("# switch rfo 0.001".to_string(), "switch rfo 0.01".to_string())]
                    );
                }
                _ => panic!("wrong subcommand"),
            },
            _ => panic!("wrong command"),
        }
    }
}
