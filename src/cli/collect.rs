//! # collect 子命令 CLI 定义
//!
//! 汇总 GULP 计算结果：
//! - `bulk`: Monte-Carlo 体相计算
//! - `nanoparticle`: 纳米颗粒计算（含位点表统计）
//! - `defect`: Mott-Littleton 缺陷计算
//! - `freq`: 频率归档
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/collect/` 相应模块

use super::BatchOpts;
use clap::{Args, Subcommand};
use std::path::PathBuf;

/// collect 主命令参数
#[derive(Args, Debug)]
pub struct CollectArgs {
    #[command(subcommand)]
    pub command: CollectCommands,
}

/// collect 子命令
#[derive(Subcommand, Debug)]
pub enum CollectCommands {
    /// Collect energies, lattice and dielectric data of bulk Monte-Carlo runs
    Bulk(BulkArgs),

    /// Collect energies and site-table statistics of nanoparticle runs
    Nanoparticle(NanoparticleArgs),

    /// Collect defect energies, site potentials and impurity positions
    Defect(DefectArgs),

    /// Archive per-task frequencies of the tasks listed in a summary
    Freq(FreqArgs),
}

/// 汇总输出参数
#[derive(Args, Debug, Clone)]
pub struct SummaryOpts {
    /// GULP output file name inside each task directory
    #[arg(long, default_value = "gulp_klmc.gout")]
    pub gout: String,

    /// Directory for energy_origin.csv, energy_filtered.csv and summary.csv
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Copy summary.csv to <DIR>/E_<root-name>_.csv
    #[arg(long)]
    pub export_dir: Option<PathBuf>,
}

// ─────────────────────────────────────────────────────────────
// bulk
// ─────────────────────────────────────────────────────────────

/// collect bulk 参数
#[derive(Args, Debug)]
pub struct BulkArgs {
    /// Root directory holding A<id> task directories
    pub root: PathBuf,

    #[command(flatten)]
    pub batch: BatchOpts,

    #[command(flatten)]
    pub summary: SummaryOpts,

    /// Species whose site-potential statistics are reported
    #[arg(long, value_delimiter = ',', default_value = "O,La,Ce")]
    pub species: Vec<String>,

    /// Keep only rows with Gnorm below this value in the filtered tables
    #[arg(long, default_value_t = 0.001)]
    pub gnorm_tol: f64,

    /// Drop runs whose output lacks the normal-termination banner
    #[arg(long, default_value_t = false)]
    pub require_finished: bool,

    /// Append Boltzmann Weight / Wi columns at this temperature (K)
    #[arg(long)]
    pub temperature: Option<f64>,
}

// ─────────────────────────────────────────────────────────────
// nanoparticle
// ─────────────────────────────────────────────────────────────

/// collect nanoparticle 参数
#[derive(Args, Debug)]
pub struct NanoparticleArgs {
    /// Root directory holding A<id> task directories
    pub root: PathBuf,

    #[command(flatten)]
    pub batch: BatchOpts,

    #[command(flatten)]
    pub summary: SummaryOpts,

    /// Dopant species (its site table is <dopant>.txt)
    #[arg(long, default_value = "La")]
    pub dopant: String,

    /// Host cation species
    #[arg(long, default_value = "Ce")]
    pub host: String,

    /// Anion species
    #[arg(long, default_value = "O")]
    pub anion: String,

    /// Keep only rows with Gnorm below this value in the filtered tables
    #[arg(long, default_value_t = 0.001)]
    pub gnorm_tol: f64,
}

// ─────────────────────────────────────────────────────────────
// defect
// ─────────────────────────────────────────────────────────────

/// collect defect 参数
#[derive(Args, Debug)]
pub struct DefectArgs {
    /// Root directory holding A<id> task directories
    pub root: PathBuf,

    #[command(flatten)]
    pub batch: BatchOpts,

    #[command(flatten)]
    pub summary: SummaryOpts,

    /// GULP input deck name inside each task directory
    #[arg(long, default_value = "gulp_klmc.gin")]
    pub gin: String,

    /// Species whose region-1 site potentials are reported
    #[arg(long, value_delimiter = ',', default_value = "O,Gd,Ce")]
    pub species: Vec<String>,

    /// Impurity species placed in the defect region
    #[arg(long, default_value = "Gd")]
    pub dopant: String,

    /// Number of impurity lines a complete deck must contain
    #[arg(long, default_value_t = 4)]
    pub impurities: usize,

    /// Keep only rows with defect Gnorm below this value
    #[arg(long, default_value_t = 1e-6)]
    pub gnorm_tol: f64,

    /// Keep only rows whose |max displacement| does not exceed this value (Å)
    #[arg(long, default_value_t = 2.0)]
    pub max_displacement: f64,
}

// ─────────────────────────────────────────────────────────────
// freq
// ─────────────────────────────────────────────────────────────

/// collect freq 参数
#[derive(Args, Debug)]
pub struct FreqArgs {
    /// Summary CSV whose taskid column lists the tasks to archive
    #[arg(long)]
    pub summary: PathBuf,

    /// Root directory holding A<id> task directories
    #[arg(long)]
    pub root: PathBuf,

    /// Frequency file name inside each task directory (one value per line)
    #[arg(long, default_value = "freq.txt")]
    pub freq_file: String,

    /// Task directory prefix
    #[arg(long, default_value = "A")]
    pub prefix: String,

    /// Output archive (taskid,frequency)
    #[arg(short, long, default_value = "freq.csv")]
    pub output: PathBuf,
}
