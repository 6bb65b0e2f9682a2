//! # analyze 子命令 CLI 定义
//!
//! 分析功能统一入口，包含多个子命令：
//! - `distribution` / `sample` / `radius`: 位点径向分布统计
//! - `ensemble`: 巨正则系综分析
//! - `dos`: 能量态密度
//! - `xrd`: 加权 X 射线衍射图样
//! - `freq-lookup`: 查询频率归档
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/analyze/` 相应模块

use super::BatchOpts;
use clap::{Args, Subcommand};
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────
// Analyze 主命令
// ─────────────────────────────────────────────────────────────

/// analyze 主命令参数
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    #[command(subcommand)]
    pub command: AnalyzeCommands,
}

/// analyze 子命令
#[derive(Subcommand, Debug)]
pub enum AnalyzeCommands {
    /// Histogram site distances to the centre for every task
    Distribution(DistributionArgs),

    /// Sum distributions of the top, middle and last tenth of a summary
    Sample(SampleArgs),

    /// Combine every task's distribution into one wide table
    Radius(RadiusArgs),

    /// Grand-canonical analysis over dopant sizes
    Ensemble(EnsembleArgs),

    /// Smeared energy density of states of one or more CSV files
    Dos(DosArgs),

    /// Boltzmann-weighted powder diffraction of the lowest-energy structures
    Xrd(XrdArgs),

    /// Print the archived frequencies of one task
    FreqLookup(FreqLookupArgs),
}

// ─────────────────────────────────────────────────────────────
// 径向分布
// ─────────────────────────────────────────────────────────────

/// analyze distribution 参数
#[derive(Args, Debug)]
pub struct DistributionArgs {
    /// Root directory holding A<id> task directories
    pub root: PathBuf,

    #[command(flatten)]
    pub batch: BatchOpts,

    /// First bin edge (Å)
    #[arg(long, default_value_t = 0.0)]
    pub bin_start: f64,

    /// Last bin edge (Å)
    #[arg(long, default_value_t = 30.0)]
    pub bin_end: f64,

    /// Bin width (Å)
    #[arg(long, default_value_t = 6.0)]
    pub bin_step: f64,

    /// Site tables whose names start with one of these letters are counted
    #[arg(long, value_delimiter = ',', default_value = "O,V,C,L")]
    pub tables: Vec<String>,
}

/// analyze sample 参数
#[derive(Args, Debug)]
pub struct SampleArgs {
    /// Summary CSV sorted by energy (taskid column)
    pub summary: PathBuf,

    /// Root directory holding A<id> task directories
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Task directory prefix
    #[arg(long, default_value = "A")]
    pub prefix: String,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,
}

/// analyze radius 参数
#[derive(Args, Debug)]
pub struct RadiusArgs {
    /// Root directory holding A<id> task directories
    pub root: PathBuf,

    /// Task directory prefix
    #[arg(long, default_value = "A")]
    pub prefix: String,

    /// Column order of the site tables
    #[arg(long, value_delimiter = ',', default_value = "VO,La,Ce,O")]
    pub species: Vec<String>,

    /// Output table
    #[arg(short, long, default_value = "summary_radius_count.csv")]
    pub output: PathBuf,
}

// ─────────────────────────────────────────────────────────────
// 巨正则系综
// ─────────────────────────────────────────────────────────────

/// analyze ensemble 参数
#[derive(Args, Debug)]
pub struct EnsembleArgs {
    /// Per-size energy CSV; `{}` is replaced by the size
    #[arg(long, default_value = "nconp{}.csv")]
    pub csv_pattern: String,

    /// Per-size frequency archive (taskid,frequency); `{}` is replaced by the size
    #[arg(long)]
    pub freq_pattern: Option<String>,

    /// Largest size n; sizes 0..=n are read and x = s/n
    #[arg(short, long, default_value_t = 24)]
    pub sizes: usize,

    /// Temperature (K)
    #[arg(short, long, default_value_t = 300.0)]
    pub temperature: f64,

    /// Include zero-point energies (requires --freq-pattern)
    #[arg(long, default_value_t = false)]
    pub vib: bool,

    /// Keep at most this many structures per size
    #[arg(long, default_value_t = 10000)]
    pub max_samples: usize,

    /// Structures with any frequency below this are dropped (cm-1)
    #[arg(long, default_value_t = -0.5, allow_hyphen_values = true)]
    pub imaginary_cutoff: f64,

    /// Leading frequencies discarded as translations
    #[arg(long, default_value_t = 3)]
    pub skip_modes: usize,

    /// Host cell energy E_host (eV)
    #[arg(long, default_value_t = -534.25669638 * 6.0, allow_hyphen_values = true)]
    pub host_energy: f64,

    /// Ionisation energy per inserted ion (eV)
    #[arg(long, default_value_t = 5.39171, allow_hyphen_values = true)]
    pub ionisation: f64,

    /// Reduction energy per inserted ion (eV)
    #[arg(long, default_value_t = -51.2, allow_hyphen_values = true)]
    pub reduction: f64,

    /// Empirical correction per inserted ion (eV)
    #[arg(long, default_value_t = 1.651 + 5.74, allow_hyphen_values = true)]
    pub correction: f64,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,
}

// ─────────────────────────────────────────────────────────────
// DOS
// ─────────────────────────────────────────────────────────────

/// analyze dos 参数
#[derive(Args, Debug)]
pub struct DosArgs {
    /// Input CSV files, stacked bottom to top
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Energy column
    #[arg(long, default_value = "E")]
    pub column: String,

    /// Energies are divided by this value
    #[arg(long, default_value_t = 180.0)]
    pub scale: f64,

    /// Values above this percentile are removed
    #[arg(long, default_value_t = 99.99)]
    pub percentile: f64,

    /// Number of grid steps
    #[arg(long, default_value_t = 500)]
    pub bins: usize,

    /// Gaussian width (scaled energy units)
    #[arg(long, default_value_t = 1e-4)]
    pub sigma: f64,

    /// Vertical offset between stacked curves
    #[arg(long, default_value_t = 1.5)]
    pub offset: f64,

    /// Output plot (.png or .svg)
    #[arg(short, long, default_value = "dos.png")]
    pub output: PathBuf,

    /// Output CSV of the curves
    #[arg(long, default_value = "dos.csv")]
    pub csv: PathBuf,

    /// Figure width in pixels
    #[arg(long, default_value_t = 800)]
    pub width: u32,

    /// Figure height in pixels
    #[arg(long, default_value_t = 1000)]
    pub height: u32,
}

// ─────────────────────────────────────────────────────────────
// XRD
// ─────────────────────────────────────────────────────────────

/// analyze xrd 参数
#[derive(Args, Debug)]
pub struct XrdArgs {
    /// Summary CSV with energy and taskid columns
    pub summary: PathBuf,

    /// Root directory holding A<id> task directories
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    #[command(flatten)]
    pub batch: BatchOpts,

    /// Number of lowest-energy structures
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Energy column
    #[arg(long, default_value = "energy")]
    pub energy_column: String,

    /// Restart file name inside each task directory
    #[arg(long, default_value = "gulp.res")]
    pub restart: String,

    /// X-ray wavelength (Å)
    #[arg(short, long, default_value_t = crate::xrd::DEFAULT_WAVELENGTH)]
    pub wavelength: f64,

    /// Temperature for Boltzmann weights when the summary has no Weight column (K)
    #[arg(short, long, default_value_t = 300.0)]
    pub temperature: f64,

    /// Lower end of the 2θ range (degrees)
    #[arg(long, default_value_t = 0.0)]
    pub two_theta_min: f64,

    /// Upper end of the 2θ range (degrees)
    #[arg(long, default_value_t = 120.0)]
    pub two_theta_max: f64,

    /// Gaussian FWHM (degrees 2θ)
    #[arg(long, default_value_t = 0.1)]
    pub fwhm: f64,

    /// Grid step (degrees 2θ)
    #[arg(long, default_value_t = 0.02)]
    pub step: f64,

    /// Also write powder.csv into every task directory
    #[arg(long, default_value_t = false)]
    pub powder: bool,

    /// Output table
    #[arg(long, default_value = "xrd_weighted.csv")]
    pub csv: PathBuf,

    /// Output plot (.png or .svg)
    #[arg(short, long, default_value = "xrd.png")]
    pub output: PathBuf,

    /// Skip plot generation
    #[arg(long, default_value_t = false)]
    pub no_plot: bool,

    /// Figure width in pixels
    #[arg(long, default_value_t = 1200)]
    pub width: u32,

    /// Figure height in pixels
    #[arg(long, default_value_t = 600)]
    pub height: u32,
}

// ─────────────────────────────────────────────────────────────
// 频率归档查询
// ─────────────────────────────────────────────────────────────

/// analyze freq-lookup 参数
#[derive(Args, Debug)]
pub struct FreqLookupArgs {
    /// Frequency archive (taskid,frequency)
    pub archive: PathBuf,

    /// Task id (with or without the A prefix)
    pub taskid: String,
}
