//! # sites 子命令 CLI 定义
//!
//! 纳米颗粒空位定位、位点表刷新与分类。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/sites/` 相应模块

use super::{parse_point, BatchOpts};
use clap::{Args, Subcommand};
use std::path::PathBuf;

/// sites 主命令参数
#[derive(Args, Debug)]
pub struct SitesArgs {
    #[command(subcommand)]
    pub command: SitesCommands,
}

/// sites 子命令
#[derive(Subcommand, Debug)]
pub enum SitesCommands {
    /// Write the fixed sites of a master deck missing from each A*.gin
    Missing(MissingArgs),

    /// Locate vacancies against a master deck and write site tables
    Locate(LocateArgs),

    /// Move implausible vacancies to better oxygen sites
    Refine(RefineArgs),

    /// Refresh site-table coordinates from optimised gulp.res cores
    Update(UpdateArgs),

    /// Append vacancy/dopant distance classifications to site tables
    Classify(ClassifyArgs),

    /// Classify atoms of an XYZ file as bulk or surface by coordination
    Coord(CoordArgs),
}

/// sites missing 参数
#[derive(Args, Debug)]
pub struct MissingArgs {
    /// Directory holding A*.gin decks
    pub dir: PathBuf,

    /// Master deck with every site flagged
    #[arg(long)]
    pub master: PathBuf,

    /// Output table (<stem> x y z)
    #[arg(short, long, default_value = "VO_position.txt")]
    pub output: PathBuf,
}

/// sites locate 参数
#[derive(Args, Debug)]
pub struct LocateArgs {
    /// Master deck listing every site with CN and type
    #[arg(long)]
    pub master: PathBuf,

    /// Directory holding the A<id> task directories to inspect
    #[arg(long)]
    pub input_base: PathBuf,

    /// Directory receiving per-task site tables
    #[arg(long)]
    pub output_base: PathBuf,

    #[command(flatten)]
    pub batch: BatchOpts,

    /// Nanoparticle centre used for the D column
    #[arg(long, value_parser = parse_point, default_value = "-24.261094,24.290531,-24.284251", allow_hyphen_values = true)]
    pub center: [f64; 3],

    /// Species written to <species>.txt tables
    #[arg(long, value_delimiter = ',', default_value = "O,La,Ce")]
    pub species: Vec<String>,

    /// Oxygen species whose missing sites are vacancies
    #[arg(long, default_value = "O")]
    pub anion: String,

    /// Deck name inside each task directory
    #[arg(long, default_value = "gulp_klmc.gin")]
    pub gin: String,
}

/// sites refine 参数
#[derive(Args, Debug)]
pub struct RefineArgs {
    /// Root directory holding A<id> task directories
    pub root: PathBuf,

    #[command(flatten)]
    pub batch: BatchOpts,

    /// Cation species
    #[arg(long, value_delimiter = ',', default_value = "La,Ce")]
    pub cations: Vec<String>,

    /// Oxygen species
    #[arg(long, default_value = "O")]
    pub anion: String,

    /// A vacancy closer than this to a lattice oxygen is implausible (Å)
    #[arg(long, default_value_t = 2.0)]
    pub min_distance: f64,

    /// Neighbour shell searched for close lattice oxygens and cations (Å)
    #[arg(long, default_value_t = 3.3)]
    pub shell: f64,

    /// Radius searched for a replacement oxygen site (Å)
    #[arg(long, default_value_t = 3.55)]
    pub swap_radius: f64,

    /// Half width of the box a vacancy may move in (Å)
    #[arg(long, default_value_t = 1.0)]
    pub box_half_width: f64,

    /// Preferred mean vacancy-cation distance (Å)
    #[arg(long, default_value_t = 2.4)]
    pub target: f64,
}

/// sites update 参数
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Root directory holding A<id> task directories
    pub root: PathBuf,

    #[command(flatten)]
    pub batch: BatchOpts,

    /// Nanoparticle centre used for the D column
    #[arg(long, value_parser = parse_point, default_value = "-24.286268,24.268838,-24.273662", allow_hyphen_values = true)]
    pub center: [f64; 3],

    /// Species whose tables are refreshed
    #[arg(long, value_delimiter = ',', default_value = "La,Ce,O")]
    pub species: Vec<String>,
}

/// sites classify 参数
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Root directory holding A<id> task directories
    pub root: PathBuf,

    #[command(flatten)]
    pub batch: BatchOpts,

    /// Dopant species (its table is <dopant>.txt)
    #[arg(long, default_value = "La")]
    pub dopant: String,
}

/// sites coord 参数
#[derive(Args, Debug)]
pub struct CoordArgs {
    /// Input XYZ file
    pub input: PathBuf,

    /// Output XYZ file with CN and class columns
    pub output: PathBuf,

    /// Cation-anion bond cutoff (Å)
    #[arg(long, default_value_t = 2.7)]
    pub cutoff: f64,

    /// Cation species
    #[arg(long, default_value = "Ce")]
    pub cation: String,

    /// Anion species
    #[arg(long, default_value = "O")]
    pub anion: String,

    /// Bulk coordination number of the cation
    #[arg(long, default_value_t = 8)]
    pub cation_cn: usize,

    /// Bulk coordination number of the anion
    #[arg(long, default_value_t = 4)]
    pub anion_cn: usize,
}
