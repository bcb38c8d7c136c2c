//! # find 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/find.rs`

use clap::Args;
use std::path::PathBuf;

/// find 子命令参数
#[derive(Args, Debug)]
pub struct FindArgs {
    /// Tab-separated input file with q in the first column and I(q) in the second
    pub input: PathBuf,

    /// Lower q limit (exclusive), in 1/Å
    #[arg(long, allow_hyphen_values = true)]
    pub lo: f64,

    /// Upper q limit (exclusive), in 1/Å
    #[arg(long, allow_hyphen_values = true)]
    pub hi: f64,

    /// Wavelet search sensitivity: widths 1..sensitivity are scanned (smaller is more sensitive)
    #[arg(short, long, default_value_t = 8.0)]
    pub sensitivity: f64,

    /// Render an overview plot (log intensity vs q with peak markers)
    #[arg(short, long)]
    pub plot: Option<PathBuf>,

    /// Write plots as SVG instead of PNG
    #[arg(long, default_value_t = false)]
    pub svg: bool,

    /// Figure width in pixels (for PNG) or points (for SVG)
    #[arg(long, default_value_t = 1200)]
    pub width: u32,

    /// Figure height in pixels (for PNG) or points (for SVG)
    #[arg(long, default_value_t = 800)]
    pub height: u32,

    /// Title for the plot (default: input file name)
    #[arg(long)]
    pub title: Option<String>,

    /// Export peak positions (.csv -> q,d_spacing; anything else -> XY text)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Fail on the first fit that does not converge or whose center leaves its window
    #[arg(long, default_value_t = false)]
    pub strict: bool,

    /// Fitted centers closer than this are merged (1/Å)
    #[arg(long, default_value_t = 0.01)]
    pub tolerance: f64,

    /// Smallest fit window half-width (samples)
    #[arg(long, default_value_t = 3)]
    pub min_half_width: usize,

    /// Largest fit window half-width (samples)
    #[arg(long, default_value_t = 9)]
    pub max_half_width: usize,

    /// Number of parallel jobs (0 = auto)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,

    /// Render a diagnostic plot for every individual fit into this directory
    #[arg(long)]
    pub debug_fits: Option<PathBuf>,
}
