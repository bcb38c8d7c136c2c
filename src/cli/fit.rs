//! # fit 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/fit.rs`

use clap::Args;
use std::path::PathBuf;

/// fit 子命令参数
#[derive(Args, Debug)]
pub struct FitArgs {
    /// Tab-separated input file with q in the first column and I(q) in the second
    pub input: PathBuf,

    /// Approximate peak center in 1/Å (the nearest sample is used)
    #[arg(short, long)]
    pub center: f64,

    /// Fit window half-width (samples)
    #[arg(short = 'w', long, default_value_t = 7)]
    pub half_width: usize,

    /// Render the diagnostic fit plot
    #[arg(short, long)]
    pub plot: Option<PathBuf>,

    /// Write the plot as SVG instead of PNG
    #[arg(long, default_value_t = false)]
    pub svg: bool,

    /// Figure width in pixels (for PNG) or points (for SVG)
    #[arg(long, default_value_t = 1200)]
    pub width: u32,

    /// Figure height in pixels (for PNG) or points (for SVG)
    #[arg(long, default_value_t = 800)]
    pub height: u32,
}
