//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `find`: 在 I(q) 曲线中查找 Bragg 峰
//! - `fit`: 对单个峰做诊断拟合
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: find, fit

pub mod find;
pub mod fit;

use clap::{Parser, Subcommand};

/// braggpeaks - 一维散射曲线的 Bragg 峰查找工具
#[derive(Parser)]
#[command(name = "braggpeaks")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "Locate Bragg peaks in 1D I(q) scattering curves", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Find Bragg peaks in a tab-separated (q, I) file
    Find(find::FindArgs),

    /// Fit a single peak and print a detailed fit report
    Fit(fit::FitArgs),
}
