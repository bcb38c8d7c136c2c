//! # braggpeaks - 一维散射曲线 Bragg 峰查找工具
//!
//! 从制表符分隔的 (q, I) 数据中定位 Bragg 峰：小波粗搜索候选峰，
//! 在候选峰附近用 pseudo-Voigt + 线性背景逐窗口拟合，最后合并重复峰位。
//!
//! ## 子命令
//! - `find` - 查找全部峰位，可选导出与绘图
//! - `fit`  - 单峰诊断拟合
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── parsers/   (数据文件读取)
//!   │     ├── peaks/     (检测、拟合、去重、绘图、导出)
//!   │     ├── math/      (数值内核)
//!   │     └── models/    (数据模型)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod cli;
mod commands;
mod error;
mod math;
mod models;
mod parsers;
mod peaks;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
