//! # 统一错误处理模块
//!
//! 定义 braggpeaks 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// braggpeaks 统一错误类型
#[derive(Error, Debug)]
pub enum BraggError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 输入数据错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse data file: {path} (line {line})\nReason: {reason}")]
    ParseError {
        path: String,
        line: u64,
        reason: String,
    },

    #[error("Data file contains no samples: {path}")]
    EmptyCurve { path: String },

    // ─────────────────────────────────────────────────────────────
    // 拟合错误
    // ─────────────────────────────────────────────────────────────
    #[error(
        "Fit window out of bounds: index {index} with half-width {half_width} exceeds curve of {len} samples"
    )]
    WindowOutOfBounds {
        index: usize,
        half_width: usize,
        len: usize,
    },

    #[error("Fit did not converge (q = {center:.5}, half-width {half_width}): {reason}")]
    FitDidNotConverge {
        center: f64,
        half_width: usize,
        reason: String,
    },

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    // ─────────────────────────────────────────────────────────────
    // CSV / 绘图错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Plot rendering failed: {0}")]
    PlotError(String),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, BraggError>;
