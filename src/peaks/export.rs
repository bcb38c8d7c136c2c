//! # 峰位导出
//!
//! 导出最终峰位到 CSV 和 XY 格式。
//!
//! ## 支持格式
//! - CSV: `q,d_spacing` 两列
//! - XY: `#` 开头的注释头 + 每行一个 q
//!
//! ## 依赖关系
//! - 被 `commands/find.rs` 调用
//! - 使用 `models/peak.rs` 的 PeakSet
//! - 使用 `csv` 库写入 CSV 文件

use crate::error::{BraggError, Result};
use crate::models::PeakSet;

use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// 导出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xy,
}

impl ExportFormat {
    /// 按扩展名推断：`.csv` 为 CSV，其余均为 XY
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => ExportFormat::Csv,
            _ => ExportFormat::Xy,
        }
    }
}

/// CSV 中的一行
#[derive(Debug, Serialize)]
struct PeakRecord {
    q: String,
    d_spacing: String,
}

/// 按扩展名选择格式并导出
pub fn export_peaks(peaks: &PeakSet, source_name: &str, output_path: &Path) -> Result<()> {
    match ExportFormat::from_path(output_path) {
        ExportFormat::Csv => to_csv(peaks, output_path),
        ExportFormat::Xy => to_xy(peaks, source_name, output_path),
    }
}

/// 导出峰位为 CSV 格式
pub fn to_csv(peaks: &PeakSet, output_path: &Path) -> Result<()> {
    // 表头单独写入，空峰集也保留表头
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(output_path)?;

    wtr.write_record(["q", "d_spacing"])?;
    for (q, d) in peaks.iter().zip(peaks.d_spacings()) {
        wtr.serialize(PeakRecord {
            q: format!("{:.6}", q),
            d_spacing: format!("{:.6}", d),
        })?;
    }

    wtr.flush().map_err(|e| BraggError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// 导出峰位为 XY 格式
pub fn to_xy(peaks: &PeakSet, source_name: &str, output_path: &Path) -> Result<()> {
    let write_err = |e| BraggError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    };

    let file = File::create(output_path).map_err(write_err)?;
    let mut out = BufWriter::new(file);

    writeln!(out, "# Bragg peaks: {}", source_name).map_err(write_err)?;
    writeln!(out, "# Peaks found: {}", peaks.len()).map_err(write_err)?;
    writeln!(out, "# Columns: q (1/Angstrom)").map_err(write_err)?;
    writeln!(out, "#").map_err(write_err)?;

    for q in peaks {
        writeln!(out, "{:.6}", q).map_err(write_err)?;
    }

    out.flush().map_err(write_err)?;
    Ok(())
}
