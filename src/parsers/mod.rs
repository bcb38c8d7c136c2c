//! # 解析器模块
//!
//! 读取 I(q) 散射数据文件。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: table

pub mod table;

use crate::error::{BraggError, Result};
use crate::models::Curve;
use std::path::Path;

/// 读取曲线文件（制表符分隔的 q, I 两列）
pub fn parse_curve_file(path: &Path) -> Result<Curve> {
    if !path.is_file() {
        return Err(BraggError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    table::parse_table_file(path)
}
