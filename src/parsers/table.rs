//! # 制表符分隔数据表解析器
//!
//! 解析 q 在第 0 列、I(q) 在第 1 列的纯文本数据表。
//!
//! ## 格式约定
//! - 制表符分隔，无表头，按位置读取
//! - 以 `#` 开头的行视为注释
//! - 多余的列被忽略；少于两列、非数值单元格均视为错误
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 调用
//! - 使用 `csv` 库读取记录
//! - 生成 `models/curve.rs` 的 Curve

use crate::error::{BraggError, Result};
use crate::models::Curve;

use std::fs;
use std::io::Read;
use std::path::Path;

/// 解析数据表文件
pub fn parse_table_file(path: &Path) -> Result<Curve> {
    let content = fs::read_to_string(path).map_err(|e| BraggError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_table_content(content.as_bytes(), &path.display().to_string())
}

/// 从任意读取器解析数据表
pub fn parse_table_content<R: Read>(reader: R, source_name: &str) -> Result<Curve> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut q = Vec::new();
    let mut intensity = Vec::new();

    for record in rdr.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        // 跳过空行
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }

        if record.len() < 2 {
            return Err(BraggError::ParseError {
                path: source_name.to_string(),
                line,
                reason: format!("expected 2 tab-separated columns, found {}", record.len()),
            });
        }

        q.push(parse_cell(&record[0], source_name, line)?);
        intensity.push(parse_cell(&record[1], source_name, line)?);
    }

    if q.is_empty() {
        return Err(BraggError::EmptyCurve {
            path: source_name.to_string(),
        });
    }

    Curve::new(q, intensity)
}

/// 解析单个数值单元格
fn parse_cell(cell: &str, source_name: &str, line: u64) -> Result<f64> {
    cell.parse::<f64>().map_err(|_| BraggError::ParseError {
        path: source_name.to_string(),
        line,
        reason: format!("non-numeric value '{}'", cell),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_table_basic() {
        let content = "0.010\t120.5\n0.020\t118.0\n0.030\t99.25\n";
        let curve = parse_table_content(content.as_bytes(), "test").unwrap();

        assert_eq!(curve.len(), 3);
        assert!((curve.q()[1] - 0.02).abs() < 1e-12);
        assert!((curve.intensity()[2] - 99.25).abs() < 1e-12);
    }

    #[test]
    fn test_parse_table_comments_and_extra_columns() {
        let content = "# q\tI\terr\n0.1\t5.0\t0.2\n\n0.2\t6.0\t0.3\n";
        let curve = parse_table_content(content.as_bytes(), "test").unwrap();

        assert_eq!(curve.len(), 2);
        assert!((curve.intensity()[1] - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_parse_table_single_column() {
        let content = "0.1\t5.0\n0.2\n";
        let result = parse_table_content(content.as_bytes(), "test");
        assert!(matches!(result, Err(BraggError::ParseError { line: 2, .. })));
    }

    #[test]
    fn test_parse_table_non_numeric() {
        let content = "0.1\t5.0\n0.2\tabc\n";
        let result = parse_table_content(content.as_bytes(), "test");
        assert!(matches!(result, Err(BraggError::ParseError { .. })));
    }

    #[test]
    fn test_parse_table_empty() {
        let result = parse_table_content("".as_bytes(), "test");
        assert!(matches!(result, Err(BraggError::EmptyCurve { .. })));

        let result = parse_table_content("# only a comment\n".as_bytes(), "test");
        assert!(matches!(result, Err(BraggError::EmptyCurve { .. })));
    }

    #[test]
    fn test_parse_table_missing_file() {
        let result = parse_table_file(Path::new("/nonexistent/curve.dat"));
        assert!(matches!(result, Err(BraggError::FileReadError { .. })));
    }
}
