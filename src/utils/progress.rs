//! # 进度条工具
//!
//! 封装 `indicatif`，为逐窗口拟合提供统一的进度条样式。
//!
//! ## 依赖关系
//! - 被 `commands/find.rs` 使用
//! - 使用 `indicatif` crate

use indicatif::{ProgressBar, ProgressStyle};

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}";

/// 创建标准进度条
///
/// 长度可以先给 0，得知任务数后再用 `set_length` 更新。
pub fn create_progress_bar(len: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::with_template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_is_valid() {
        assert!(ProgressStyle::with_template(BAR_TEMPLATE).is_ok());
    }

    #[test]
    fn test_progress_bar_length_update() {
        let pb = create_progress_bar(0, "fitting");
        pb.set_length(14);
        pb.inc(3);
        assert_eq!(pb.length(), Some(14));
        assert_eq!(pb.position(), 3);
        pb.finish_and_clear();
    }
}
