//! # 数据模型模块
//!
//! 定义散射曲线、候选峰与拟合结果的数据模型。
//!
//! ## 依赖关系
//! - 被 `parsers/`, `peaks/` 和 `commands/` 使用
//! - 子模块: curve, peak

pub mod curve;
pub mod peak;

pub use curve::Curve;
pub use peak::{Candidate, FitResult, PeakSet};
