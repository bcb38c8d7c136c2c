//! # 数值计算模块
//!
//! 峰拟合所需的小型数值内核。
//!
//! ## 子模块
//! - `lstsq`: 线性最小二乘（SVD 求解、一次多项式回归）
//! - `levenberg`: Levenberg–Marquardt 非线性最小二乘
//! - `stats`: 百分位数
//!
//! ## 依赖关系
//! - 被 `peaks/` 使用
//! - 使用 `nalgebra` 进行矩阵运算

pub mod levenberg;
pub mod lstsq;
pub mod stats;

pub use levenberg::LevenbergMarquardt;
pub use lstsq::linear_fit;
pub use stats::percentile;
