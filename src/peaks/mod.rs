//! # Bragg 峰查找模块
//!
//! 两阶段流程：小波粗搜索给出候选峰，逐窗口非线性拟合细化峰中心，最后去重。
//!
//! ## 子模块
//! - `wavelet`  - Ricker 连续小波变换与脊线识别
//! - `detector` - 候选峰检测
//! - `model`    - pseudo-Voigt + 线性背景模型
//! - `fitter`   - 局部窗口拟合
//! - `dedupe`   - 峰位去重
//! - `finder`   - 流程编排
//! - `plot`     - 总览图与诊断图
//! - `export`   - 峰位导出
//!
//! ## 依赖关系
//! - 被 `commands/` 调用
//! - 使用 `models/`, `math/`

pub mod dedupe;
pub mod detector;
pub mod export;
pub mod finder;
pub mod fitter;
pub mod model;
pub mod plot;
pub mod wavelet;

pub use finder::{find_peaks, FinderConfig, FinderObserver, FitJob};
pub use fitter::{FitOutcome, FitPolicy, PeakFitter};
