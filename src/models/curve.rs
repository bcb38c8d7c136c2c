//! # I(q) 曲线数据模型
//!
//! 一维散射曲线：按 q 升序排列的 (q, I) 采样点，以及围绕候选峰截取的拟合窗口。
//!
//! ## 依赖关系
//! - 被 `parsers/table.rs` 创建
//! - 被 `peaks/` 使用
//! - 无外部模块依赖

use crate::error::{BraggError, Result};

use serde::{Deserialize, Serialize};

/// 散射强度曲线
///
/// q 假定严格递增（不做强制检查）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Curve {
    /// 动量转移 q（Å⁻¹）
    q: Vec<f64>,
    /// 强度 I(q)
    intensity: Vec<f64>,
}

impl Curve {
    /// 从 q 与强度两列创建曲线
    pub fn new(q: Vec<f64>, intensity: Vec<f64>) -> Result<Self> {
        if q.len() != intensity.len() {
            return Err(BraggError::InvalidArgument(format!(
                "q and intensity columns differ in length ({} vs {})",
                q.len(),
                intensity.len()
            )));
        }
        if q.is_empty() {
            return Err(BraggError::InvalidArgument(
                "curve must contain at least one sample".to_string(),
            ));
        }
        Ok(Self { q, intensity })
    }

    pub fn len(&self) -> usize {
        self.q.len()
    }

    pub fn is_empty(&self) -> bool {
        self.q.is_empty()
    }

    pub fn q(&self) -> &[f64] {
        &self.q
    }

    pub fn intensity(&self) -> &[f64] {
        &self.intensity
    }

    /// 距离给定 q 最近的采样点下标
    pub fn nearest_index(&self, q: f64) -> usize {
        self.q
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                (*a - q)
                    .abs()
                    .partial_cmp(&(*b - q).abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    /// 截取 q 位于 [lo, hi] 内的点
    pub fn points_between(&self, lo: f64, hi: f64) -> Vec<(f64, f64)> {
        self.q
            .iter()
            .zip(&self.intensity)
            .filter(|(q, _)| **q >= lo && **q <= hi)
            .map(|(q, i)| (*q, *i))
            .collect()
    }

    /// 围绕 `center` 截取半宽为 `half_width` 的拟合窗口
    ///
    /// 窗口为半开区间 `[center - half_width, center + half_width)`，共 2w 个点。
    pub fn window(&self, center: usize, half_width: usize) -> Result<FitWindow<'_>> {
        let len = self.len();
        if half_width == 0 || center < half_width || center + half_width > len {
            return Err(BraggError::WindowOutOfBounds {
                index: center,
                half_width,
                len,
            });
        }

        let start = center - half_width;
        let end = center + half_width;
        Ok(FitWindow {
            q: &self.q[start..end],
            intensity: &self.intensity[start..end],
        })
    }
}

/// 单次拟合使用的曲线片段
#[derive(Debug, Clone, Copy)]
pub struct FitWindow<'a> {
    pub q: &'a [f64],
    pub intensity: &'a [f64],
}

impl FitWindow<'_> {
    pub fn len(&self) -> usize {
        self.q.len()
    }

    /// 窗口 q 范围 (min, max)
    pub fn q_span(&self) -> (f64, f64) {
        let min = self.q.iter().copied().fold(f64::INFINITY, f64::min);
        let max = self.q.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (min, max)
    }

    /// 窗口强度范围 (min, max)
    pub fn intensity_span(&self) -> (f64, f64) {
        let min = self.intensity.iter().copied().fold(f64::INFINITY, f64::min);
        let max = self
            .intensity
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        (min, max)
    }
}
