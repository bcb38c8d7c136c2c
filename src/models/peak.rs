//! # 峰数据模型
//!
//! 候选峰（粗搜索给出的采样下标）、单次拟合结果与最终峰位集合。
//!
//! ## 依赖关系
//! - 被 `peaks/` 和 `commands/` 使用
//! - 无外部模块依赖

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// 粗搜索得到的候选峰
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// 曲线中的采样下标
    pub index: usize,
    /// 该下标处的 q
    pub q: f64,
}

/// 单次 (候选峰, 窗口半宽) 拟合的结果
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    /// 拟合得到的峰中心 q
    pub center: f64,
    /// 约化卡方
    pub redchi: f64,
}

/// 最终峰位集合（升序、无重复）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeakSet {
    centers: Vec<f64>,
}

impl PeakSet {
    /// 从任意峰位创建，排序并去除完全相同的值
    pub fn from_centers(mut centers: Vec<f64>) -> Self {
        centers.retain(|c| c.is_finite());
        centers.sort_by(|a, b| a.total_cmp(b));
        centers.dedup();
        Self { centers }
    }

    pub fn len(&self) -> usize {
        self.centers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.centers
    }

    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.centers.iter()
    }

    /// 对应的 d 间距 d = 2π/q（Å）
    pub fn d_spacings(&self) -> Vec<f64> {
        self.centers.iter().map(|q| 2.0 * PI / q).collect()
    }
}

impl<'a> IntoIterator for &'a PeakSet {
    type Item = &'a f64;
    type IntoIter = std::slice::Iter<'a, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.centers.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_set_sorted_unique() {
        let set = PeakSet::from_centers(vec![2.0, 1.0, 2.0, f64::NAN, 0.5]);
        assert_eq!(set.as_slice(), &[0.5, 1.0, 2.0]);
    }

    #[test]
    fn test_peak_set_d_spacing() {
        let set = PeakSet::from_centers(vec![PI]);
        let d = set.d_spacings();
        assert!((d[0] - 2.0).abs() < 1e-12);
    }
}
