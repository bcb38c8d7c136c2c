//! # 候选峰检测器
//!
//! 对原始强度做小波岭线搜索，再按 q 窗口 (lo_lim, hi_lim) 过滤，
//! 去除低 q 的 beamstop 伪峰和高 q 的探测器边缘噪声。
//!
//! ## 依赖关系
//! - 被 `peaks/finder.rs` 调用
//! - 使用 `peaks/wavelet.rs` 的 find_peaks_cwt
//! - 使用 `models/` 的 Curve, Candidate

use crate::error::{BraggError, Result};
use crate::models::{Candidate, Curve};
use crate::peaks::wavelet;

/// 搜索宽度个数上限
pub const MAX_SEARCH_WIDTHS: usize = 1000;

/// 搜索宽度集合 {1, 2, ...} ∩ [1, sensitivity)
///
/// 宽度个数超过 [`MAX_SEARCH_WIDTHS`] 时报错。
pub fn search_widths(sensitivity: f64) -> Result<Vec<f64>> {
    if !sensitivity.is_finite() || sensitivity <= 1.0 {
        return Err(BraggError::InvalidArgument(format!(
            "finding sensitivity must be greater than 1 (got {})",
            sensitivity
        )));
    }

    let count = (sensitivity - 1.0).ceil();
    if count > MAX_SEARCH_WIDTHS as f64 {
        return Err(BraggError::InvalidArgument(format!(
            "finding sensitivity {} needs {} wavelet widths (at most {} supported)",
            sensitivity, count, MAX_SEARCH_WIDTHS
        )));
    }

    Ok((0..count as usize).map(|i| 1.0 + i as f64).collect())
}

/// 检测候选峰
///
/// 返回的每个候选峰都满足 `lo_lim < q < hi_lim`（严格不等式），顺序与搜索结果一致。
pub fn detect(curve: &Curve, sensitivity: f64, lo_lim: f64, hi_lim: f64) -> Result<Vec<Candidate>> {
    if curve.is_empty() {
        return Err(BraggError::InvalidArgument(
            "curve contains no samples".to_string(),
        ));
    }

    let widths = search_widths(sensitivity)?;
    if widths.len() > curve.len() {
        return Err(BraggError::InvalidArgument(format!(
            "finding sensitivity {} exceeds the curve length ({} samples)",
            sensitivity,
            curve.len()
        )));
    }
    let indices = wavelet::find_peaks_cwt(curve.intensity(), &widths)?;

    Ok(indices
        .into_iter()
        .map(|index| Candidate {
            index,
            q: curve.q()[index],
        })
        .filter(|c| c.q > lo_lim && c.q < hi_lim)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 在 [0, 3] 上等距采样 n 点，叠加高斯峰与平坦背景
    fn curve_with_peaks(n: usize, centers: &[f64]) -> Curve {
        let q: Vec<f64> = (0..n).map(|i| 3.0 * i as f64 / (n - 1) as f64).collect();
        let intensity = q
            .iter()
            .map(|x| {
                1.0 + centers
                    .iter()
                    .map(|c| 40.0 * (-(x - c).powi(2) / (2.0 * 0.05_f64.powi(2))).exp())
                    .sum::<f64>()
            })
            .collect();
        Curve::new(q, intensity).unwrap()
    }

    #[test]
    fn test_search_widths() {
        assert_eq!(search_widths(8.0).unwrap(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(search_widths(3.5).unwrap(), vec![1.0, 2.0, 3.0]);
        assert_eq!(search_widths(2.0).unwrap(), vec![1.0]);
        assert!(search_widths(1.0).is_err());
        assert!(search_widths(0.5).is_err());
        assert!(search_widths(f64::NAN).is_err());
    }

    #[test]
    fn test_search_widths_bounded() {
        assert_eq!(search_widths(1001.0).unwrap().len(), MAX_SEARCH_WIDTHS);
        assert!(matches!(
            search_widths(1001.5),
            Err(BraggError::InvalidArgument(_))
        ));
        assert!(matches!(search_widths(1e6), Err(BraggError::InvalidArgument(_))));
        assert!(matches!(search_widths(1e30), Err(BraggError::InvalidArgument(_))));
        assert!(search_widths(f64::INFINITY).is_err());
    }

    #[test]
    fn test_detect_rejects_widths_beyond_curve() {
        let curve = curve_with_peaks(50, &[1.5]);
        assert!(matches!(
            detect(&curve, 60.0, 0.1, 2.9),
            Err(BraggError::InvalidArgument(_))
        ));
        assert!(detect(&curve, 8.0, 0.1, 2.9).is_ok());
    }

    #[test]
    fn test_detect_respects_q_window() {
        let curve = curve_with_peaks(200, &[0.8, 1.5, 2.2]);
        let candidates = detect(&curve, 8.0, 1.0, 2.0).unwrap();

        assert!(!candidates.is_empty());
        for c in &candidates {
            assert!(c.q > 1.0 && c.q < 2.0, "candidate at q = {}", c.q);
            assert_eq!(curve.q()[c.index], c.q);
        }
        assert!(candidates.iter().any(|c| (c.q - 1.5).abs() < 0.03));
    }

    #[test]
    fn test_detect_empty_window() {
        let curve = curve_with_peaks(200, &[1.5]);
        let candidates = detect(&curve, 8.0, 2.0, 2.5).unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_detect_rejects_low_sensitivity() {
        let curve = curve_with_peaks(50, &[1.5]);
        assert!(detect(&curve, 1.0, 0.1, 2.9).is_err());
    }
}
