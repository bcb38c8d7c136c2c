//! # 统计工具
//!
//! ## 依赖关系
//! - 被 `peaks/wavelet.rs` 使用（岭线信噪比的噪声估计）
//! - 无外部模块依赖

/// 百分位数（0-100），在相邻有序值之间线性插值
///
/// 空输入返回 NaN。
pub fn percentile(values: &[f64], per: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = per.clamp(0.0, 100.0) / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;

    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_interpolates() {
        let values = [4.0, 1.0, 3.0, 2.0, 5.0];
        assert!((percentile(&values, 0.0) - 1.0).abs() < 1e-12);
        assert!((percentile(&values, 50.0) - 3.0).abs() < 1e-12);
        assert!((percentile(&values, 10.0) - 1.4).abs() < 1e-12);
        assert!((percentile(&values, 100.0) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_percentile_empty() {
        assert!(percentile(&[], 10.0).is_nan());
    }
}
