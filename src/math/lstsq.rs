//! # 线性最小二乘
//!
//! 使用 SVD 求解 `min ||X β - y||²`，并提供一次多项式回归（背景初值估计）。
//!
//! ## 依赖关系
//! - 被 `math/levenberg.rs` 和 `peaks/fitter.rs` 使用
//! - 使用 `nalgebra`

use nalgebra::{DMatrix, DVector};

/// SVD 求解最小二乘问题
///
/// 依次放宽奇异值截断容差；无法得到有限解时返回 `None`。
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    for &tol in &[1e-14, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// 一次多项式拟合 y = slope·x + intercept，返回 (slope, intercept)
///
/// 点数不足或 x 全相同时斜率取 0，截距取 y 的平均值。
pub fn linear_fit(x: &[f64], y: &[f64]) -> (f64, f64) {
    let n = x.len().min(y.len());
    if n == 0 {
        return (0.0, 0.0);
    }

    let mean_y = y[..n].iter().sum::<f64>() / n as f64;
    if n < 2 {
        return (0.0, mean_y);
    }

    let design = DMatrix::from_fn(n, 2, |i, j| if j == 0 { x[i] } else { 1.0 });
    let target = DVector::from_row_slice(&y[..n]);

    match solve_least_squares(&design, &target) {
        Some(beta) if beta[0].is_finite() && beta[1].is_finite() => (beta[0], beta[1]),
        _ => (0.0, mean_y),
    }
}
