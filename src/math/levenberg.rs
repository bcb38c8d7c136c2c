//! # Levenberg–Marquardt 非线性最小二乘
//!
//! 最小化残差平方和 `Σ r_i(p)²`。
//!
//! ## 算法
//! 1. 中心差分计算 Jacobian J
//! 2. 求解 `(JᵀJ + λ·diag(JᵀJ)) δ = -Jᵀr`（Marquardt 对角缩放），以增广矩阵 SVD 求解
//! 3. 按实际/预测下降比 ρ 接受或拒绝步长并调整 λ（Nielsen 策略）
//! 4. 满足 ftol / xtol 判据即收敛，超出函数调用预算则报告未收敛
//!
//! ## 依赖关系
//! - 被 `peaks/fitter.rs` 调用
//! - 使用 `math/lstsq.rs` 的 SVD 求解器
//! - 使用 `nalgebra`

use crate::math::lstsq::solve_least_squares;

use nalgebra::{DMatrix, DVector};

/// ε^(1/3)，中心差分的相对步长
const CBRT_EPSILON: f64 = 6.055_454_452_393_343e-6;

/// λ 超过该值视为无法继续下降
const MAX_LAMBDA: f64 = 1e32;

/// 最小化结果
#[derive(Debug, Clone)]
pub struct MinimizeReport {
    /// 最优参数
    pub params: Vec<f64>,
    /// 残差平方和
    pub chisqr: f64,
    /// 残差函数调用次数
    pub nfev: usize,
    /// 是否满足收敛判据
    pub converged: bool,
    /// 终止原因
    pub message: String,
}

/// Levenberg–Marquardt 最小化器
#[derive(Debug, Clone)]
pub struct LevenbergMarquardt {
    /// 平方和的相对下降容差
    pub ftol: f64,
    /// 参数的相对变化容差
    pub xtol: f64,
    /// 函数调用上限；`None` 时取 `2000·(n+1)`
    pub max_nfev: Option<usize>,
}

impl Default for LevenbergMarquardt {
    fn default() -> Self {
        Self {
            ftol: 1.5e-8,
            xtol: 1.5e-8,
            max_nfev: None,
        }
    }
}

impl LevenbergMarquardt {
    /// 从初值出发最小化 `residuals` 返回的残差向量
    pub fn minimize<F>(&self, initial: &[f64], residuals: F) -> MinimizeReport
    where
        F: Fn(&[f64]) -> Vec<f64>,
    {
        let n = initial.len();
        let max_nfev = self.max_nfev.unwrap_or(2000 * (n + 1));
        let typical: Vec<f64> = initial.iter().map(|v| v.abs()).collect();

        let mut p = DVector::from_row_slice(initial);
        let mut r = DVector::from_vec(residuals(p.as_slice()));
        let mut nfev = 1;

        let finish = |p: &DVector<f64>, r: &DVector<f64>, nfev, converged, message: &str| {
            MinimizeReport {
                params: p.iter().copied().collect(),
                chisqr: r.norm_squared(),
                nfev,
                converged,
                message: message.to_string(),
            }
        };

        if r.iter().any(|v| !v.is_finite()) {
            return finish(
                &p,
                &r,
                nfev,
                false,
                "residuals are not finite at the initial guess",
            );
        }
        if n == 0 {
            return finish(&p, &r, nfev, true, "no free parameters");
        }

        let mut cost = r.norm_squared();
        let mut lambda: Option<f64> = None;
        let mut nu = 2.0;

        loop {
            if cost <= f64::MIN_POSITIVE {
                return finish(&p, &r, nfev, true, "exact fit");
            }
            if nfev + 2 * n > max_nfev {
                return finish(
                    &p,
                    &r,
                    nfev,
                    false,
                    "maximum number of function evaluations exceeded",
                );
            }

            let jac = central_jacobian(&p, &r, &typical, &residuals);
            nfev += 2 * n;

            let g = jac.transpose() * &r;
            let a = jac.transpose() * &jac;
            let scale = DVector::from_fn(n, |i, _| {
                let d = a[(i, i)];
                if d > 0.0 && d.is_finite() {
                    d
                } else {
                    1.0
                }
            });

            let mut lam =
                lambda.unwrap_or_else(|| 1e-3 * scale.iter().copied().fold(0.0_f64, f64::max));

            // 内层循环：直到接受一步或判定收敛/失败
            loop {
                // 增广最小二乘 [J; sqrt(λD)] δ ≈ [-r; 0]，避免法方程放大条件数
                let m = r.len();
                let aug = DMatrix::from_fn(m + n, n, |i, j| {
                    if i < m {
                        jac[(i, j)]
                    } else if i - m == j {
                        (lam * scale[j]).sqrt()
                    } else {
                        0.0
                    }
                });
                let rhs = DVector::from_fn(m + n, |i, _| if i < m { -r[i] } else { 0.0 });
                let delta = solve_least_squares(&aug, &rhs);

                let delta = match delta {
                    Some(d) if d.iter().all(|v| v.is_finite()) => d,
                    _ => {
                        lam *= nu;
                        nu *= 2.0;
                        if lam > MAX_LAMBDA {
                            return finish(&p, &r, nfev, false, "step computation failed");
                        }
                        continue;
                    }
                };

                if delta.norm() <= self.xtol * (p.norm() + self.xtol) {
                    return finish(
                        &p,
                        &r,
                        nfev,
                        true,
                        "relative change in parameters is at most xtol",
                    );
                }

                if nfev >= max_nfev {
                    return finish(
                        &p,
                        &r,
                        nfev,
                        false,
                        "maximum number of function evaluations exceeded",
                    );
                }

                let p_new = &p + &delta;
                let r_new = DVector::from_vec(residuals(p_new.as_slice()));
                nfev += 1;

                let cost_new = if r_new.iter().all(|v| v.is_finite()) {
                    r_new.norm_squared()
                } else {
                    f64::INFINITY
                };

                let predicted = delta.dot(&(scale.component_mul(&delta) * lam - &g));
                let actual = cost - cost_new;
                let rho = if predicted > 0.0 { actual / predicted } else { -1.0 };

                if rho > 0.0 {
                    p = p_new;
                    r = r_new;
                    let ftol_hit =
                        actual.abs() <= self.ftol * cost && predicted <= self.ftol * cost;
                    cost = cost_new;
                    lam *= (1.0 - (2.0 * rho - 1.0).powi(3)).max(1.0 / 3.0);
                    nu = 2.0;
                    lambda = Some(lam);

                    if ftol_hit {
                        return finish(
                            &p,
                            &r,
                            nfev,
                            true,
                            "relative reduction in sum of squares is at most ftol",
                        );
                    }
                    break;
                }

                lam *= nu;
                nu *= 2.0;
                if lam > MAX_LAMBDA {
                    return finish(&p, &r, nfev, false, "no further reduction possible");
                }
            }
        }
    }
}

/// 中心差分 Jacobian，∂r_i/∂p_j
fn central_jacobian<F>(
    p: &DVector<f64>,
    r: &DVector<f64>,
    typical: &[f64],
    residuals: &F,
) -> DMatrix<f64>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let n = p.len();
    let m = r.len();
    let mut jac = DMatrix::zeros(m, n);
    let mut work = p.clone();

    for j in 0..n {
        let magnitude = p[j].abs().max(typical[j]);
        let h = CBRT_EPSILON * if magnitude > 0.0 { magnitude } else { 1.0 };

        work[j] = p[j] + h;
        let forward = residuals(work.as_slice());
        work[j] = p[j] - h;
        let backward = residuals(work.as_slice());
        work[j] = p[j];

        for i in 0..m {
            let d = (forward[i] - backward[i]) / (2.0 * h);
            jac[(i, j)] = if d.is_finite() { d } else { 0.0 };
        }
    }

    jac
}
