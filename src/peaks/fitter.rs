//! # 局部峰拟合器
//!
//! 在候选峰附近的小窗口内，用 pseudo-Voigt + 线性背景做非线性最小二乘拟合，
//! 得到连续取值的峰中心与约化卡方。
//!
//! ## 初值
//! - center = 候选峰所在采样点的 q（不从窗口重新估计）
//! - sigma = (max(q) - min(q)) / 5
//! - amplitude = (max(I) - min(I)) / 50
//! - slope, intercept = 窗口内的一次线性回归
//!
//! ## 依赖关系
//! - 被 `peaks/finder.rs` 和 `commands/fit.rs` 调用
//! - 使用 `peaks/model.rs` 的 PeakModel
//! - 使用 `math/` 的 LevenbergMarquardt 和 linear_fit

use crate::error::{BraggError, Result};
use crate::math::{linear_fit, LevenbergMarquardt};
use crate::models::FitResult;
use crate::peaks::model::{LinearBackground, PeakModel, PseudoVoigt, N_PARAMS, PARAM_NAMES};

use std::fmt;

/// 对未收敛拟合的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitPolicy {
    /// 接受任何拟合结果（仅计数）
    #[default]
    Permissive,
    /// 未收敛、约化卡方非有限或峰中心落在窗口 q 范围之外时报错
    Strict,
}

impl FitPolicy {
    /// 按策略检查一次拟合
    pub fn check(&self, outcome: &FitOutcome) -> Result<()> {
        match self {
            FitPolicy::Permissive => Ok(()),
            FitPolicy::Strict => match outcome.rejection_reason() {
                None => Ok(()),
                Some(reason) => Err(BraggError::FitDidNotConverge {
                    center: outcome.approx_center,
                    half_width: outcome.half_width,
                    reason,
                }),
            },
        }
    }
}

/// 单次拟合的完整结果
#[derive(Debug, Clone)]
pub struct FitOutcome {
    /// 候选峰给出的初始中心
    pub approx_center: f64,
    /// 窗口半宽
    pub half_width: usize,
    /// 初始参数
    pub initial: PeakModel,
    /// 最优参数
    pub model: PeakModel,
    /// 数据点数
    pub n_data: usize,
    /// 窗口 q 范围 (min, max)
    pub q_range: (f64, f64),
    /// 残差平方和
    pub chisqr: f64,
    /// 约化卡方 chisqr / (N - nvarys)
    pub redchi: f64,
    /// 函数调用次数
    pub nfev: usize,
    pub converged: bool,
    /// 终止原因
    pub message: String,
}

impl FitOutcome {
    /// 拟合得到的峰中心
    pub fn center(&self) -> f64 {
        self.model.peak.center
    }

    pub fn result(&self) -> FitResult {
        FitResult {
            center: self.center(),
            redchi: self.redchi,
        }
    }

    /// 峰中心是否落在窗口 q 范围内（含端点）
    pub fn center_in_window(&self) -> bool {
        let (lo, hi) = self.q_range;
        self.center() >= lo && self.center() <= hi
    }

    /// 不可接受时给出原因
    pub fn rejection_reason(&self) -> Option<String> {
        if !self.converged {
            Some(self.message.clone())
        } else if !self.redchi.is_finite() {
            Some(format!("reduced chi-square is {}", self.redchi))
        } else if !self.center_in_window() {
            Some(format!(
                "center {} lies outside the fit window [{}, {}]",
                self.center(),
                self.q_range.0,
                self.q_range.1
            ))
        } else {
            None
        }
    }

    /// 收敛、统计量有限且峰中心在窗口内
    pub fn is_acceptable(&self) -> bool {
        self.rejection_reason().is_none()
    }
}

impl fmt::Display for FitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let peak = self.model.peak;

        writeln!(f, "[[Model]]")?;
        writeln!(f, "    (Model(pseudo_voigt) + Model(linear))")?;
        writeln!(f, "[[Fit Statistics]]")?;
        writeln!(f, "    # fitting method   = leastsq")?;
        writeln!(f, "    # function evals   = {}", self.nfev)?;
        writeln!(f, "    # data points      = {}", self.n_data)?;
        writeln!(f, "    # variables        = {}", N_PARAMS)?;
        writeln!(f, "    chi-square         = {:.7e}", self.chisqr)?;
        writeln!(f, "    reduced chi-square = {:.7e}", self.redchi)?;
        writeln!(
            f,
            "    converged          = {} ({})",
            self.converged, self.message
        )?;
        writeln!(f, "    window half-width  = {}", self.half_width)?;
        writeln!(f, "[[Variables]]")?;

        let fitted = self.model.to_params();
        let initial = self.initial.to_params();
        for ((name, value), init) in PARAM_NAMES.iter().zip(fitted).zip(initial) {
            writeln!(f, "    {:<10} {:>14.7} (init = {:.7})", name, value, init)?;
        }
        writeln!(f, "    {:<10} {:>14.7} == 'sigma'", "gamma", peak.gamma())?;
        writeln!(f, "    {:<10} {:>14.7}", "fwhm", peak.fwhm())?;
        write!(f, "    {:<10} {:>14.7}", "height", peak.height())
    }
}

/// 根据窗口数据估计初值
pub fn initial_guess(q: &[f64], intensity: &[f64], approx_center: f64) -> PeakModel {
    let q_min = q.iter().copied().fold(f64::INFINITY, f64::min);
    let q_max = q.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let i_min = intensity.iter().copied().fold(f64::INFINITY, f64::min);
    let i_max = intensity.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (slope, intercept) = linear_fit(q, intensity);

    PeakModel {
        peak: PseudoVoigt {
            center: approx_center,
            sigma: (q_max - q_min) / 5.0,
            amplitude: (i_max - i_min) / 50.0,
        },
        background: LinearBackground { slope, intercept },
    }
}

/// 峰拟合器
#[derive(Debug, Clone, Default)]
pub struct PeakFitter {
    solver: LevenbergMarquardt,
}

impl PeakFitter {
    /// 拟合一个窗口
    ///
    /// `approx_center` 作为峰中心初值；窗口至少需要 2 个点。
    pub fn fit(
        &self,
        q: &[f64],
        intensity: &[f64],
        approx_center: f64,
        half_width: usize,
    ) -> Result<FitOutcome> {
        if q.len() != intensity.len() {
            return Err(BraggError::InvalidArgument(format!(
                "fit window columns differ in length ({} vs {})",
                q.len(),
                intensity.len()
            )));
        }
        if q.len() < 2 {
            return Err(BraggError::WindowOutOfBounds {
                index: 0,
                half_width,
                len: q.len(),
            });
        }

        let initial = initial_guess(q, intensity, approx_center);
        let report = self.solver.minimize(&initial.to_params(), |p| {
            let model = PeakModel::from_params(p);
            q.iter()
                .zip(intensity)
                .map(|(x, y)| model.eval(*x) - y)
                .collect()
        });

        let mut model = PeakModel::from_params(&report.params);
        model.peak.sigma = model.peak.sigma.abs();

        let n_data = q.len();
        let q_range = (
            q.iter().copied().fold(f64::INFINITY, f64::min),
            q.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        );
        let nfree = n_data.saturating_sub(N_PARAMS).max(1);

        Ok(FitOutcome {
            approx_center,
            half_width,
            initial,
            model,
            n_data,
            q_range,
            chisqr: report.chisqr,
            redchi: report.chisqr / nfree as f64,
            nfev: report.nfev,
            converged: report.converged,
            message: report.message,
        })
    }
}
