//! # 峰形 + 背景模型
//!
//! 单峰模型 = 对称 pseudo-Voigt 峰 + 线性背景。
//!
//! ## 峰形
//! Thompson–Cox–Hastings pseudo-Voigt：用同一 FWHM 的 Lorentzian 与 Gaussian
//! 加权叠加近似 Voigt 卷积。Gaussian 宽度 σ，Lorentzian 半宽 γ 固定等于 σ，
//! `amplitude` 为峰面积。
//!
//! ## 依赖关系
//! - 被 `peaks/fitter.rs` 和 `peaks/plot.rs` 使用
//! - 无外部模块依赖

use std::f64::consts::PI;

/// 2·sqrt(2·ln2)，Gaussian FWHM / σ
const GAUSS_FWHM_FACTOR: f64 = 2.354_820_045_030_949;

/// pseudo-Voigt 峰参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PseudoVoigt {
    pub center: f64,
    /// Gaussian 宽度 σ（取绝对值使用）
    pub sigma: f64,
    /// 峰面积
    pub amplitude: f64,
}

impl PseudoVoigt {
    /// Lorentzian 半宽 γ，与 σ 绑定
    pub fn gamma(&self) -> f64 {
        self.sigma.abs()
    }

    /// (总 FWHM, Lorentzian 混合比 η)
    pub fn fwhm_and_eta(&self) -> (f64, f64) {
        let fg = GAUSS_FWHM_FACTOR * self.sigma.abs();
        let fl = 2.0 * self.gamma();

        let f = (fg.powi(5)
            + 2.69269 * fg.powi(4) * fl
            + 2.42843 * fg.powi(3) * fl.powi(2)
            + 4.47163 * fg.powi(2) * fl.powi(3)
            + 0.07842 * fg * fl.powi(4)
            + fl.powi(5))
        .powf(0.2);

        if f <= 0.0 {
            return (0.0, 0.0);
        }

        let ratio = fl / f;
        let eta = 1.36603 * ratio - 0.47719 * ratio.powi(2) + 0.11116 * ratio.powi(3);
        (f, eta)
    }

    /// 半高全宽
    pub fn fwhm(&self) -> f64 {
        self.fwhm_and_eta().0
    }

    /// 峰高（中心处取值）
    pub fn height(&self) -> f64 {
        self.eval(self.center)
    }

    /// 计算 x 处的峰强度
    pub fn eval(&self, x: f64) -> f64 {
        let (f, eta) = self.fwhm_and_eta();
        if f <= 0.0 {
            return 0.0;
        }

        let dx = x - self.center;
        let half = f / 2.0;
        let lorentz = half / (PI * (dx * dx + half * half));

        let sigma_f = f / GAUSS_FWHM_FACTOR;
        let gauss = (-dx * dx / (2.0 * sigma_f * sigma_f)).exp() / (sigma_f * (2.0 * PI).sqrt());

        self.amplitude * (eta * lorentz + (1.0 - eta) * gauss)
    }
}

/// 线性背景
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearBackground {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearBackground {
    pub fn eval(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// 峰 + 背景复合模型
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakModel {
    pub peak: PseudoVoigt,
    pub background: LinearBackground,
}

/// 自由参数个数
pub const N_PARAMS: usize = 5;

/// 参数名（与 `to_params` 顺序一致）
pub const PARAM_NAMES: [&str; N_PARAMS] = ["center", "sigma", "amplitude", "slope", "intercept"];

impl PeakModel {
    pub fn eval(&self, x: f64) -> f64 {
        self.peak.eval(x) + self.background.eval(x)
    }

    /// 参数向量 [center, sigma, amplitude, slope, intercept]
    pub fn to_params(&self) -> [f64; N_PARAMS] {
        [
            self.peak.center,
            self.peak.sigma,
            self.peak.amplitude,
            self.background.slope,
            self.background.intercept,
        ]
    }

    pub fn from_params(p: &[f64]) -> Self {
        Self {
            peak: PseudoVoigt {
                center: p[0],
                sigma: p[1],
                amplitude: p[2],
            },
            background: LinearBackground {
                slope: p[3],
                intercept: p[4],
            },
        }
    }
}
