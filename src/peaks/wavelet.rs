//! # 小波岭线峰搜索
//!
//! 多尺度连续小波变换（Ricker 小波）+ 岭线追踪的粗峰搜索。
//!
//! ## 算法概述
//! 1. 对每个试验宽度 w 做 Ricker 小波卷积（"same" 模式），得到 CWT 矩阵
//! 2. 逐行求严格局部极大值
//! 3. 从含极大值的最宽一行向下追踪岭线：距离 ≤ w/4 的极大值并入最近的岭线，
//!    空缺行数超过 gap_thresh 的岭线结束
//! 4. 按最小长度与信噪比过滤岭线，取最窄尺度处的列作为峰位
//!
//! ## 参考
//! - Du, Kibbe & Lin, "Improved peak detection in mass spectrum by
//!   incorporating continuous wavelet transform-based pattern matching" (2006)
//!
//! ## 依赖关系
//! - 被 `peaks/detector.rs` 调用
//! - 使用 `math/stats.rs` 计算噪声百分位数

use crate::error::{BraggError, Result};
use crate::math::percentile;

use std::f64::consts::PI;

/// 岭线搜索参数
#[derive(Debug, Clone)]
pub struct RidgeParams {
    /// 各行允许的最大列距离（默认 w/4）
    pub max_distances: Vec<f64>,
    /// 允许的最大空缺行数（默认 ceil(widths[0])）
    pub gap_thresh: f64,
    /// 岭线最小长度（默认 ceil(行数/4)）
    pub min_length: usize,
    /// 噪声窗口大小（默认 ceil(点数/20)）
    pub window_size: usize,
    /// 最小信噪比
    pub min_snr: f64,
    /// 噪声百分位数
    pub noise_perc: f64,
}

impl RidgeParams {
    /// 按宽度集合和信号长度生成默认参数
    pub fn defaults_for(widths: &[f64], n_points: usize) -> Self {
        Self {
            max_distances: widths.iter().map(|w| w / 4.0).collect(),
            gap_thresh: widths.first().copied().unwrap_or(1.0).ceil(),
            min_length: (widths.len() as f64 / 4.0).ceil() as usize,
            window_size: (n_points as f64 / 20.0).ceil() as usize,
            min_snr: 1.0,
            noise_perc: 10.0,
        }
    }
}

/// 岭线：按行升序排列的 (行, 列) 序列
#[derive(Debug, Clone, PartialEq)]
pub struct RidgeLine {
    pub rows: Vec<usize>,
    pub cols: Vec<usize>,
}

/// 追踪中的岭线
struct OpenLine {
    rows: Vec<usize>,
    cols: Vec<usize>,
    gap: usize,
}

/// Ricker（墨西哥帽）小波，`points` 个采样点，宽度参数 `a`
pub fn ricker(points: usize, a: f64) -> Vec<f64> {
    let norm = 2.0 / ((3.0 * a).sqrt() * PI.powf(0.25));
    let center = (points as f64 - 1.0) / 2.0;
    let wsq = a * a;

    (0..points)
        .map(|i| {
            let x = i as f64 - center;
            let xsq = x * x;
            norm * (1.0 - xsq / wsq) * (-xsq / (2.0 * wsq)).exp()
        })
        .collect()
}

/// "same" 模式离散卷积，输出与 `signal` 等长
///
/// 要求 `kernel.len() <= signal.len()`。
fn convolve_same(signal: &[f64], kernel: &[f64]) -> Vec<f64> {
    let n = signal.len();
    let m = kernel.len();
    let offset = m / 2;

    (0..n)
        .map(|i| {
            let mut acc = 0.0;
            for (j, k) in kernel.iter().rev().enumerate() {
                // signal 下标 = i - offset + j
                let idx = i + j;
                if idx >= offset && idx - offset < n {
                    acc += signal[idx - offset] * k;
                }
            }
            acc
        })
        .collect()
}

/// 连续小波变换，每个宽度一行
pub fn cwt(signal: &[f64], widths: &[f64]) -> Vec<Vec<f64>> {
    widths
        .iter()
        .map(|&w| {
            let points = ((10.0 * w) as usize).min(signal.len());
            let wavelet = ricker(points, w);
            convolve_same(signal, &wavelet)
        })
        .collect()
}

/// 一行中的严格局部极大值（两端点不计入）
pub fn relative_maxima(row: &[f64]) -> Vec<usize> {
    if row.len() < 3 {
        return Vec::new();
    }
    (1..row.len() - 1)
        .filter(|&i| row[i] > row[i - 1] && row[i] > row[i + 1])
        .collect()
}

/// 在 CWT 矩阵中追踪岭线
pub fn identify_ridge_lines(
    matrix: &[Vec<f64>],
    max_distances: &[f64],
    gap_thresh: f64,
) -> Result<Vec<RidgeLine>> {
    if max_distances.len() < matrix.len() {
        return Err(BraggError::InvalidArgument(
            "max_distances must have at least as many entries as CWT rows".to_string(),
        ));
    }

    let gap_thresh = gap_thresh.ceil();
    let maxima: Vec<Vec<usize>> = matrix.iter().map(|row| relative_maxima(row)).collect();

    let start_row = match maxima.iter().rposition(|cols| !cols.is_empty()) {
        Some(row) => row,
        None => return Ok(Vec::new()),
    };

    let mut open: Vec<OpenLine> = maxima[start_row]
        .iter()
        .map(|&col| OpenLine {
            rows: vec![start_row],
            cols: vec![col],
            gap: 0,
        })
        .collect();
    let mut finished: Vec<OpenLine> = Vec::new();

    for row in (0..start_row).rev() {
        for line in open.iter_mut() {
            line.gap += 1;
        }

        // 仅与本行之前已存在的岭线比较
        let prev_cols: Vec<usize> = open
            .iter()
            .map(|line| line.cols.last().copied().unwrap_or(0))
            .collect();

        for &col in &maxima[row] {
            let closest = prev_cols
                .iter()
                .enumerate()
                .map(|(i, &c)| (i, col.abs_diff(c)))
                .min_by_key(|&(_, d)| d);

            match closest {
                Some((i, d)) if d as f64 <= max_distances[row] => {
                    let line = &mut open[i];
                    line.rows.push(row);
                    line.cols.push(col);
                    line.gap = 0;
                }
                _ => open.push(OpenLine {
                    rows: vec![row],
                    cols: vec![col],
                    gap: 0,
                }),
            }
        }

        let mut i = open.len();
        while i > 0 {
            i -= 1;
            if open[i].gap as f64 > gap_thresh {
                finished.push(open.remove(i));
            }
        }
    }

    // 行号沿追踪方向递减，反转得到升序
    Ok(finished
        .into_iter()
        .chain(open)
        .map(|line| RidgeLine {
            rows: line.rows.into_iter().rev().collect(),
            cols: line.cols.into_iter().rev().collect(),
        })
        .collect())
}

/// 按长度和信噪比过滤岭线
pub fn filter_ridge_lines(
    matrix: &[Vec<f64>],
    lines: Vec<RidgeLine>,
    params: &RidgeParams,
) -> Vec<RidgeLine> {
    let row_one = match matrix.first() {
        Some(row) => row,
        None => return Vec::new(),
    };
    let num_points = row_one.len();
    let half_window = params.window_size / 2;
    let odd = params.window_size % 2;

    let noises: Vec<f64> = (0..num_points)
        .map(|i| {
            let start = i.saturating_sub(half_window);
            let end = (i + half_window + odd).min(num_points);
            percentile(&row_one[start..end], params.noise_perc)
        })
        .collect();

    lines
        .into_iter()
        .filter(|line| {
            if line.rows.len() < params.min_length {
                return false;
            }
            let (row, col) = (line.rows[0], line.cols[0]);
            let snr = (matrix[row][col] / noises[col]).abs();
            // NaN 信噪比不剔除
            !(snr < params.min_snr)
        })
        .collect()
}

/// 小波岭线峰搜索，返回升序的采样下标（可能含重复）
pub fn find_peaks_cwt(signal: &[f64], widths: &[f64]) -> Result<Vec<usize>> {
    if signal.is_empty() {
        return Err(BraggError::InvalidArgument(
            "cannot search an empty signal".to_string(),
        ));
    }
    if widths.is_empty() || widths.iter().any(|w| !(*w > 0.0)) {
        return Err(BraggError::InvalidArgument(
            "wavelet widths must be a non-empty set of positive values".to_string(),
        ));
    }

    let params = RidgeParams::defaults_for(widths, signal.len());
    let matrix = cwt(signal, widths);
    let lines = identify_ridge_lines(&matrix, &params.max_distances, params.gap_thresh)?;
    let filtered = filter_ridge_lines(&matrix, lines, &params);

    let mut locations: Vec<usize> = filtered.iter().map(|line| line.cols[0]).collect();
    locations.sort_unstable();
    Ok(locations)
}
