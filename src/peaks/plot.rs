//! # 峰位图表生成
//!
//! 使用 `plotters` 库绘制两类图：
//! - 总览图：[lo, hi] 内的 log(I)–q 曲线，在每个最终峰位处画竖线
//! - 诊断图：单次拟合窗口的数据点、最优拟合曲线、背景与峰分量，以及初值/拟合中心标记
//!
//! 两类图都通过 `FinderObserver` 接入查找流程，核心算法不依赖绘图。
//!
//! ## 依赖关系
//! - 被 `commands/find.rs` 和 `commands/fit.rs` 调用
//! - 使用 `peaks/finder.rs` 的 FinderObserver
//! - 使用 `peaks/fitter.rs` 的 FitOutcome
//! - 使用 `plotters` 渲染图表

use crate::error::{BraggError, Result};
use crate::models::{Curve, PeakSet};
use crate::peaks::finder::{FinderObserver, FitJob};
use crate::peaks::fitter::FitOutcome;

use plotters::prelude::*;
use std::path::{Path, PathBuf};

/// 拟合曲线的采样步长（q 单位）
const FIT_GRID_STEP: f64 = 1e-4;

/// 拟合曲线的最大采样点数
const FIT_GRID_MAX_POINTS: usize = 5000;

/// 图表输出选项
#[derive(Debug, Clone)]
pub struct PlotOptions {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub use_svg: bool,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            title: String::new(),
            width: 1200,
            height: 800,
            use_svg: false,
        }
    }
}

fn plot_err<E: std::fmt::Debug>(e: E) -> BraggError {
    BraggError::PlotError(format!("{:?}", e))
}

/// 总览图的数据：[lo, hi] 内强度为正的点（log 轴无法显示非正值）
pub fn overview_series(curve: &Curve, lo_lim: f64, hi_lim: f64) -> Vec<(f64, f64)> {
    curve
        .points_between(lo_lim, hi_lim)
        .into_iter()
        .filter(|(_, i)| *i > 0.0 && i.is_finite())
        .collect()
}

/// log 轴的 y 范围，上下各留出一点余量
pub fn log_range(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values
        .into_iter()
        .filter(|v| *v > 0.0 && v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    if !min.is_finite() {
        return (0.1, 10.0);
    }
    (min / 1.5, max * 1.5)
}

/// 在 [q_min, q_max] 上生成拟合曲线的采样网格
pub fn fit_grid(q_min: f64, q_max: f64) -> Vec<f64> {
    if !(q_max > q_min) {
        return vec![q_min];
    }
    let n = (((q_max - q_min) / FIT_GRID_STEP).round() as usize + 1).min(FIT_GRID_MAX_POINTS);
    let step = (q_max - q_min) / (n - 1).max(1) as f64;
    (0..n).map(|i| q_min + i as f64 * step).collect()
}

/// 生成总览图 (PNG 或 SVG)
pub fn generate_overview_plot(
    curve: &Curve,
    lo_lim: f64,
    hi_lim: f64,
    peaks: &PeakSet,
    output_path: &Path,
    options: &PlotOptions,
) -> Result<()> {
    let size = (options.width, options.height);
    if options.use_svg {
        let root = SVGBackend::new(output_path, size).into_drawing_area();
        draw_overview(&root, curve, lo_lim, hi_lim, peaks, &options.title)?;
        root.present().map_err(plot_err)?;
    } else {
        let root = BitMapBackend::new(output_path, size).into_drawing_area();
        draw_overview(&root, curve, lo_lim, hi_lim, peaks, &options.title)?;
        root.present().map_err(plot_err)?;
    }
    Ok(())
}

fn draw_overview<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    curve: &Curve,
    lo_lim: f64,
    hi_lim: f64,
    peaks: &PeakSet,
    title: &str,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).map_err(plot_err)?;

    let data = overview_series(curve, lo_lim, hi_lim);
    let (y_min, y_max) = log_range(data.iter().map(|(_, y)| *y));

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 28).into_font())
        .margin(30)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(lo_lim..hi_lim, (y_min..y_max).log_scale())
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("q (Å⁻¹)")
        .y_desc("Intensity (A.U.)")
        .x_label_style(("sans-serif", 16))
        .y_label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 18))
        .draw()
        .map_err(plot_err)?;

    let line_color = RGBColor(0, 102, 204);
    chart
        .draw_series(LineSeries::new(data, line_color.stroke_width(2)))
        .map_err(plot_err)?;

    let marker_color = RGBColor(0, 153, 51);
    for &q in peaks {
        if q <= lo_lim || q >= hi_lim {
            continue;
        }
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(q, y_min), (q, y_max)],
                marker_color.stroke_width(1),
            )))
            .map_err(plot_err)?;
    }

    Ok(())
}

/// 生成单次拟合的诊断图 (PNG 或 SVG)
pub fn generate_fit_plot(
    q: &[f64],
    intensity: &[f64],
    outcome: &FitOutcome,
    output_path: &Path,
    options: &PlotOptions,
) -> Result<()> {
    let size = (options.width, options.height);
    if options.use_svg {
        let root = SVGBackend::new(output_path, size).into_drawing_area();
        draw_fit(&root, q, intensity, outcome, &options.title)?;
        root.present().map_err(plot_err)?;
    } else {
        let root = BitMapBackend::new(output_path, size).into_drawing_area();
        draw_fit(&root, q, intensity, outcome, &options.title)?;
        root.present().map_err(plot_err)?;
    }
    Ok(())
}

/// 有限值的 (min, max)；没有有限值时报错
fn finite_range(values: impl IntoIterator<Item = f64>) -> Result<(f64, f64)> {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if lo.is_finite() && hi.is_finite() {
        Ok((lo, hi))
    } else {
        Err(BraggError::PlotError("no finite values to plot".to_string()))
    }
}

fn draw_fit<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    q: &[f64],
    intensity: &[f64],
    outcome: &FitOutcome,
    title: &str,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).map_err(plot_err)?;

    let q_min = q.iter().copied().fold(f64::INFINITY, f64::min);
    let q_max = q.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !q_min.is_finite() || !q_max.is_finite() {
        return Err(BraggError::PlotError("fit window is empty".to_string()));
    }

    let model = outcome.model;
    let grid = fit_grid(q_min, q_max);
    let best: Vec<(f64, f64)> = grid.iter().map(|&x| (x, model.eval(x))).collect();
    let background: Vec<(f64, f64)> = grid
        .iter()
        .map(|&x| (x, model.background.eval(x)))
        .collect();
    let component: Vec<(f64, f64)> = grid.iter().map(|&x| (x, model.peak.eval(x))).collect();

    let all_y = intensity
        .iter()
        .chain(best.iter().map(|(_, y)| y))
        .chain(background.iter().map(|(_, y)| y))
        .chain(component.iter().map(|(_, y)| y))
        .copied();
    let (y_lo, y_hi) = finite_range(all_y)?;
    let pad = ((y_hi - y_lo) * 0.05).max(1e-12);
    let (y_min, y_max) = (y_lo - pad, y_hi + pad);

    let x_pad = (q_max - q_min) * 0.02;
    let (x_min, x_max) = (q_min - x_pad, q_max + x_pad.max(1e-12));

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 24).into_font())
        .margin(30)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("q (Å⁻¹)")
        .y_desc("Intensity (A.U.)")
        .x_label_style(("sans-serif", 14))
        .y_label_style(("sans-serif", 14))
        .axis_desc_style(("sans-serif", 16))
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(
            q.iter()
                .zip(intensity)
                .map(|(x, y)| Circle::new((*x, *y), 4, BLACK.filled())),
        )
        .map_err(plot_err)?
        .label("data")
        .legend(|(x, y)| Circle::new((x, y), 4, BLACK.filled()));

    let fit_color = RGBColor(204, 0, 0);
    chart
        .draw_series(LineSeries::new(best, fit_color.stroke_width(2)))
        .map_err(plot_err)?
        .label("best fit")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], fit_color));

    let light = RGBColor(150, 150, 150);
    chart
        .draw_series(LineSeries::new(background, light.stroke_width(1)))
        .map_err(plot_err)?
        .label("background")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], light));

    let peak_light = RGBColor(255, 153, 102);
    chart
        .draw_series(LineSeries::new(component, peak_light.stroke_width(1)))
        .map_err(plot_err)?
        .label("peak")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], peak_light));

    let markers = [
        (outcome.initial.peak.center, RGBColor(0, 153, 51)),
        (outcome.center(), RGBColor(0, 102, 204)),
    ];
    for (center, color) in markers {
        if !center.is_finite() || center < x_min || center > x_max {
            continue;
        }
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(center, y_min), (center, y_max)],
                color.stroke_width(2),
            )))
            .map_err(plot_err)?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(plot_err)?;

    Ok(())
}

/// 在流程结束时绘制总览图的观察者
pub struct OverviewPlot {
    pub path: PathBuf,
    pub options: PlotOptions,
}

impl FinderObserver for OverviewPlot {
    fn on_peaks(&self, curve: &Curve, lo_lim: f64, hi_lim: f64, peaks: &PeakSet) -> Result<()> {
        generate_overview_plot(curve, lo_lim, hi_lim, peaks, &self.path, &self.options)
    }
}

/// 为每次拟合在目录中生成一张诊断图的观察者
pub struct FitPlotDir {
    pub dir: PathBuf,
    pub options: PlotOptions,
}

impl FitPlotDir {
    /// 某次拟合对应的输出文件
    pub fn path_for(&self, job: &FitJob) -> PathBuf {
        let ext = if self.options.use_svg { "svg" } else { "png" };
        self.dir.join(format!(
            "fit_{:05}_w{}.{}",
            job.candidate.index, job.half_width, ext
        ))
    }
}

impl FinderObserver for FitPlotDir {
    fn on_fit(&self, curve: &Curve, job: &FitJob, outcome: &FitOutcome) -> Result<()> {
        let window = curve.window(job.candidate.index, job.half_width)?;
        let options = PlotOptions {
            title: format!(
                "q0 = {:.4}, w = {}, center = {:.5}",
                job.candidate.q,
                job.half_width,
                outcome.center()
            ),
            ..self.options.clone()
        };
        generate_fit_plot(
            window.q,
            window.intensity,
            outcome,
            &self.path_for(job),
            &options,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Candidate;
    use crate::peaks::fitter::PeakFitter;
    use crate::peaks::model::{PeakModel, N_PARAMS};

    fn fonts_available() -> bool {
        ("sans-serif", 12).into_font().box_size("x").is_ok()
    }

    fn window() -> (Vec<f64>, Vec<f64>) {
        let q: Vec<f64> = (0..12).map(|i| 1.4 + i as f64 * 0.015).collect();
        let y: Vec<f64> = q
            .iter()
            .map(|x| 1.0 + 10.0 * (-(x - 1.5) * (x - 1.5) / 0.005).exp())
            .collect();
        (q, y)
    }

    fn curve() -> Curve {
        Curve::new(
            vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6],
            vec![5.0, -1.0, 0.0, 20.0, 8.0, 3.0],
        )
        .unwrap()
    }

    #[test]
    fn test_overview_series_skips_non_positive() {
        let data = overview_series(&curve(), 0.15, 0.55);
        assert_eq!(data, vec![(0.4, 20.0), (0.5, 8.0)]);
    }

    #[test]
    fn test_log_range() {
        let (lo, hi) = log_range([2.0, 0.0, 30.0, -4.0]);
        assert!((lo - 2.0 / 1.5).abs() < 1e-12);
        assert!((hi - 45.0).abs() < 1e-12);

        let (lo, hi) = log_range(Vec::new());
        assert!(lo > 0.0 && lo < hi);
    }

    #[test]
    fn test_fit_grid() {
        let grid = fit_grid(1.0, 1.01);
        assert_eq!(grid.len(), 101);
        assert!((grid[0] - 1.0).abs() < 1e-12);
        assert!((grid[100] - 1.01).abs() < 1e-12);

        let capped = fit_grid(0.0, 3.0);
        assert_eq!(capped.len(), FIT_GRID_MAX_POINTS);
        assert!((capped[FIT_GRID_MAX_POINTS - 1] - 3.0).abs() < 1e-12);

        assert_eq!(fit_grid(2.0, 2.0), vec![2.0]);
    }

    #[test]
    fn test_finite_range() {
        let (lo, hi) = finite_range([3.0, f64::NAN, -1.0, f64::INFINITY]).unwrap();
        assert_eq!((lo, hi), (-1.0, 3.0));

        assert!(matches!(
            finite_range([f64::NAN, f64::NEG_INFINITY]),
            Err(BraggError::PlotError(_))
        ));
        assert!(finite_range(Vec::new()).is_err());
    }

    #[test]
    fn test_fit_plot_rejects_all_non_finite() {
        let (q, y) = window();
        let mut outcome = PeakFitter::default().fit(&q, &y, 1.49, 6).unwrap();
        outcome.model = PeakModel::from_params(&[f64::NAN; N_PARAMS]);
        let nan_y = vec![f64::NAN; q.len()];

        let path = std::env::temp_dir().join("braggpeaks_plot_nan.svg");
        let svg = PlotOptions {
            use_svg: true,
            ..Default::default()
        };
        match generate_fit_plot(&q, &nan_y, &outcome, &path, &svg) {
            Err(BraggError::PlotError(msg)) => assert!(msg.contains("no finite values"), "{}", msg),
            other => panic!("expected PlotError, got {:?}", other),
        }
    }

    #[test]
    fn test_fit_plot_path() {
        let observer = FitPlotDir {
            dir: PathBuf::from("fits"),
            options: PlotOptions::default(),
        };
        let job = FitJob {
            candidate: Candidate { index: 42, q: 1.3 },
            half_width: 7,
        };
        assert_eq!(observer.path_for(&job), PathBuf::from("fits/fit_00042_w7.png"));
    }

    #[test]
    fn test_render_plots() {
        let dir = std::env::temp_dir().join("braggpeaks_plot_test");
        std::fs::create_dir_all(&dir).unwrap();

        let (q, y) = window();
        let outcome = PeakFitter::default().fit(&q, &y, 1.49, 6).unwrap();
        let curve = Curve::new(q.clone(), y.clone()).unwrap();
        let peaks = PeakSet::from_centers(vec![outcome.center()]);

        let svg = PlotOptions {
            use_svg: true,
            ..Default::default()
        };
        let results = [
            (
                dir.join("overview.svg"),
                generate_overview_plot(&curve, 1.4, 1.6, &peaks, &dir.join("overview.svg"), &svg),
            ),
            (
                dir.join("fit.svg"),
                generate_fit_plot(&q, &y, &outcome, &dir.join("fit.svg"), &svg),
            ),
        ];

        // 没有可用字体时 plotters 无法排版文字，只要求错误被正确归类
        let fonts = fonts_available();
        for (path, result) in results {
            if fonts {
                assert!(result.is_ok(), "{}: {:?}", path.display(), result);
                assert!(path.exists());
            } else {
                assert!(matches!(result, Err(BraggError::PlotError(_))));
            }
        }
    }
}
