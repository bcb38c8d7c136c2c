//! # find 子命令实现
//!
//! 读取 I(q) 曲线，运行 候选检测 → 窗口拟合 → 去重 流程，打印峰位表格，
//! 并按需导出峰位、绘制总览图和逐次拟合的诊断图。
//!
//! ## 依赖关系
//! - 使用 `cli/find.rs` 定义的 FindArgs
//! - 使用 `peaks::find_peaks` 完成读取与查找，`peaks/` 其余模块负责绘图和导出

use crate::cli::find::FindArgs;
use crate::error::{BraggError, Result};
use crate::models::{Candidate, Curve, PeakSet};
use crate::peaks::export;
use crate::peaks::plot::{FitPlotDir, OverviewPlot, PlotOptions};
use crate::peaks::{find_peaks, FinderConfig, FinderObserver, FitJob, FitOutcome, FitPolicy};
use crate::utils::{output, progress};

use indicatif::ProgressBar;
use std::fs;

/// 执行峰位查找
pub fn execute(args: FindArgs) -> Result<()> {
    output::print_header("Bragg Peak Search");

    let config = FinderConfig {
        half_widths: args.min_half_width..=args.max_half_width,
        tolerance: args.tolerance,
        policy: if args.strict {
            FitPolicy::Strict
        } else {
            FitPolicy::Permissive
        },
        jobs: args.jobs,
        ..FinderConfig::new(args.sensitivity, args.lo, args.hi)
    };
    let fits_per_candidate = config.half_widths.clone().count();

    output::print_info(&format!(
        "Search window: {} < q < {}, sensitivity {}",
        args.lo, args.hi, args.sensitivity
    ));

    let source_name = args
        .input
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("curve")
        .to_string();

    let options = PlotOptions {
        title: args.title.clone().unwrap_or_else(|| source_name.clone()),
        width: args.width,
        height: args.height,
        use_svg: args.svg,
    };

    let fit_plots = match &args.debug_fits {
        Some(dir) => {
            fs::create_dir_all(dir).map_err(|e| BraggError::FileWriteError {
                path: dir.display().to_string(),
                source: e,
            })?;
            Some(FitPlotDir {
                dir: dir.clone(),
                options: options.clone(),
            })
        }
        None => None,
    };

    let observer = CommandObserver {
        progress: progress::create_progress_bar(0, "Fitting candidates"),
        fits_per_candidate,
        overview: args.plot.as_ref().map(|path| OverviewPlot {
            path: path.clone(),
            options: options.clone(),
        }),
        fit_plots,
    };

    let result = find_peaks(&args.input, config, &observer);
    observer.progress.finish_and_clear();
    let report = result?;

    output::print_info(&format!(
        "Candidates: {}, fits: {}",
        report.candidates.len(),
        report.fits.len()
    ));
    if report.unconverged > 0 {
        output::print_warning(&format!(
            "{} of {} fits did not converge or left their window (results kept)",
            report.unconverged,
            report.fits.len()
        ));
    }

    if report.peaks.is_empty() {
        output::print_warning("No peaks found in the search window");
    } else {
        print_peak_table(&report.peaks);
    }

    if let Some(path) = &args.output {
        export::export_peaks(&report.peaks, &source_name, path)?;
        output::print_success(&format!("Peaks saved to '{}'", path.display()));
    }
    if let Some(path) = &args.plot {
        output::print_success(&format!("Plot saved to '{}'", path.display()));
    }
    if let Some(dir) = &args.debug_fits {
        output::print_success(&format!(
            "{} fit plots saved to '{}'",
            report.fits.len(),
            dir.display()
        ));
    }

    output::print_done(&format!("Found {} peaks", report.peaks.len()));
    Ok(())
}

/// 进度条 + 可选绘图
struct CommandObserver {
    progress: ProgressBar,
    fits_per_candidate: usize,
    overview: Option<OverviewPlot>,
    fit_plots: Option<FitPlotDir>,
}

impl FinderObserver for CommandObserver {
    fn on_curve(&self, curve: &Curve) {
        self.progress.suspend(|| {
            output::print_info(&format!(
                "Loaded {} samples (q = {:.4} .. {:.4})",
                curve.len(),
                curve.q().first().copied().unwrap_or(f64::NAN),
                curve.q().last().copied().unwrap_or(f64::NAN),
            ))
        });
    }

    fn on_candidates(&self, candidates: &[Candidate]) {
        self.progress
            .set_length((candidates.len() * self.fits_per_candidate) as u64);
    }

    fn on_fit(&self, curve: &Curve, job: &FitJob, outcome: &FitOutcome) -> Result<()> {
        if let Some(plots) = &self.fit_plots {
            plots.on_fit(curve, job, outcome)?;
        }
        self.progress.inc(1);
        Ok(())
    }

    fn on_peaks(&self, curve: &Curve, lo_lim: f64, hi_lim: f64, peaks: &PeakSet) -> Result<()> {
        match &self.overview {
            Some(plot) => plot.on_peaks(curve, lo_lim, hi_lim, peaks),
            None => Ok(()),
        }
    }
}

/// 打印峰位表格
fn print_peak_table(peaks: &PeakSet) {
    use tabled::{Table, Tabled};

    #[derive(Tabled)]
    struct PeakRow {
        #[tabled(rename = "#")]
        index: usize,
        #[tabled(rename = "q (Å⁻¹)")]
        q: String,
        #[tabled(rename = "d (Å)")]
        d_spacing: String,
    }

    let rows: Vec<PeakRow> = peaks
        .iter()
        .zip(peaks.d_spacings())
        .enumerate()
        .map(|(i, (q, d))| PeakRow {
            index: i + 1,
            q: format!("{:.5}", q),
            d_spacing: format!("{:.4}", d),
        })
        .collect();

    output::print_header(&format!("{} Bragg Peaks", rows.len()));
    let table = Table::new(&rows);
    println!("{}", table);
}
