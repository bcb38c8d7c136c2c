//! # fit 子命令实现
//!
//! 在给定 q 附近截取一个窗口做单次拟合，打印完整的拟合报告，可选绘制诊断图。
//!
//! ## 依赖关系
//! - 使用 `cli/fit.rs` 定义的 FitArgs
//! - 使用 `peaks/fitter.rs` 和 `peaks/plot.rs`
//! - 使用 `parsers/` 读取曲线

use crate::cli::fit::FitArgs;
use crate::error::Result;
use crate::parsers;
use crate::peaks::plot::{self, PlotOptions};
use crate::peaks::PeakFitter;
use crate::utils::output;

/// 执行单峰拟合
pub fn execute(args: FitArgs) -> Result<()> {
    output::print_header("Single Peak Fit");

    let curve = parsers::parse_curve_file(&args.input)?;
    let index = curve.nearest_index(args.center);
    let approx_center = curve.q()[index];

    output::print_info(&format!(
        "Nearest sample to q = {} is #{} (q = {:.5})",
        args.center, index, approx_center
    ));

    let window = curve.window(index, args.half_width)?;
    let (q_min, q_max) = window.q_span();
    let (i_min, i_max) = window.intensity_span();
    output::print_info(&format!(
        "Window: {} samples, q = {:.5} .. {:.5}, I = {:.4e} .. {:.4e}",
        window.len(),
        q_min,
        q_max,
        i_min,
        i_max
    ));
    let outcome = PeakFitter::default().fit(
        window.q,
        window.intensity,
        approx_center,
        args.half_width,
    )?;

    output::print_separator();
    println!("{}", outcome);
    output::print_separator();

    match outcome.rejection_reason() {
        None => output::print_success(&format!("Fitted center: q = {:.6}", outcome.center())),
        Some(reason) => output::print_warning(&format!(
            "Fit not accepted ({}); center estimate q = {:.6}",
            reason,
            outcome.center()
        )),
    }

    if let Some(path) = &args.plot {
        let options = PlotOptions {
            title: format!(
                "q0 = {:.4}, w = {}, center = {:.5}",
                approx_center,
                args.half_width,
                outcome.center()
            ),
            width: args.width,
            height: args.height,
            use_svg: args.svg,
        };
        plot::generate_fit_plot(window.q, window.intensity, &outcome, path, &options)?;
        output::print_success(&format!("Plot saved to '{}'", path.display()));
    }

    output::print_done("Fit complete");
    Ok(())
}
