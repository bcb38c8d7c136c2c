//! # 峰位查找流程
//!
//! 串联候选峰检测 → 逐候选峰、逐窗口宽度拟合 → 去重，得到最终峰位集合。
//!
//! ## 流程
//! 1. `detector::detect` 得到 (lo_lim, hi_lim) 内的候选峰
//! 2. 对每个候选峰、每个半宽 w ∈ [min, max] 截取窗口并拟合（rayon 并行）
//! 3. 将全部拟合中心交给 `dedupe` 合并
//! 4. 通过 `FinderObserver` 回调通知绘图等外部关注者
//!
//! ## 依赖关系
//! - 被 `commands/find.rs` 调用
//! - 使用 `peaks/detector.rs`, `peaks/fitter.rs`, `peaks/dedupe.rs`
//! - 使用 `rayon` 进行并行拟合

use crate::error::{BraggError, Result};
use crate::models::{Candidate, Curve, FitResult, PeakSet};
use crate::parsers::parse_curve_file;
use crate::peaks::dedupe::{self, DEFAULT_TOLERANCE};
use crate::peaks::detector;
use crate::peaks::fitter::{FitOutcome, FitPolicy, PeakFitter};

use rayon::prelude::*;
use std::ops::RangeInclusive;
use std::path::Path;

/// 默认拟合窗口半宽范围
pub const DEFAULT_HALF_WIDTHS: RangeInclusive<usize> = 3..=9;

/// 峰位查找配置
#[derive(Debug, Clone)]
pub struct FinderConfig {
    /// 搜索宽度上界（不含），越小越敏感
    pub sensitivity: f64,
    /// q 下限（不含）
    pub lo_lim: f64,
    /// q 上限（不含）
    pub hi_lim: f64,
    /// 拟合窗口半宽范围
    pub half_widths: RangeInclusive<usize>,
    /// 去重容差
    pub tolerance: f64,
    /// 未收敛拟合的处理策略
    pub policy: FitPolicy,
    /// 并行作业数（0 = 自动）
    pub jobs: usize,
}

impl FinderConfig {
    /// 使用默认拟合参数创建配置
    pub fn new(sensitivity: f64, lo_lim: f64, hi_lim: f64) -> Self {
        Self {
            sensitivity,
            lo_lim,
            hi_lim,
            half_widths: DEFAULT_HALF_WIDTHS,
            tolerance: DEFAULT_TOLERANCE,
            policy: FitPolicy::default(),
            jobs: 0,
        }
    }

    /// 检查参数合法性
    pub fn validate(&self) -> Result<()> {
        if !self.lo_lim.is_finite() || !self.hi_lim.is_finite() || self.lo_lim >= self.hi_lim {
            return Err(BraggError::InvalidRange(format!(
                "{}-{} (q limits must be finite with lo < hi)",
                self.lo_lim, self.hi_lim
            )));
        }
        detector::search_widths(self.sensitivity)?;
        if self.half_widths.is_empty() || *self.half_widths.start() == 0 {
            return Err(BraggError::InvalidArgument(format!(
                "fit half-widths {}..={} must be a non-empty range of positive values",
                self.half_widths.start(),
                self.half_widths.end()
            )));
        }
        if !(self.tolerance > 0.0) || !self.tolerance.is_finite() {
            return Err(BraggError::InvalidArgument(format!(
                "deduplication tolerance must be positive (got {})",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// 单个拟合任务：候选峰 × 窗口半宽
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitJob {
    pub candidate: Candidate,
    pub half_width: usize,
}

/// 流程中各阶段的回调
///
/// 所有方法默认什么也不做。`on_fit` 可能在多个线程中并发调用。
pub trait FinderObserver: Sync {
    /// 曲线已读入
    fn on_curve(&self, _curve: &Curve) {}

    /// 候选峰检测完成
    fn on_candidates(&self, _candidates: &[Candidate]) {}

    /// 一次拟合完成
    fn on_fit(&self, _curve: &Curve, _job: &FitJob, _outcome: &FitOutcome) -> Result<()> {
        Ok(())
    }

    /// 最终峰位已确定
    fn on_peaks(&self, _curve: &Curve, _lo_lim: f64, _hi_lim: f64, _peaks: &PeakSet) -> Result<()> {
        Ok(())
    }
}

/// 查找结果
#[derive(Debug, Clone)]
pub struct FindReport {
    pub candidates: Vec<Candidate>,
    /// 每个拟合任务的结果，与任务顺序一致
    pub fits: Vec<(FitJob, FitResult)>,
    /// 不可接受的拟合数（未收敛、统计量非有限或中心离开窗口）
    pub unconverged: usize,
    pub peaks: PeakSet,
}

/// 峰位查找器
pub struct PeakFinder {
    config: FinderConfig,
    fitter: PeakFitter,
}

impl PeakFinder {
    /// 创建查找器（会校验配置）
    pub fn new(config: FinderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            fitter: PeakFitter::default(),
        })
    }

    /// 生成 (候选峰, 半宽) 任务列表
    pub fn jobs(&self, candidates: &[Candidate]) -> Vec<FitJob> {
        candidates
            .iter()
            .flat_map(|&candidate| {
                self.config
                    .half_widths
                    .clone()
                    .map(move |half_width| FitJob {
                        candidate,
                        half_width,
                    })
            })
            .collect()
    }

    /// 执行单个拟合任务
    pub fn run_job(&self, curve: &Curve, job: &FitJob) -> Result<FitOutcome> {
        let window = curve.window(job.candidate.index, job.half_width)?;
        let outcome = self.fitter.fit(
            window.q,
            window.intensity,
            job.candidate.q,
            job.half_width,
        )?;
        self.config.policy.check(&outcome)?;
        Ok(outcome)
    }

    /// 对给定候选峰拟合并去重
    pub fn fit_candidates(
        &self,
        curve: &Curve,
        candidates: &[Candidate],
        observer: &dyn FinderObserver,
    ) -> Result<(Vec<(FitJob, FitResult)>, usize, PeakSet)> {
        let jobs = self.jobs(candidates);

        let jobs_n = if self.config.jobs == 0 {
            num_cpus::get()
        } else {
            self.config.jobs
        };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs_n)
            .build()
            .map_err(|e| BraggError::Other(format!("failed to build worker pool: {}", e)))?;

        let outcomes: Vec<Result<(FitJob, FitOutcome)>> = pool.install(|| {
            jobs.par_iter()
                .map(|job| {
                    let outcome = self.run_job(curve, job)?;
                    observer.on_fit(curve, job, &outcome)?;
                    Ok((*job, outcome))
                })
                .collect()
        });

        let mut fits = Vec::with_capacity(outcomes.len());
        let mut unconverged = 0;
        for item in outcomes {
            let (job, outcome) = item?;
            if !outcome.is_acceptable() {
                unconverged += 1;
            }
            fits.push((job, outcome.result()));
        }

        let centers: Vec<f64> = fits.iter().map(|(_, fit)| fit.center).collect();
        let peaks = dedupe::dedupe(&centers, self.config.tolerance);

        Ok((fits, unconverged, peaks))
    }

    /// 完整流程：检测 → 拟合 → 去重
    pub fn find(&self, curve: &Curve, observer: &dyn FinderObserver) -> Result<FindReport> {
        let candidates = detector::detect(
            curve,
            self.config.sensitivity,
            self.config.lo_lim,
            self.config.hi_lim,
        )?;
        observer.on_candidates(&candidates);

        let (fits, unconverged, peaks) = self.fit_candidates(curve, &candidates, observer)?;
        observer.on_peaks(curve, self.config.lo_lim, self.config.hi_lim, &peaks)?;

        Ok(FindReport {
            candidates,
            fits,
            unconverged,
            peaks,
        })
    }
}

/// 读取曲线文件并查找峰位
///
/// 先校验配置再读文件。需要绘图时传入绘图观察者（例如 `OverviewPlot`），
/// 它会在结束时收到曲线、q 窗口和最终峰位。
pub fn find_peaks(
    path: &Path,
    config: FinderConfig,
    observer: &dyn FinderObserver,
) -> Result<FindReport> {
    let finder = PeakFinder::new(config)?;
    let curve = parse_curve_file(path)?;
    observer.on_curve(&curve);
    finder.find(&curve, observer)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::peaks::model::{LinearBackground, PeakModel, PseudoVoigt};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct NoopObserver;

    impl FinderObserver for NoopObserver {}

    /// 线性背景 + 若干 pseudo-Voigt 峰，在 [0, 3] 上等距采样 200 点
    pub(crate) fn synthetic_curve(centers: &[f64]) -> Curve {
        let background = LinearBackground {
            slope: 0.5,
            intercept: 1.0,
        };
        let peaks: Vec<PseudoVoigt> = centers
            .iter()
            .map(|&center| PseudoVoigt {
                center,
                sigma: 0.05,
                amplitude: 10.0,
            })
            .collect();

        let q: Vec<f64> = (0..200).map(|i| 3.0 * i as f64 / 199.0).collect();
        let intensity = q
            .iter()
            .map(|&x| background.eval(x) + peaks.iter().map(|p| p.eval(x)).sum::<f64>())
            .collect();
        Curve::new(q, intensity).unwrap()
    }

    fn finder() -> PeakFinder {
        PeakFinder::new(FinderConfig::new(8.0, 0.1, 2.9)).unwrap()
    }

    #[test]
    fn test_config_validation() {
        assert!(FinderConfig::new(8.0, 0.1, 2.9).validate().is_ok());
        assert!(FinderConfig::new(8.0, 2.9, 0.1).validate().is_err());
        assert!(FinderConfig::new(8.0, 1.0, 1.0).validate().is_err());
        assert!(FinderConfig::new(1.0, 0.1, 2.9).validate().is_err());
        assert!(FinderConfig::new(1e30, 0.1, 2.9).validate().is_err());

        let mut config = FinderConfig::new(8.0, 0.1, 2.9);
        config.half_widths = 0..=4;
        assert!(config.validate().is_err());

        let mut config = FinderConfig::new(8.0, 0.1, 2.9);
        config.tolerance = 0.0;
        assert!(PeakFinder::new(config).is_err());
    }

    #[test]
    fn test_jobs_cover_every_half_width() {
        let finder = finder();
        let candidates = [
            Candidate { index: 50, q: 0.75 },
            Candidate { index: 120, q: 1.8 },
        ];
        let jobs = finder.jobs(&candidates);

        assert_eq!(jobs.len(), 14);
        assert_eq!(jobs[0].half_width, 3);
        assert_eq!(jobs[6].half_width, 9);
        assert_eq!(jobs[7].candidate.index, 120);
    }

    #[test]
    fn test_single_peak() {
        let curve = synthetic_curve(&[1.5]);
        let report = finder().find(&curve, &NoopObserver).unwrap();

        assert_eq!(report.peaks.len(), 1, "peaks: {:?}", report.peaks);
        assert!((report.peaks.as_slice()[0] - 1.5).abs() < 0.01);
        assert_eq!(report.fits.len(), report.candidates.len() * 7);
    }

    #[test]
    fn test_two_separated_peaks() {
        let curve = synthetic_curve(&[1.0, 2.0]);
        let report = finder().find(&curve, &NoopObserver).unwrap();
        let peaks = report.peaks.as_slice();

        assert_eq!(peaks.len(), 2, "peaks: {:?}", peaks);
        assert!((peaks[0] - 1.0).abs() < 0.01);
        assert!((peaks[1] - 2.0).abs() < 0.01);
        assert!(peaks[0] < peaks[1]);
    }

    #[test]
    fn test_no_candidates_in_window() {
        let curve = synthetic_curve(&[1.5]);
        let finder = PeakFinder::new(FinderConfig::new(8.0, 2.0, 2.5)).unwrap();
        let report = finder.find(&curve, &NoopObserver).unwrap();

        assert!(report.candidates.is_empty());
        assert!(report.fits.is_empty());
        assert!(report.peaks.is_empty());
    }

    #[test]
    fn test_degenerate_candidates_collapse() {
        // 同一个峰被报告在相邻的三个采样点上
        let curve = synthetic_curve(&[1.5]);
        let candidates: Vec<Candidate> = [99, 100, 101]
            .iter()
            .map(|&index| Candidate {
                index,
                q: curve.q()[index],
            })
            .collect();

        let (fits, _, peaks) = finder()
            .fit_candidates(&curve, &candidates, &NoopObserver)
            .unwrap();

        assert_eq!(fits.len(), 21);
        assert_eq!(peaks.len(), 1, "peaks: {:?}", peaks);
        assert!((peaks.as_slice()[0] - 1.5).abs() < 0.01);
    }

    #[test]
    fn test_candidate_at_curve_edge() {
        let curve = synthetic_curve(&[1.5]);
        let candidates = [Candidate {
            index: 4,
            q: curve.q()[4],
        }];

        let result = finder().fit_candidates(&curve, &candidates, &NoopObserver);
        assert!(matches!(
            result,
            Err(BraggError::WindowOutOfBounds { index: 4, .. })
        ));
    }

    #[test]
    fn test_result_independent_of_thread_count() {
        let curve = synthetic_curve(&[1.0, 2.0]);

        let mut serial = FinderConfig::new(8.0, 0.1, 2.9);
        serial.jobs = 1;
        let mut parallel = FinderConfig::new(8.0, 0.1, 2.9);
        parallel.jobs = 4;

        let a = PeakFinder::new(serial).unwrap().find(&curve, &NoopObserver).unwrap();
        let b = PeakFinder::new(parallel).unwrap().find(&curve, &NoopObserver).unwrap();

        assert_eq!(a.peaks, b.peaks);
        assert_eq!(a.fits, b.fits);
    }

    #[test]
    fn test_find_peaks_from_file() {
        let curve = synthetic_curve(&[1.5]);
        let path = std::env::temp_dir().join("braggpeaks_finder_single.dat");
        let content: String = curve
            .q()
            .iter()
            .zip(curve.intensity())
            .map(|(q, i)| format!("{}\t{}\n", q, i))
            .collect();
        std::fs::write(&path, content).unwrap();

        let recorder = Recorder::default();
        let report = find_peaks(&path, FinderConfig::new(8.0, 0.1, 2.9), &recorder).unwrap();
        assert_eq!(recorder.samples.load(Ordering::Relaxed), curve.len());
        assert_eq!(recorder.fits.load(Ordering::Relaxed), report.fits.len());
        assert_eq!(report.peaks.len(), 1);
        assert!((report.peaks.as_slice()[0] - 1.5).abs() < 0.01);

        let missing = std::env::temp_dir().join("braggpeaks_finder_missing.dat");
        assert!(matches!(
            find_peaks(&missing, FinderConfig::new(8.0, 0.1, 2.9), &NoopObserver),
            Err(BraggError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_find_peaks_validates_before_reading() {
        let missing = std::env::temp_dir().join("braggpeaks_finder_missing.dat");
        assert!(matches!(
            find_peaks(&missing, FinderConfig::new(8.0, 2.9, 0.1), &NoopObserver),
            Err(BraggError::InvalidRange(_))
        ));
    }

    #[derive(Default)]
    struct Recorder {
        samples: AtomicUsize,
        fits: AtomicUsize,
        peaks: Mutex<Option<PeakSet>>,
    }

    impl FinderObserver for Recorder {
        fn on_curve(&self, curve: &Curve) {
            self.samples.store(curve.len(), Ordering::Relaxed);
        }

        fn on_fit(&self, _curve: &Curve, _job: &FitJob, _outcome: &FitOutcome) -> Result<()> {
            self.fits.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        fn on_peaks(&self, _curve: &Curve, lo: f64, hi: f64, peaks: &PeakSet) -> Result<()> {
            assert!(lo < hi);
            if let Ok(mut slot) = self.peaks.lock() {
                *slot = Some(peaks.clone());
            }
            Ok(())
        }
    }

    #[test]
    fn test_observer_receives_callbacks() {
        let curve = synthetic_curve(&[1.5]);
        let recorder = Recorder::default();

        let report = finder().find(&curve, &recorder).unwrap();
        assert_eq!(recorder.samples.load(Ordering::Relaxed), 0);

        assert_eq!(recorder.fits.load(Ordering::Relaxed), report.fits.len());
        assert_eq!(recorder.peaks.lock().unwrap().clone(), Some(report.peaks));
    }
}
