//! # 峰位去重
//!
//! 同一个真实峰会被多个候选点、多个窗口宽度重复拟合，得到一组几乎相同的中心。
//! 对每个中心，取与其距离小于容差的所有中心（含自身）的平均值；
//! 最后排序并按精确值去重。
//!
//! 簇按每个元素独立重新计算（两两比较），不做连通分量合并：
//! 链式相邻（a–b、b–c 在容差内而 a–c 不在）时会得到多个不同的平均值。
//!
//! ## 依赖关系
//! - 被 `peaks/finder.rs` 调用
//! - 使用 `models/peak.rs` 的 PeakSet

use crate::models::PeakSet;

/// 默认去重容差（q 单位）
pub const DEFAULT_TOLERANCE: f64 = 0.01;

/// 合并容差内的重复峰位
///
/// 非有限值不属于任何簇（包括其自身），因此被丢弃。
pub fn dedupe(centers: &[f64], tolerance: f64) -> PeakSet {
    let representatives = centers
        .iter()
        .filter_map(|&c| {
            let members: Vec<f64> = centers
                .iter()
                .copied()
                .filter(|other| (other - c).abs() < tolerance)
                .collect();

            match members.len() {
                0 => None,
                1 => Some(c),
                n => Some(members.iter().sum::<f64>() / n as f64),
            }
        })
        .collect();

    PeakSet::from_centers(representatives)
}
