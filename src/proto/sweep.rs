//! 派生指标扫描
//!
//! 每个点都由分片计划的公式重新推导，不运行仿真，供图表使用。

use serde::{Deserialize, Serialize};

use super::plan::{TransmissionMode, fragment, service_traffic};
use crate::error::PlanError;

/// 曲线上的一个 (x, y) 采样点
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub x: f64,
    pub y: f64,
}

/// 图表的 MTU 取值范围：50..=1500 字节，步长 10
pub fn default_mtu_domain() -> impl Iterator<Item = u32> {
    (50..=1500).step_by(10)
}

/// 图表的误码概率取值范围：0..=80（百分比），步长 2
pub fn default_error_domain() -> impl Iterator<Item = u32> {
    (0..=80).step_by(2)
}

/// 服务流量（字节）随 MTU 的变化；不超过包头大小的 MTU 跳过
pub fn traffic_vs_mtu(
    message_size: u64,
    mode: TransmissionMode,
    mtus: impl IntoIterator<Item = u32>,
) -> Vec<SweepPoint> {
    mtus.into_iter()
        .filter_map(|mtu| {
            let (_, packets) = fragment(message_size, mtu).ok()?;
            Some(SweepPoint {
                x: mtu as f64,
                y: service_traffic(packets, mode) as f64,
            })
        })
        .collect()
}

/// 包数随 MTU 的变化
pub fn packets_vs_mtu(message_size: u64, mtus: impl IntoIterator<Item = u32>) -> Vec<SweepPoint> {
    mtus.into_iter()
        .filter_map(|mtu| {
            let (_, packets) = fragment(message_size, mtu).ok()?;
            Some(SweepPoint {
                x: mtu as f64,
                y: packets as f64,
            })
        })
        .collect()
}

/// 无丢包时一次传输的总流量：报文 + 服务流量
pub fn base_traffic(message_size: u64, mtu: u32, mode: TransmissionMode) -> Result<u64, PlanError> {
    let (_, packets) = fragment(message_size, mtu)?;
    Ok(message_size.saturating_add(service_traffic(packets, mode)))
}

/// 丢包概率 `p` 下的期望总流量：`base / (1 - p)`。
///
/// `p` 不在 [0, 1) 内时无定义，返回 None。
pub fn expected_traffic(base: u64, p: f64) -> Option<f64> {
    if !(0.0..1.0).contains(&p) {
        return None;
    }
    Some(base as f64 / (1.0 - p))
}

/// 期望总流量随误码概率（百分比）的变化；100 及以上不在定义域内，跳过
pub fn traffic_vs_error(base: u64, error_percents: impl IntoIterator<Item = u32>) -> Vec<SweepPoint> {
    error_percents
        .into_iter()
        .filter_map(|e| {
            let y = expected_traffic(base, e as f64 / 100.0)?;
            Some(SweepPoint { x: e as f64, y })
        })
        .collect()
}
