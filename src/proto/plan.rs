//! 传输计划
//!
//! 由报文大小、MTU 与传输模式得出分片数、每片载荷、服务流量与估计耗时。
//! 纯函数，无状态，扫描类分析可以逐点重新推导。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PlanError;

/// 固定包头大小（字节）
pub const HEADER_SIZE: u32 = 40;
/// 虚电路模式的控制交换次数：连接请求、连接确认、断开
pub const CONTROL_EXCHANGES: u64 = 3;
/// 名义链路速率（字节/毫秒）
pub const LINK_BYTES_PER_MS: f64 = 10.0;
/// 名义每跳时延（毫秒）
pub const HOP_LATENCY_MS: f64 = 10.0;
/// 虚电路握手/确认开销系数
pub const VIRTUAL_TIME_FACTOR: f64 = 1.2;

/// 传输模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransmissionMode {
    /// 面向连接：握手、带重传的数据传输、断开
    #[default]
    Virtual,
    /// 无连接：只有数据传输，不重传
    Datagram,
}

impl fmt::Display for TransmissionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransmissionMode::Virtual => f.write_str("Virtual"),
            TransmissionMode::Datagram => f.write_str("Datagram"),
        }
    }
}

impl FromStr for TransmissionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "virtual" | "vc" => Ok(TransmissionMode::Virtual),
            "datagram" | "dg" => Ok(TransmissionMode::Datagram),
            other => Err(format!("unknown transmission mode: {other}")),
        }
    }
}

/// 分片：返回 (每包最大载荷, 包数)
pub fn fragment(message_size: u64, packet_size: u32) -> Result<(u32, u64), PlanError> {
    if packet_size <= HEADER_SIZE {
        return Err(PlanError::InvalidMtu {
            packet_size,
            header_size: HEADER_SIZE,
        });
    }
    let max_payload = packet_size - HEADER_SIZE;
    Ok((max_payload, message_size.div_ceil(max_payload as u64)))
}

/// 服务流量：每包一个包头，虚电路模式另加三次控制交换
pub fn service_traffic(total_packets: u64, mode: TransmissionMode) -> u64 {
    let header = HEADER_SIZE as u64;
    let mut bytes = total_packets.saturating_mul(header);
    if mode == TransmissionMode::Virtual {
        bytes = bytes.saturating_add(CONTROL_EXCHANGES * header);
    }
    bytes
}

/// 估计耗时（毫秒）
pub fn estimated_time_ms(total_traffic: u64, hop_count: usize, mode: TransmissionMode) -> f64 {
    let t = total_traffic as f64 / LINK_BYTES_PER_MS + hop_count as f64 * HOP_LATENCY_MS;
    match mode {
        TransmissionMode::Virtual => t * VIRTUAL_TIME_FACTOR,
        TransmissionMode::Datagram => t,
    }
}

/// 一次传输的计划
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransmissionPlan {
    pub message_size: u64,
    pub packet_size: u32,
    pub mode: TransmissionMode,
    pub hop_count: usize,
    pub max_payload: u32,
    pub total_packets: u64,
    pub service_traffic_bytes: u64,
    pub total_traffic_bytes: u64,
    pub estimated_time_ms: f64,
}

impl TransmissionPlan {
    /// MTU 不超过包头时直接失败，不做后续计算。
    pub fn compute(
        message_size: u64,
        packet_size: u32,
        mode: TransmissionMode,
        hop_count: usize,
    ) -> Result<Self, PlanError> {
        let (max_payload, total_packets) = fragment(message_size, packet_size)?;
        if message_size == 0 {
            return Err(PlanError::EmptyMessage);
        }
        let service = service_traffic(total_packets, mode);
        let total = message_size.saturating_add(service);
        Ok(Self {
            message_size,
            packet_size,
            mode,
            hop_count,
            max_payload,
            total_packets,
            service_traffic_bytes: service,
            total_traffic_bytes: total,
            estimated_time_ms: estimated_time_ms(total, hop_count, mode),
        })
    }

    /// 第 `seq` 个数据包（从 1 开始）的载荷；最后一个包只携带剩余部分
    pub fn payload_of(&self, seq: u64) -> u32 {
        if seq == 0 || seq > self.total_packets {
            return 0;
        }
        let max = self.max_payload as u64;
        let before = (seq - 1).saturating_mul(max);
        self.message_size.saturating_sub(before).min(max) as u32
    }

    /// 所有数据包的载荷，按序号
    pub fn payloads(&self) -> impl Iterator<Item = u32> + '_ {
        (1..=self.total_packets).map(|seq| self.payload_of(seq))
    }
}
