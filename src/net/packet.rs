//! 数据包类型
//!
//! 定义仿真数据包、控制包类别，以及逐跳遍历的结果。

use serde::{Deserialize, Serialize};
use std::fmt;

use super::id::NodeId;
use super::loss::LossModel;

/// 包类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacketKind {
    Data,
    ConnReq,
    ConnAck,
    Disconnect,
}

impl PacketKind {
    pub fn is_control(self) -> bool {
        !matches!(self, PacketKind::Data)
    }
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PacketKind::Data => "DATA",
            PacketKind::ConnReq => "CONN_REQ",
            PacketKind::ConnAck => "CONN_ACK",
            PacketKind::Disconnect => "DISCONNECT",
        };
        f.write_str(s)
    }
}

/// 仿真数据包
#[derive(Debug, Clone)]
pub struct Packet {
    /// 数据包从 1 开始编号；控制包为 0
    pub seq: u64,
    pub kind: PacketKind,
    pub payload_bytes: u32,
    pub route: Vec<NodeId>,
    /// 第几次重传（首次发送为 0）
    pub attempt: u32,
}

impl Packet {
    pub fn data(seq: u64, payload_bytes: u32, route: Vec<NodeId>) -> Self {
        Self {
            seq,
            kind: PacketKind::Data,
            payload_bytes,
            route,
            attempt: 0,
        }
    }

    /// 零载荷控制包
    pub fn control(kind: PacketKind, route: Vec<NodeId>) -> Self {
        Self {
            seq: 0,
            kind,
            payload_bytes: 0,
            route,
            attempt: 0,
        }
    }

    pub fn src(&self) -> Option<NodeId> {
        self.route.first().copied()
    }

    pub fn dst(&self) -> Option<NodeId> {
        self.route.last().copied()
    }

    pub fn is_retransmission(&self) -> bool {
        self.attempt > 0
    }

    /// 同一序号的重传副本
    pub fn retransmitted(mut self) -> Self {
        self.attempt = self.attempt.saturating_add(1);
        self
    }

    /// 沿路由逐跳抽取丢包
    pub fn traverse(&self, loss: &mut LossModel) -> PacketOutcome {
        traverse(&self.route, loss)
    }
}

/// 一次逐跳遍历的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketOutcome {
    /// 到达终点，经过 `hops` 跳
    Delivered { hops: usize },
    /// 在第 `hops` 跳的终点 `at` 丢失，之后不再前进
    Lost { at: NodeId, hops: usize },
}

impl PacketOutcome {
    /// 包在链路上花费的跳数（丢失的那一跳也计入）
    pub fn hops(&self) -> usize {
        match *self {
            PacketOutcome::Delivered { hops } | PacketOutcome::Lost { hops, .. } => hops,
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, PacketOutcome::Delivered { .. })
    }
}

/// 沿 `route` 遍历：每一跳独立抽取，丢失时立即停止。
pub fn traverse(route: &[NodeId], loss: &mut LossModel) -> PacketOutcome {
    for (i, hop) in route.windows(2).enumerate() {
        if loss.hop_lost() {
            return PacketOutcome::Lost {
                at: hop[1],
                hops: i + 1,
            };
        }
    }
    PacketOutcome::Delivered {
        hops: route.len().saturating_sub(1),
    }
}
