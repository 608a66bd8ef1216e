use serde::{Deserialize, Serialize};
use std::fmt;

use crate::net::{NodeId, PacketKind, RoutingEntry, format_path};
use crate::proto::{Phase, TransmissionMode};

/// 会话事件类型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEventKind {
    /// 进入阶段
    PhaseEnter { phase: Phase },
    /// 离开阶段
    PhaseExit { phase: Phase },
    /// 从路径起点发出一个包（含重传）
    PacketSent {
        seq: u64,
        packet: PacketKind,
        payload_bytes: u32,
        retransmission: bool,
    },
    /// 丢失的包在退避后重新发送
    Retransmission {
        seq: u64,
        packet: PacketKind,
        attempt: u32,
    },
    /// 包到达路径终点
    PacketDelivered {
        seq: u64,
        packet: PacketKind,
        payload_bytes: u32,
        node: NodeId,
    },
    /// 包在 `at_node` 丢失
    PacketLost {
        seq: u64,
        packet: PacketKind,
        at_node: NodeId,
    },
    /// 会话结束（成功或失败）
    SessionComplete(ResultRow),
}

/// 一条带时间戳的事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    /// 仿真时间（毫秒）
    pub t_ms: u64,
    pub session: u64,
    #[serde(flatten)]
    pub kind: SessionEventKind,
}

/// 会话结束时的一行结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub source: NodeId,
    pub destination: NodeId,
    pub mode: TransmissionMode,
    pub estimated_time_ms: f64,
    pub service_traffic_bytes: u64,
    pub packets: u64,
    pub message_size: u64,
    /// 形如 `1->2->3`
    pub path: String,
    pub delivered: bool,
    pub packets_delivered: u64,
    pub packets_dropped: u64,
    pub retransmissions: u64,
    pub finished_at_ms: u64,
}

impl ResultRow {
    pub const HEADERS: [&'static str; 9] = [
        "From",
        "To",
        "Type",
        "Time (ms)",
        "Service (B)",
        "Packets",
        "Msg Size",
        "Path",
        "Delivered",
    ];

    /// 按 [`ResultRow::HEADERS`] 的列顺序输出
    pub fn cells(&self) -> [String; 9] {
        [
            self.source.to_string(),
            self.destination.to_string(),
            self.mode.to_string(),
            format!("{:.2}", self.estimated_time_ms),
            self.service_traffic_bytes.to_string(),
            self.packets.to_string(),
            self.message_size.to_string(),
            self.path.clone(),
            if self.delivered { "Yes" } else { "No" }.to_string(),
        ]
    }
}

/// 路由表展示行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRow {
    pub direction: String,
    pub next_hop: String,
    pub full_path: String,
    pub metric: u64,
}

impl RouteRow {
    pub const HEADERS: [&'static str; 4] = ["Direction", "Next Hop", "Full Path", "Metric"];

    pub fn from_entry(origin: NodeId, entry: &RoutingEntry) -> Self {
        Self {
            direction: format!("{origin} -> {}", entry.destination),
            next_hop: entry
                .next_hop()
                .map_or_else(|| "-".to_string(), |n| n.to_string()),
            full_path: format_path(&entry.path, " -> "),
            metric: entry.cost,
        }
    }
}

impl fmt::Display for RouteRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.direction, self.next_hop, self.full_path, self.metric
        )
    }
}

/// 事件收集器（存内存，结束后可写 JSON）
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    pub events: Vec<SessionEvent>,
}

impl EventLog {
    pub fn push(&mut self, t_ms: u64, session: u64, kind: SessionEventKind) {
        self.events.push(SessionEvent {
            t_ms,
            session,
            kind,
        });
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn take(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// 最后一条结束记录
    pub fn result(&self) -> Option<&ResultRow> {
        self.events.iter().rev().find_map(|e| match &e.kind {
            SessionEventKind::SessionComplete(row) => Some(row),
            _ => None,
        })
    }

    pub fn count(&self, pred: impl Fn(&SessionEventKind) -> bool) -> usize {
        self.events.iter().filter(|e| pred(&e.kind)).count()
    }
}
