//! 传输会话状态机
//!
//! 数据报模式只有 `DataTransfer` 一个阶段，丢包直接丢弃；
//! 虚电路模式依次经过 `Handshake`、`DataTransfer`、`Disconnect`，
//! 任何包丢失都在退避后从起点以同一序号重发。
//!
//! 所有延迟步骤（发包节拍、思考时间、重传退避、包到达）都是调度到
//! [`Simulator`] 上的事件，只携带 [`SessionHandle`]。事件执行时按句柄查找会话，
//! 会话已被拆除或已结束时什么也不做。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, trace, warn};

use super::plan::{TransmissionMode, TransmissionPlan};
use super::world::with_session;
use crate::net::{LossModel, NodeId, Packet, PacketKind, PacketOutcome, format_path};
use crate::report::{EventLog, ResultRow, SessionEventKind};
use crate::sim::{Event, SimTime, Simulator, World};

/// 会话阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Handshake,
    DataTransfer,
    Disconnect,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Handshake => f.write_str("Handshake"),
            Phase::DataTransfer => f.write_str("DataTransfer"),
            Phase::Disconnect => f.write_str("Disconnect"),
        }
    }
}

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Running,
    Completed,
    Failed,
}

/// 虚电路模式下单个包的重传策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryPolicy {
    /// 无上限重传，直到成功
    #[default]
    Unbounded,
    /// 同一个包最多重传 n 次，超过后会话失败
    Limited(u32),
}

impl RetryPolicy {
    /// 已经重传 `attempts` 次之后是否还允许再重传
    pub fn allows(self, attempts: u32) -> bool {
        match self {
            RetryPolicy::Unbounded => true,
            RetryPolicy::Limited(n) => attempts < n,
        }
    }
}

/// 会话时序参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// 数据包发放节拍
    pub admit_interval: SimTime,
    /// 包经过一跳所需时间
    pub hop_duration: SimTime,
    /// 握手阶段收到控制包后的思考时间
    pub think_time: SimTime,
    /// 丢包后重发前的退避
    pub retransmit_backoff: SimTime,
    pub retry_policy: RetryPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            admit_interval: SimTime::from_millis(1_000),
            hop_duration: SimTime::from_millis(1_000),
            think_time: SimTime::from_millis(500),
            retransmit_backoff: SimTime::from_millis(1_500),
            retry_policy: RetryPolicy::Unbounded,
        }
    }
}

/// 会话请求：路径 + 传输参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    pub path: Vec<NodeId>,
    pub message_size: u64,
    pub mtu: u32,
    /// 每跳丢包率（百分比，0..=100）
    pub error_rate: u32,
    pub mode: TransmissionMode,
}

/// 会话句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionHandle(pub u64);

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 会话表：按句柄持有会话
#[derive(Debug, Default)]
pub struct SessionArena {
    sessions: HashMap<SessionHandle, Session>,
    next: u64,
}

impl SessionArena {
    pub fn insert(&mut self, build: impl FnOnce(SessionHandle) -> Session) -> SessionHandle {
        self.next = self.next.wrapping_add(1);
        let handle = SessionHandle(self.next);
        self.sessions.insert(handle, build(handle));
        handle
    }

    pub fn get(&self, handle: SessionHandle) -> Option<&Session> {
        self.sessions.get(&handle)
    }

    pub fn get_mut(&mut self, handle: SessionHandle) -> Option<&mut Session> {
        self.sessions.get_mut(&handle)
    }

    pub fn remove(&mut self, handle: SessionHandle) -> Option<Session> {
        self.sessions.remove(&handle)
    }

    /// 拆除所有会话；之后仍在队列中的事件都会变成空操作
    pub fn clear(&mut self) {
        self.sessions.clear();
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// 握手阶段的延迟步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PhaseStep {
    SendConnAck,
    OpenDataTransfer,
}

/// 一次传输的可变状态
#[derive(Debug)]
pub struct Session {
    handle: SessionHandle,
    route: Vec<NodeId>,
    plan: TransmissionPlan,
    cfg: SessionConfig,
    loss: LossModel,
    phase: Phase,
    status: SessionStatus,
    packets_sent: u64,
    packets_delivered: u64,
    packets_dropped: u64,
    retransmissions: u64,
    started_at: SimTime,
    finished_at: Option<SimTime>,
}

impl Session {
    pub fn new(
        handle: SessionHandle,
        route: Vec<NodeId>,
        plan: TransmissionPlan,
        cfg: SessionConfig,
        loss: LossModel,
        started_at: SimTime,
    ) -> Self {
        let phase = match plan.mode {
            TransmissionMode::Virtual => Phase::Handshake,
            TransmissionMode::Datagram => Phase::DataTransfer,
        };
        Self {
            handle,
            route,
            plan,
            cfg,
            loss,
            phase,
            status: SessionStatus::Running,
            packets_sent: 0,
            packets_delivered: 0,
            packets_dropped: 0,
            retransmissions: 0,
            started_at,
            finished_at: None,
        }
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle
    }

    pub fn route(&self) -> &[NodeId] {
        &self.route
    }

    pub fn plan(&self) -> &TransmissionPlan {
        &self.plan
    }

    pub fn mode(&self) -> TransmissionMode {
        self.plan.mode
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == SessionStatus::Running
    }

    /// 已发放的数据包数（不含重传）
    pub fn packets_sent(&self) -> u64 {
        self.packets_sent
    }

    pub fn packets_delivered(&self) -> u64 {
        self.packets_delivered
    }

    /// 数据报模式下永久丢失的数据包数
    pub fn packets_dropped(&self) -> u64 {
        self.packets_dropped
    }

    pub fn retransmissions(&self) -> u64 {
        self.retransmissions
    }

    pub fn started_at(&self) -> SimTime {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<SimTime> {
        self.finished_at
    }

    fn emit(&self, now: SimTime, log: &mut EventLog, kind: SessionEventKind) {
        log.push(now.as_millis(), self.handle.0, kind);
    }

    fn enter(&mut self, phase: Phase, sim: &Simulator, log: &mut EventLog) {
        self.phase = phase;
        info!(session = %self.handle, %phase, "=== 进入阶段 ===");
        self.emit(sim.now(), log, SessionEventKind::PhaseEnter { phase });
    }

    fn exit(&mut self, sim: &Simulator, log: &mut EventLog) {
        let phase = self.phase;
        debug!(session = %self.handle, %phase, "离开阶段");
        self.emit(sim.now(), log, SessionEventKind::PhaseExit { phase });
    }

    /// 进入第一个阶段并发出第一个包
    pub(crate) fn begin(&mut self, sim: &mut Simulator, log: &mut EventLog) {
        info!(
            session = %self.handle,
            mode = %self.plan.mode,
            path = %format_path(&self.route, " -> "),
            total_packets = self.plan.total_packets,
            "▶️  会话开始"
        );
        self.enter(self.phase, sim, log);
        match self.plan.mode {
            TransmissionMode::Virtual => {
                let req = Packet::control(PacketKind::ConnReq, self.route.clone());
                self.send(req, sim, log);
            }
            TransmissionMode::Datagram => self.admit_next(sim, log),
        }
    }

    /// 从路径起点发出一个包：逐跳抽取丢包，并在包走完（或丢失）时调度结果事件
    fn send(&mut self, pkt: Packet, sim: &mut Simulator, log: &mut EventLog) {
        self.emit(
            sim.now(),
            log,
            SessionEventKind::PacketSent {
                seq: pkt.seq,
                packet: pkt.kind,
                payload_bytes: pkt.payload_bytes,
                retransmission: pkt.is_retransmission(),
            },
        );

        let outcome = pkt.traverse(&mut self.loss);
        let at = sim.now().after_n(self.cfg.hop_duration, outcome.hops() as u64);
        debug!(
            session = %self.handle,
            seq = pkt.seq,
            kind = %pkt.kind,
            attempt = pkt.attempt,
            from = ?pkt.src(),
            ?outcome,
            resolve_at = %at,
            "🚀 发出数据包"
        );
        sim.schedule(
            at,
            ResolvePacket {
                session: self.handle,
                pkt,
                outcome,
            },
        );
    }

    /// 发放下一个数据包；还有剩余时按节拍调度下一次
    pub(crate) fn admit_next(&mut self, sim: &mut Simulator, log: &mut EventLog) {
        if self.packets_sent >= self.plan.total_packets {
            return;
        }
        let seq = self.packets_sent + 1;
        let pkt = Packet::data(seq, self.plan.payload_of(seq), self.route.clone());
        self.packets_sent = seq;
        self.send(pkt, sim, log);

        if self.packets_sent < self.plan.total_packets {
            sim.schedule_in(
                self.cfg.admit_interval,
                AdmitData {
                    session: self.handle,
                },
            );
        }
    }

    pub(crate) fn on_resolved(
        &mut self,
        pkt: Packet,
        outcome: PacketOutcome,
        sim: &mut Simulator,
        log: &mut EventLog,
    ) {
        match outcome {
            PacketOutcome::Lost { at, .. } => self.on_lost(pkt, at, sim, log),
            PacketOutcome::Delivered { .. } => self.on_delivered(pkt, sim, log),
        }
    }

    fn on_lost(&mut self, pkt: Packet, at: NodeId, sim: &mut Simulator, log: &mut EventLog) {
        debug!(session = %self.handle, seq = pkt.seq, kind = %pkt.kind, node = %at, "xx 数据包丢失");
        self.emit(
            sim.now(),
            log,
            SessionEventKind::PacketLost {
                seq: pkt.seq,
                packet: pkt.kind,
                at_node: at,
            },
        );

        match self.plan.mode {
            TransmissionMode::Datagram => {
                self.packets_dropped += 1;
                self.check_data_complete(sim, log);
            }
            TransmissionMode::Virtual => {
                if self.cfg.retry_policy.allows(pkt.attempt) {
                    sim.schedule_in(
                        self.cfg.retransmit_backoff,
                        Resend {
                            session: self.handle,
                            pkt,
                        },
                    );
                } else {
                    warn!(
                        session = %self.handle,
                        seq = pkt.seq,
                        attempts = pkt.attempt,
                        "重传次数已达上限，会话失败"
                    );
                    self.exit(sim, log);
                    self.finish(false, sim, log);
                }
            }
        }
    }

    fn on_delivered(&mut self, pkt: Packet, sim: &mut Simulator, log: &mut EventLog) {
        let node = pkt.dst().unwrap_or(NodeId(0));
        debug!(session = %self.handle, seq = pkt.seq, kind = %pkt.kind, %node, ">> 数据包送达");
        self.emit(
            sim.now(),
            log,
            SessionEventKind::PacketDelivered {
                seq: pkt.seq,
                packet: pkt.kind,
                payload_bytes: pkt.payload_bytes,
                node,
            },
        );

        match pkt.kind {
            PacketKind::Data => {
                self.packets_delivered += 1;
                self.check_data_complete(sim, log);
            }
            PacketKind::ConnReq => {
                sim.schedule_in(
                    self.cfg.think_time,
                    AdvancePhase {
                        session: self.handle,
                        step: PhaseStep::SendConnAck,
                    },
                );
            }
            PacketKind::ConnAck => {
                info!(session = %self.handle, "连接已建立");
                self.exit(sim, log);
                sim.schedule_in(
                    self.cfg.think_time,
                    AdvancePhase {
                        session: self.handle,
                        step: PhaseStep::OpenDataTransfer,
                    },
                );
            }
            PacketKind::Disconnect => {
                info!(session = %self.handle, "连接已断开");
                self.exit(sim, log);
                self.finish(true, sim, log);
            }
        }
    }

    pub(crate) fn resend(&mut self, pkt: Packet, sim: &mut Simulator, log: &mut EventLog) {
        let pkt = pkt.retransmitted();
        self.retransmissions += 1;
        info!(session = %self.handle, seq = pkt.seq, kind = %pkt.kind, attempt = pkt.attempt, "!! 重传数据包");
        self.emit(
            sim.now(),
            log,
            SessionEventKind::Retransmission {
                seq: pkt.seq,
                packet: pkt.kind,
                attempt: pkt.attempt,
            },
        );
        self.send(pkt, sim, log);
    }

    pub(crate) fn advance(&mut self, step: PhaseStep, sim: &mut Simulator, log: &mut EventLog) {
        match step {
            PhaseStep::SendConnAck => {
                let mut back = self.route.clone();
                back.reverse();
                self.send(Packet::control(PacketKind::ConnAck, back), sim, log);
            }
            PhaseStep::OpenDataTransfer => {
                self.enter(Phase::DataTransfer, sim, log);
                self.admit_next(sim, log);
            }
        }
    }

    /// 数据阶段结束判定。
    ///
    /// 虚电路：全部送达后进入断开阶段。
    /// 数据报：每个包都有了结果（送达或丢弃）即结束，全部送达才算成功。
    fn check_data_complete(&mut self, sim: &mut Simulator, log: &mut EventLog) {
        let total = self.plan.total_packets;
        match self.plan.mode {
            TransmissionMode::Virtual => {
                if self.packets_delivered >= total {
                    self.exit(sim, log);
                    self.enter(Phase::Disconnect, sim, log);
                    let fin = Packet::control(PacketKind::Disconnect, self.route.clone());
                    self.send(fin, sim, log);
                }
            }
            TransmissionMode::Datagram => {
                if self.packets_delivered + self.packets_dropped >= total {
                    self.exit(sim, log);
                    let ok = self.packets_delivered == total;
                    self.finish(ok, sim, log);
                }
            }
        }
    }

    fn finish(&mut self, success: bool, sim: &Simulator, log: &mut EventLog) {
        self.status = if success {
            SessionStatus::Completed
        } else {
            SessionStatus::Failed
        };
        self.finished_at = Some(sim.now());
        let row = self.result_row();
        info!(
            session = %self.handle,
            delivered = row.delivered,
            packets_delivered = row.packets_delivered,
            packets_dropped = row.packets_dropped,
            retransmissions = row.retransmissions,
            finished_at = %sim.now(),
            "[FINISH] 会话结束"
        );
        self.emit(sim.now(), log, SessionEventKind::SessionComplete(row));
    }

    /// 结果行；会话结束前调用时 `delivered` 为 false
    pub fn result_row(&self) -> ResultRow {
        ResultRow {
            source: self.route.first().copied().unwrap_or(NodeId(0)),
            destination: self.route.last().copied().unwrap_or(NodeId(0)),
            mode: self.plan.mode,
            estimated_time_ms: self.plan.estimated_time_ms,
            service_traffic_bytes: self.plan.service_traffic_bytes,
            packets: self.plan.total_packets,
            message_size: self.plan.message_size,
            path: format_path(&self.route, "->"),
            delivered: self.status == SessionStatus::Completed,
            packets_delivered: self.packets_delivered,
            packets_dropped: self.packets_dropped,
            retransmissions: self.retransmissions,
            finished_at_ms: self.finished_at.map_or(0, SimTime::as_millis),
        }
    }
}

/// 事件：按节拍发放下一个数据包
#[derive(Debug)]
pub(crate) struct AdmitData {
    pub session: SessionHandle,
}

impl Event for AdmitData {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let AdmitData { session } = *self;
        with_session(world, session, |s, log| s.admit_next(sim, log));
    }
}

/// 事件：包走完路径（或在某一跳丢失）
#[derive(Debug)]
pub(crate) struct ResolvePacket {
    pub session: SessionHandle,
    pub pkt: Packet,
    pub outcome: PacketOutcome,
}

impl Event for ResolvePacket {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let ResolvePacket {
            session,
            pkt,
            outcome,
        } = *self;
        trace!(%session, seq = pkt.seq, ?outcome, "包结果事件执行");
        with_session(world, session, |s, log| s.on_resolved(pkt, outcome, sim, log));
    }
}

/// 事件：退避结束后重发
#[derive(Debug)]
pub(crate) struct Resend {
    pub session: SessionHandle,
    pub pkt: Packet,
}

impl Event for Resend {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let Resend { session, pkt } = *self;
        with_session(world, session, |s, log| s.resend(pkt, sim, log));
    }
}

/// 事件：思考时间结束后推进握手
#[derive(Debug)]
pub(crate) struct AdvancePhase {
    pub session: SessionHandle,
    pub step: PhaseStep,
}

impl Event for AdvancePhase {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let AdvancePhase { session, step } = *self;
        with_session(world, session, |s, log| s.advance(step, sim, log));
    }
}
