//! 发起一次传输
//!
//! 路由 -> 计划 -> 会话。所有校验都在创建会话状态之前完成，失败时调用者拿到
//! 错误，仿真器与世界保持原样。

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::plan::{TransmissionMode, TransmissionPlan};
use super::session::{Phase, Session, SessionConfig, SessionHandle, SessionRequest, SessionStatus};
use super::world::TransferWorld;
use crate::error::TransferError;
use crate::net::{LossModel, NodeId, RoutingEntry, RoutingStrategy, Topology, format_path, route_to};
use crate::report::{ResultRow, SessionEvent, SessionEventKind};
use crate::sim::{SimTime, Simulator};

/// 一次端到端传输请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub source: NodeId,
    pub destination: NodeId,
    pub message_size: u64,
    pub mtu: u32,
    #[serde(default)]
    pub error_rate: u32,
    #[serde(default)]
    pub mode: TransmissionMode,
    #[serde(default)]
    pub strategy: RoutingStrategy,
}

impl TransferRequest {
    pub fn session_request(&self, path: Vec<NodeId>) -> SessionRequest {
        SessionRequest {
            path,
            message_size: self.message_size,
            mtu: self.mtu,
            error_rate: self.error_rate,
            mode: self.mode,
        }
    }
}

fn check_error_rate(error_rate: u32) -> Result<(), TransferError> {
    if error_rate > 100 {
        return Err(TransferError::InvalidErrorRate(error_rate));
    }
    Ok(())
}

/// 在给定路径上启动会话。
///
/// 启动前拆除世界中已有的会话并清空事件队列，旧会话的延迟事件不会再执行。
pub fn start_session(
    sim: &mut Simulator,
    world: &mut TransferWorld,
    req: &SessionRequest,
    cfg: SessionConfig,
    seed: u64,
) -> Result<SessionHandle, TransferError> {
    check_error_rate(req.error_rate)?;
    if req.path.len() < 2 {
        return Err(TransferError::ShortPath(req.path.len()));
    }
    let plan = TransmissionPlan::compute(
        req.message_size,
        req.mtu,
        req.mode,
        req.path.len() - 1,
    )?;

    if !world.sessions.is_empty() || sim.pending() > 0 {
        info!(
            sessions = world.sessions.len(),
            pending = sim.pending(),
            "拆除进行中的仿真"
        );
    }
    world.sessions.clear();
    sim.clear();

    info!(
        path = %format_path(&req.path, " -> "),
        mtu = req.mtu,
        max_payload = plan.max_payload,
        total_packets = plan.total_packets,
        service_traffic = plan.service_traffic_bytes,
        estimated_time_ms = plan.estimated_time_ms,
        "传输计划"
    );

    let now = sim.now();
    let loss = LossModel::new(req.error_rate, seed);
    let path = req.path.clone();
    let handle = world
        .sessions
        .insert(|h| Session::new(h, path, plan, cfg, loss, now));

    let TransferWorld { sessions, log } = world;
    if let Some(s) = sessions.get_mut(handle) {
        s.begin(sim, log);
    }
    Ok(handle)
}

/// 计算路由并启动会话
pub fn start_transfer(
    sim: &mut Simulator,
    world: &mut TransferWorld,
    topo: &Topology,
    req: &TransferRequest,
    cfg: SessionConfig,
    seed: u64,
) -> Result<(RoutingEntry, SessionHandle), TransferError> {
    check_error_rate(req.error_rate)?;
    let route = route_to(topo, req.source, req.destination, req.strategy)?;
    info!(
        strategy = %req.strategy,
        cost = route.cost,
        path = %route.path_string(" -> "),
        "路由已选定"
    );
    let handle = start_session(sim, world, &req.session_request(route.path.clone()), cfg, seed)?;
    Ok((route, handle))
}

/// 一次完整运行的结果
#[derive(Debug, Clone)]
pub struct TransferReport {
    pub route: RoutingEntry,
    pub plan: TransmissionPlan,
    pub status: SessionStatus,
    /// 运行停止时所处的阶段
    pub phase: Phase,
    pub packets_sent: u64,
    pub packets_delivered: u64,
    pub packets_dropped: u64,
    pub retransmissions: u64,
    pub finished_at: Option<SimTime>,
    pub events: Vec<SessionEvent>,
    pub result: Option<ResultRow>,
}

/// 运行一次传输直到结束，或运行到 `until` 为止。
///
/// 无上限重传在 100% 丢包下不会结束，调用者应给出 `until` 或有限的重传策略。
pub fn run_transfer(
    topo: &Topology,
    req: &TransferRequest,
    cfg: SessionConfig,
    seed: u64,
    until: Option<SimTime>,
) -> Result<TransferReport, TransferError> {
    let mut sim = Simulator::default();
    let mut world = TransferWorld::default();
    let (route, handle) = start_transfer(&mut sim, &mut world, topo, req, cfg, seed)?;

    match until {
        Some(t) => sim.run_until(t, &mut world),
        None => sim.run(&mut world),
    }

    let events = world.log.take();
    let result = events.iter().rev().find_map(|e| match &e.kind {
        SessionEventKind::SessionComplete(row) => Some(row.clone()),
        _ => None,
    });

    let s = world
        .sessions
        .remove(handle)
        .ok_or(TransferError::SessionTornDown(handle.0))?;
    if s.is_running() {
        warn!(session = %handle, phase = %s.phase(), now = %sim.now(), "运行结束时会话仍未完成");
    }

    Ok(TransferReport {
        route,
        plan: s.plan().clone(),
        status: s.status(),
        phase: s.phase(),
        packets_sent: s.packets_sent(),
        packets_delivered: s.packets_delivered(),
        packets_dropped: s.packets_dropped(),
        retransmissions: s.retransmissions(),
        finished_at: s.finished_at(),
        events,
        result,
    })
}
