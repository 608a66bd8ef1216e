//! 错误类型
//!
//! 三类可恢复错误（MTU 非法、起点不存在、无路径）以及拓扑编辑错误。
//! 丢包不是错误，由会话状态机按模式处理。

use thiserror::Error;

use crate::net::{EdgeId, NodeId};

/// 拓扑编辑错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("node id must be positive, got {0}")]
    InvalidNodeId(NodeId),

    #[error("node {0} does not exist")]
    UnknownNode(NodeId),

    #[error("node {0} already exists")]
    DuplicateNode(NodeId),

    #[error("edge {0} does not exist")]
    UnknownEdge(EdgeId),

    #[error("edge would connect node {0} to itself")]
    SelfLoop(NodeId),

    #[error("edge weight must be at least 1")]
    ZeroWeight,

    #[error("node id space exhausted")]
    IdSpaceExhausted,

    #[error("edge {0} is listed twice with different endpoints, weight or kind")]
    ConflictingEdge(EdgeId),
}

/// 路由请求错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("start node {0} not found in topology")]
    NoStartNode(NodeId),

    #[error("no path from {from} to {to}")]
    NoPath { from: NodeId, to: NodeId },
}

/// 分片计划错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("MTU {packet_size} must exceed header size {header_size}")]
    InvalidMtu { packet_size: u32, header_size: u32 },

    #[error("message size must be positive")]
    EmptyMessage,
}

/// 传输请求错误：在任何会话状态创建之前同步返回给调用者。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("error rate {0}% is outside 0..=100")]
    InvalidErrorRate(u32),

    #[error("path must contain at least 2 nodes, got {0}")]
    ShortPath(usize),

    #[error("session #{0} was torn down before it could be reported")]
    SessionTornDown(u64),
}
