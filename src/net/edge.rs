//! 边类型
//!
//! 无向边：连接两个不同节点，带正整数权重与双工类型。

use serde::{Deserialize, Serialize};

use super::id::{EdgeId, NodeId};

/// 信道类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    #[default]
    Duplex,
    HalfDuplex,
}

impl EdgeKind {
    /// 编辑器新建边时使用的默认权重
    pub fn default_weight(self) -> u32 {
        match self {
            EdgeKind::Duplex => 10,
            EdgeKind::HalfDuplex => 15,
        }
    }
}

/// 无向边
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub(crate) id: EdgeId,
    pub(crate) source: NodeId,
    pub(crate) dest: NodeId,
    pub(crate) weight: u32,
    pub(crate) kind: EdgeKind,
}

impl Edge {
    pub fn id(&self) -> EdgeId {
        self.id
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn dest(&self) -> NodeId {
        self.dest
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    pub fn kind(&self) -> EdgeKind {
        self.kind
    }

    /// 是否以 `node` 为端点
    pub fn touches(&self, node: NodeId) -> bool {
        self.source == node || self.dest == node
    }

    /// 从 `node` 经此边到达的另一端；`node` 不是端点时返回 None。
    pub fn other(&self, node: NodeId) -> Option<NodeId> {
        if self.source == node {
            Some(self.dest)
        } else if self.dest == node {
            Some(self.source)
        } else {
            None
        }
    }

    /// 是否连接 `a` 与 `b`（不区分方向）
    pub fn connects(&self, a: NodeId, b: NodeId) -> bool {
        (self.source == a && self.dest == b) || (self.source == b && self.dest == a)
    }
}
