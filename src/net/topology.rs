//! 网络拓扑
//!
//! 节点注册表（id -> 节点）与边表。节点只记录关联边的 id，边由拓扑统一持有；
//! 增删边时同时更新两个端点的关联集合，删节点时先删掉它的所有关联边。
//!
//! 节点按 id 升序迭代，路由计算的平局选择因此是确定的。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::edge::{Edge, EdgeKind};
use super::id::{EdgeId, NodeId};
use crate::error::TopologyError;

#[derive(Debug, Clone, Default)]
struct NodeEntry {
    /// 关联边，按连接顺序
    incident: Vec<EdgeId>,
}

/// 网络拓扑
#[derive(Debug, Clone, Default)]
pub struct Topology {
    nodes: BTreeMap<NodeId, NodeEntry>,
    edges: BTreeMap<EdgeId, Edge>,
    next_edge: u32,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加节点
    pub fn add_node(&mut self, id: NodeId) -> Result<NodeId, TopologyError> {
        if id.0 == 0 {
            return Err(TopologyError::InvalidNodeId(id));
        }
        if self.nodes.contains_key(&id) {
            return Err(TopologyError::DuplicateNode(id));
        }
        self.nodes.insert(id, NodeEntry::default());
        trace!(node = %id, "添加节点");
        Ok(id)
    }

    /// 添加节点，id 取当前最大 id + 1
    pub fn add_next_node(&mut self) -> Result<NodeId, TopologyError> {
        let next = match self.max_node_id() {
            Some(max) => max.0.checked_add(1).ok_or(TopologyError::IdSpaceExhausted)?,
            None => 1,
        };
        self.add_node(NodeId(next))
    }

    /// 连接两个节点（创建一条无向边）
    pub fn connect(
        &mut self,
        a: NodeId,
        b: NodeId,
        weight: u32,
        kind: EdgeKind,
    ) -> Result<EdgeId, TopologyError> {
        if a == b {
            return Err(TopologyError::SelfLoop(a));
        }
        if weight == 0 {
            return Err(TopologyError::ZeroWeight);
        }
        for n in [a, b] {
            if !self.nodes.contains_key(&n) {
                return Err(TopologyError::UnknownNode(n));
            }
        }

        let id = EdgeId(self.next_edge);
        self.next_edge = self.next_edge.saturating_add(1);
        self.insert_edge(Edge {
            id,
            source: a,
            dest: b,
            weight,
            kind,
        });
        debug!(edge = %id, %a, %b, weight, ?kind, "连接节点");
        Ok(id)
    }

    /// 使用该类型的默认权重连接两个节点
    pub fn connect_default(
        &mut self,
        a: NodeId,
        b: NodeId,
        kind: EdgeKind,
    ) -> Result<EdgeId, TopologyError> {
        self.connect(a, b, kind.default_weight(), kind)
    }

    fn insert_edge(&mut self, edge: Edge) {
        for end in [edge.source, edge.dest] {
            if let Some(entry) = self.nodes.get_mut(&end) {
                if !entry.incident.contains(&edge.id) {
                    entry.incident.push(edge.id);
                }
            }
        }
        self.edges.insert(edge.id, edge);
    }

    /// 修改边的权重
    pub fn set_weight(&mut self, edge: EdgeId, weight: u32) -> Result<(), TopologyError> {
        if weight == 0 {
            return Err(TopologyError::ZeroWeight);
        }
        let e = self
            .edges
            .get_mut(&edge)
            .ok_or(TopologyError::UnknownEdge(edge))?;
        e.weight = weight;
        Ok(())
    }

    /// 删除边：先从两个端点的关联集合中移除，再销毁边
    pub fn remove_edge(&mut self, edge: EdgeId) -> Result<Edge, TopologyError> {
        let e = self
            .edges
            .remove(&edge)
            .ok_or(TopologyError::UnknownEdge(edge))?;
        for end in [e.source, e.dest] {
            if let Some(entry) = self.nodes.get_mut(&end) {
                entry.incident.retain(|&x| x != edge);
            }
        }
        debug!(edge = %edge, "删除边");
        Ok(e)
    }

    /// 删除节点及其所有关联边，返回被删除的边
    pub fn remove_node(&mut self, id: NodeId) -> Result<Vec<Edge>, TopologyError> {
        let incident = self
            .nodes
            .get(&id)
            .map(|n| n.incident.clone())
            .ok_or(TopologyError::UnknownNode(id))?;

        let mut removed = Vec::with_capacity(incident.len());
        for edge in incident {
            removed.push(self.remove_edge(edge)?);
        }
        self.nodes.remove(&id);
        debug!(node = %id, removed_edges = removed.len(), "删除节点");
        Ok(removed)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn max_node_id(&self) -> Option<NodeId> {
        self.nodes.keys().next_back().copied()
    }

    /// 所有节点，按 id 升序
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// 所有边，按 id 升序
    pub fn edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.values()
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    /// 节点的关联边 id（按连接顺序）；节点不存在时为空
    pub fn incident_ids(&self, node: NodeId) -> &[EdgeId] {
        self.nodes
            .get(&node)
            .map(|n| n.incident.as_slice())
            .unwrap_or(&[])
    }

    /// 节点的关联边（按连接顺序）
    pub fn incident_edges(&self, node: NodeId) -> impl Iterator<Item = &Edge> + '_ {
        self.incident_ids(node)
            .iter()
            .filter_map(move |id| self.edges.get(id))
    }

    /// 边的另一端（相对于 `node`）
    pub fn neighbor(&self, edge: EdgeId, node: NodeId) -> Option<NodeId> {
        self.edges.get(&edge).and_then(|e| e.other(node))
    }

    /// 邻居及到达它所经过的边（按连接顺序，平行边会重复出现）
    pub fn neighbors(&self, node: NodeId) -> impl Iterator<Item = (NodeId, &Edge)> + '_ {
        self.incident_edges(node)
            .filter_map(move |e| e.other(node).map(|n| (n, e)))
    }

    /// `a` 的关联边中第一条连接 `b` 的边
    pub fn edge_between(&self, a: NodeId, b: NodeId) -> Option<&Edge> {
        self.incident_edges(a).find(|e| e.connects(a, b))
    }

    /// 沿路径累加边权；相邻节点间无边时返回 None
    pub fn path_weight(&self, path: &[NodeId]) -> Option<u64> {
        path.windows(2).try_fold(0u64, |acc, w| {
            self.edge_between(w[0], w[1])
                .map(|e| acc.saturating_add(e.weight as u64))
        })
    }

    /// 导出快照：每个节点附带其关联边列表
    pub fn snapshot(&self) -> TopologySnapshot {
        let nodes = self
            .nodes
            .iter()
            .map(|(&id, entry)| NodeSnapshot {
                id,
                edges: entry
                    .incident
                    .iter()
                    .filter_map(|e| self.edges.get(e))
                    .map(EdgeSnapshot::from)
                    .collect(),
            })
            .collect();
        TopologySnapshot { nodes }
    }

    /// 由快照重建拓扑。
    ///
    /// 同一条边会出现在两个端点的列表中，按边 id 去重；关联顺序按快照中出现的顺序。
    pub fn from_snapshot(snap: &TopologySnapshot) -> Result<Self, TopologyError> {
        let mut topo = Topology::new();
        for n in &snap.nodes {
            topo.add_node(n.id)?;
        }
        for n in &snap.nodes {
            for e in &n.edges {
                if !e.touches(n.id) {
                    return Err(TopologyError::UnknownEdge(e.id));
                }
                if let Some(existing) = topo.edges.get(&e.id) {
                    if !existing.connects(e.source, e.dest)
                        || existing.weight != e.weight
                        || existing.kind != e.kind
                    {
                        return Err(TopologyError::ConflictingEdge(e.id));
                    }
                } else {
                    if e.source == e.dest {
                        return Err(TopologyError::SelfLoop(e.source));
                    }
                    if e.weight == 0 {
                        return Err(TopologyError::ZeroWeight);
                    }
                    for end in [e.source, e.dest] {
                        if !topo.contains(end) {
                            return Err(TopologyError::UnknownNode(end));
                        }
                    }
                    topo.edges.insert(
                        e.id,
                        Edge {
                            id: e.id,
                            source: e.source,
                            dest: e.dest,
                            weight: e.weight,
                            kind: e.kind,
                        },
                    );
                    topo.next_edge = topo.next_edge.max(e.id.0.saturating_add(1));
                }
                if let Some(entry) = topo.nodes.get_mut(&n.id) {
                    if !entry.incident.contains(&e.id) {
                        entry.incident.push(e.id);
                    }
                }
            }
        }

        // 只出现在一端列表中的边补到另一端
        let all: Vec<Edge> = topo.edges.values().cloned().collect();
        for e in all {
            topo.insert_edge(e);
        }
        Ok(topo)
    }
}

/// 拓扑快照（外部接口）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologySnapshot {
    pub nodes: Vec<NodeSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: NodeId,
    #[serde(default)]
    pub edges: Vec<EdgeSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSnapshot {
    pub id: EdgeId,
    pub source: NodeId,
    pub dest: NodeId,
    pub weight: u32,
    #[serde(default)]
    pub kind: EdgeKind,
}

impl EdgeSnapshot {
    fn touches(&self, node: NodeId) -> bool {
        self.source == node || self.dest == node
    }
}

impl From<&Edge> for EdgeSnapshot {
    fn from(e: &Edge) -> Self {
        Self {
            id: e.id,
            source: e.source,
            dest: e.dest,
            weight: e.weight,
            kind: e.kind,
        }
    }
}
