//! 路由计算
//!
//! 两种可互换的策略，输出契约相同：给定起点，为每个可达的其他节点给出
//! (目的地, 完整路径, 代价)。
//!
//! - `Weighted`：按边权的单源最短路（线性扫描选最小暂定距离）。
//! - `MinHop`：按跳数的广度优先；报告的代价是这条最少跳路径上的真实边权之和，
//!   因此可能大于同一目的地的加权最短路代价。
//!
//! 平局时按节点 id 升序取第一个，关联边按连接顺序松弛，结果对固定拓扑是确定的。

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::id::{EdgeId, NodeId};
use super::topology::Topology;
use crate::error::RouteError;

/// 路由策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingStrategy {
    #[default]
    Weighted,
    MinHop,
}

impl fmt::Display for RoutingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingStrategy::Weighted => f.write_str("weighted"),
            RoutingStrategy::MinHop => f.write_str("min_hop"),
        }
    }
}

impl FromStr for RoutingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weighted" | "weight" | "dijkstra" => Ok(RoutingStrategy::Weighted),
            "min_hop" | "min-hop" | "minhop" | "hops" => Ok(RoutingStrategy::MinHop),
            other => Err(format!("unknown routing strategy: {other}")),
        }
    }
}

/// 路由表中的一行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingEntry {
    pub destination: NodeId,
    /// 起点在前，包含起点与终点
    pub path: Vec<NodeId>,
    pub cost: u64,
}

impl RoutingEntry {
    /// 下一跳（路径第二个节点）
    pub fn next_hop(&self) -> Option<NodeId> {
        self.path.get(1).copied()
    }

    pub fn hop_count(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    /// 以 `sep` 连接的路径字符串
    pub fn path_string(&self, sep: &str) -> String {
        format_path(&self.path, sep)
    }
}

/// 以 `sep` 连接节点 id
pub fn format_path(path: &[NodeId], sep: &str) -> String {
    path.iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(sep)
}

/// 某个起点的完整路由表
#[derive(Debug, Clone)]
pub struct RoutingTable {
    origin: NodeId,
    strategy: RoutingStrategy,
    entries: Vec<RoutingEntry>,
}

impl RoutingTable {
    pub fn compute(topo: &Topology, origin: NodeId, strategy: RoutingStrategy) -> Self {
        Self {
            origin,
            strategy,
            entries: route_table(topo, origin, strategy),
        }
    }

    pub fn origin(&self) -> NodeId {
        self.origin
    }

    pub fn strategy(&self) -> RoutingStrategy {
        self.strategy
    }

    /// 条目按目的地 id 升序
    pub fn entries(&self) -> &[RoutingEntry] {
        &self.entries
    }

    pub fn get(&self, destination: NodeId) -> Option<&RoutingEntry> {
        self.entries.iter().find(|e| e.destination == destination)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 按策略计算路由表。起点不存在或拓扑为空时返回空表。
#[tracing::instrument(skip(topo), fields(nodes = topo.node_count(), edges = topo.edge_count()))]
pub fn route_table(topo: &Topology, start: NodeId, strategy: RoutingStrategy) -> Vec<RoutingEntry> {
    let table = match strategy {
        RoutingStrategy::Weighted => shortest_path_table(topo, start),
        RoutingStrategy::MinHop => min_hop_table(topo, start),
    };
    debug!(entries = table.len(), "路由表计算完成");
    table
}

/// 查找到 `dest` 的路由；用于发起传输前的校验。
pub fn route_to(
    topo: &Topology,
    start: NodeId,
    dest: NodeId,
    strategy: RoutingStrategy,
) -> Result<RoutingEntry, RouteError> {
    if !topo.contains(start) {
        return Err(RouteError::NoStartNode(start));
    }
    route_table(topo, start, strategy)
        .into_iter()
        .find(|e| e.destination == dest && e.path.len() >= 2)
        .ok_or(RouteError::NoPath {
            from: start,
            to: dest,
        })
}

/// 加权最短路
pub fn shortest_path_table(topo: &Topology, start: NodeId) -> Vec<RoutingEntry> {
    if !topo.contains(start) {
        return Vec::new();
    }

    let mut dist: HashMap<NodeId, u64> = HashMap::new();
    let mut parent: HashMap<NodeId, NodeId> = HashMap::new();
    let mut visited: HashSet<NodeId> = HashSet::new();
    dist.insert(start, 0);

    for _ in 0..topo.node_count() {
        // 线性扫描：严格小于，平局保留 id 较小者
        let mut current: Option<(NodeId, u64)> = None;
        for id in topo.node_ids() {
            if visited.contains(&id) {
                continue;
            }
            if let Some(&d) = dist.get(&id) {
                if current.is_none_or(|(_, best)| d < best) {
                    current = Some((id, d));
                }
            }
        }
        let Some((u, du)) = current else {
            break;
        };
        visited.insert(u);
        trace!(node = %u, dist = du, "选中节点");

        for (v, edge) in topo.neighbors(u) {
            if visited.contains(&v) {
                continue;
            }
            let alt = du.saturating_add(edge.weight() as u64);
            if dist.get(&v).is_none_or(|&dv| alt < dv) {
                dist.insert(v, alt);
                parent.insert(v, u);
            }
        }
    }

    topo.node_ids()
        .filter(|&t| t != start)
        .filter_map(|t| {
            let cost = *dist.get(&t)?;
            let path = walk_back(start, t, |n| parent.get(&n).copied())?;
            Some(RoutingEntry {
                destination: t,
                path,
                cost,
            })
        })
        .collect()
}

/// 最少跳数（BFS）；代价为路径上真实边权之和
pub fn min_hop_table(topo: &Topology, start: NodeId) -> Vec<RoutingEntry> {
    if !topo.contains(start) {
        return Vec::new();
    }

    // 记录发现每个节点所经过的边，回溯时直接累加其权重
    let mut parent: HashMap<NodeId, (NodeId, EdgeId)> = HashMap::new();
    let mut hops: HashMap<NodeId, u32> = HashMap::new();
    let mut q: VecDeque<NodeId> = VecDeque::new();

    hops.insert(start, 0);
    q.push_back(start);

    while let Some(u) = q.pop_front() {
        let hu = hops.get(&u).copied().unwrap_or(0);
        for (v, edge) in topo.neighbors(u) {
            if hops.contains_key(&v) {
                continue;
            }
            hops.insert(v, hu.saturating_add(1));
            parent.insert(v, (u, edge.id()));
            q.push_back(v);
        }
    }

    topo.node_ids()
        .filter(|&t| t != start && hops.contains_key(&t))
        .filter_map(|t| {
            let path = walk_back(start, t, |n| parent.get(&n).map(|&(p, _)| p))?;
            let cost = path
                .iter()
                .skip(1)
                .filter_map(|n| parent.get(n))
                .filter_map(|&(_, e)| topo.edge(e))
                .map(|e| e.weight() as u64)
                .sum();
            Some(RoutingEntry {
                destination: t,
                path,
                cost,
            })
        })
        .collect()
}

/// 从 `target` 沿前驱回溯到 `start`，返回起点在前的路径
fn walk_back(
    start: NodeId,
    target: NodeId,
    parent_of: impl Fn(NodeId) -> Option<NodeId>,
) -> Option<Vec<NodeId>> {
    let mut path = vec![target];
    let mut cur = target;
    while cur != start {
        cur = parent_of(cur)?;
        path.push(cur);
    }
    path.reverse();
    Some(path)
}
