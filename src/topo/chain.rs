//! 链式拓扑构建
//!
//! 1 - 2 - 3 - ... ，第 i 条边的权重为 `weights[i]`，全部双工。

use crate::error::TopologyError;
use crate::net::{EdgeKind, NodeId, Topology};

/// 构建链式拓扑，返回拓扑与从 1 到末端的路径
pub fn build_chain(weights: &[u32]) -> Result<(Topology, Vec<NodeId>), TopologyError> {
    let mut topo = Topology::new();
    let path: Vec<NodeId> = (1..=weights.len() as u32 + 1).map(NodeId).collect();
    for &n in &path {
        topo.add_node(n)?;
    }
    for (pair, &w) in path.windows(2).zip(weights) {
        topo.connect(pair[0], pair[1], w, EdgeKind::Duplex)?;
    }
    Ok((topo, path))
}
