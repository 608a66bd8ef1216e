//! 网络模型模块
//!
//! 拓扑（节点、边）、路由计算、数据包与逐跳丢包模型。

// 子模块声明
mod edge;
mod id;
mod loss;
mod packet;
mod routing;
mod topology;

// 重新导出公共接口
pub use edge::{Edge, EdgeKind};
pub use id::{EdgeId, NodeId};
pub use loss::LossModel;
pub use packet::{Packet, PacketKind, PacketOutcome, traverse};
pub use routing::{
    RoutingEntry, RoutingStrategy, RoutingTable, format_path, min_hop_table, route_table,
    route_to, shortest_path_table,
};
pub use topology::{EdgeSnapshot, NodeSnapshot, Topology, TopologySnapshot};
