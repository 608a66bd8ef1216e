use serde::{Deserialize, Serialize};

use super::time::SimTime;
use crate::error::TopologyError;
use crate::net::{EdgeKind, NodeId, RoutingStrategy, Topology, TopologySnapshot};
use crate::proto::{RetryPolicy, SessionConfig, TransferRequest, TransmissionMode};
use crate::topo::chain::build_chain;
use crate::topo::regions::{RegionsOpts, build_regions};

/// 场景描述（scenario.json）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub schema_version: u32,
    pub topology: TopologySpec,
    #[serde(default)]
    pub routing: Option<RoutingStrategy>,
    pub transfer: TransferSpec,
    #[serde(default)]
    pub timing: Option<TimingSpec>,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TopologySpec {
    Explicit {
        nodes: Vec<NodeId>,
        #[serde(default)]
        edges: Vec<EdgeSpec>,
    },
    Chain {
        weights: Vec<u32>,
    },
    Regions {
        #[serde(default)]
        regions: Option<usize>,
        #[serde(default)]
        nodes_per_region: Option<usize>,
        #[serde(default)]
        seed: Option<u64>,
    },
    Snapshot(TopologySnapshot),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub source: NodeId,
    pub dest: NodeId,
    /// 缺省时取该类型的默认权重
    #[serde(default)]
    pub weight: Option<u32>,
    #[serde(default)]
    pub kind: Option<EdgeKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferSpec {
    pub source: NodeId,
    pub destination: NodeId,
    pub message_size: u64,
    pub mtu: u32,
    #[serde(default)]
    pub error_rate: Option<u32>,
    #[serde(default)]
    pub mode: Option<TransmissionMode>,
}

/// 时序覆盖项（毫秒）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimingSpec {
    #[serde(default)]
    pub admit_interval_ms: Option<u64>,
    #[serde(default)]
    pub hop_ms: Option<u64>,
    #[serde(default)]
    pub think_ms: Option<u64>,
    #[serde(default)]
    pub backoff_ms: Option<u64>,
    /// 单个包的重传上限；缺省为无上限
    #[serde(default)]
    pub max_retransmissions: Option<u32>,
}

impl TimingSpec {
    pub fn apply(&self, mut cfg: SessionConfig) -> SessionConfig {
        if let Some(v) = self.admit_interval_ms {
            cfg.admit_interval = SimTime::from_millis(v);
        }
        if let Some(v) = self.hop_ms {
            cfg.hop_duration = SimTime::from_millis(v);
        }
        if let Some(v) = self.think_ms {
            cfg.think_time = SimTime::from_millis(v);
        }
        if let Some(v) = self.backoff_ms {
            cfg.retransmit_backoff = SimTime::from_millis(v);
        }
        if let Some(n) = self.max_retransmissions {
            cfg.retry_policy = RetryPolicy::Limited(n);
        }
        cfg
    }
}

impl TopologySpec {
    pub fn build(&self, default_seed: u64) -> Result<Topology, TopologyError> {
        match self {
            TopologySpec::Explicit { nodes, edges } => {
                let mut topo = Topology::new();
                for &n in nodes {
                    topo.add_node(n)?;
                }
                for e in edges {
                    let kind = e.kind.unwrap_or_default();
                    let weight = e.weight.unwrap_or_else(|| kind.default_weight());
                    topo.connect(e.source, e.dest, weight, kind)?;
                }
                Ok(topo)
            }
            TopologySpec::Chain { weights } => Ok(build_chain(weights)?.0),
            TopologySpec::Regions {
                regions,
                nodes_per_region,
                seed,
            } => {
                let defaults = RegionsOpts::default();
                let opts = RegionsOpts {
                    regions: regions.unwrap_or(defaults.regions),
                    nodes_per_region: nodes_per_region.unwrap_or(defaults.nodes_per_region),
                    seed: seed.unwrap_or(default_seed),
                    ..defaults
                };
                Ok(build_regions(&opts)?.topo)
            }
            TopologySpec::Snapshot(snap) => Topology::from_snapshot(snap),
        }
    }
}

impl ScenarioSpec {
    pub fn seed(&self) -> u64 {
        self.seed.unwrap_or(1)
    }

    pub fn build_topology(&self) -> Result<Topology, TopologyError> {
        self.topology.build(self.seed())
    }

    pub fn session_config(&self) -> SessionConfig {
        match &self.timing {
            Some(t) => t.apply(SessionConfig::default()),
            None => SessionConfig::default(),
        }
    }

    pub fn request(&self) -> TransferRequest {
        TransferRequest {
            source: self.transfer.source,
            destination: self.transfer.destination,
            message_size: self.transfer.message_size,
            mtu: self.transfer.mtu,
            error_rate: self.transfer.error_rate.unwrap_or(0),
            mode: self.transfer.mode.unwrap_or_default(),
            strategy: self.routing.unwrap_or_default(),
        }
    }
}
