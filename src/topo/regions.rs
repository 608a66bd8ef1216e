//! 多区域拓扑生成
//!
//! 每个区域是一个环，再加若干随机弦；各区域的第一个节点作为网关，网关之间两两相连
//! （三个区域时即为三角形）。节点 id 从 1 开始连续分配。
//!
//! 边权从固定集合中抽取；一部分边为半双工，权重乘 1.5（向下取整）。

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::error::TopologyError;
use crate::net::{EdgeKind, NodeId, Topology};

/// 可选边权
pub const WEIGHT_CHOICES: [u32; 10] = [3, 5, 6, 7, 8, 10, 11, 15, 18, 21];

#[derive(Debug, Clone)]
pub struct RegionsOpts {
    pub regions: usize,
    pub nodes_per_region: usize,
    /// 每个区域尝试添加的随机弦数（两端相同时跳过）
    pub chords_per_region: usize,
    /// 半双工边所占百分比
    pub half_duplex_percent: u32,
    pub seed: u64,
}

impl Default for RegionsOpts {
    fn default() -> Self {
        Self {
            regions: 3,
            nodes_per_region: 9,
            chords_per_region: 4,
            half_duplex_percent: 30,
            seed: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegionsTopology {
    pub topo: Topology,
    /// regions[r] 为第 r 个区域的节点，按 id 升序
    pub regions: Vec<Vec<NodeId>>,
    pub gateways: Vec<NodeId>,
}

fn connect_random(
    topo: &mut Topology,
    rng: &mut ChaCha8Rng,
    a: NodeId,
    b: NodeId,
    half_duplex_percent: u32,
) -> Result<(), TopologyError> {
    let mut weight = WEIGHT_CHOICES[rng.gen_range(0..WEIGHT_CHOICES.len())];
    let kind = if rng.gen_range(0..100) < half_duplex_percent {
        EdgeKind::HalfDuplex
    } else {
        EdgeKind::Duplex
    };
    if kind == EdgeKind::HalfDuplex {
        weight = weight * 3 / 2;
    }
    topo.connect(a, b, weight, kind)?;
    Ok(())
}

/// 生成多区域拓扑
pub fn build_regions(opts: &RegionsOpts) -> Result<RegionsTopology, TopologyError> {
    let mut rng = ChaCha8Rng::seed_from_u64(opts.seed);
    let mut topo = Topology::new();
    let mut regions = Vec::with_capacity(opts.regions);
    let n = opts.nodes_per_region;

    for _ in 0..opts.regions {
        let nodes = (0..n)
            .map(|_| topo.add_next_node())
            .collect::<Result<Vec<NodeId>, _>>()?;

        if n >= 2 {
            for i in 0..n {
                let (a, b) = (nodes[i], nodes[(i + 1) % n]);
                // 两个节点的“环”只需一条边
                if n == 2 && i == 1 {
                    break;
                }
                connect_random(&mut topo, &mut rng, a, b, opts.half_duplex_percent)?;
            }
            for _ in 0..opts.chords_per_region {
                let i = rng.gen_range(0..n);
                let j = rng.gen_range(0..n);
                if i != j {
                    connect_random(&mut topo, &mut rng, nodes[i], nodes[j], opts.half_duplex_percent)?;
                }
            }
        }
        regions.push(nodes);
    }

    let gateways: Vec<NodeId> = regions.iter().filter_map(|r| r.first().copied()).collect();
    match gateways.len() {
        0 | 1 => {}
        2 => connect_random(&mut topo, &mut rng, gateways[0], gateways[1], opts.half_duplex_percent)?,
        g => {
            for i in 0..g {
                connect_random(
                    &mut topo,
                    &mut rng,
                    gateways[i],
                    gateways[(i + 1) % g],
                    opts.half_duplex_percent,
                )?;
            }
        }
    }

    info!(
        nodes = topo.node_count(),
        edges = topo.edge_count(),
        regions = opts.regions,
        seed = opts.seed,
        "生成多区域拓扑"
    );

    Ok(RegionsTopology {
        topo,
        regions,
        gateways,
    })
}
