use crate::error::RouteError;
use crate::net::{
    EdgeKind, NodeId, RoutingStrategy, RoutingTable, Topology, route_table, route_to,
};
use crate::topo::chain::build_chain;
use crate::topo::regions::{RegionsOpts, build_regions};

fn ids(v: &[u32]) -> Vec<NodeId> {
    v.iter().copied().map(NodeId).collect()
}

/// 1 -1- 2 -1- 3，另有一条直连 1 -10- 3
fn triangle() -> Topology {
    let mut topo = Topology::new();
    for i in 1..=3 {
        topo.add_node(NodeId(i)).expect("add node");
    }
    topo.connect(NodeId(1), NodeId(2), 1, EdgeKind::Duplex).expect("connect");
    topo.connect(NodeId(2), NodeId(3), 1, EdgeKind::Duplex).expect("connect");
    topo.connect(NodeId(1), NodeId(3), 10, EdgeKind::Duplex).expect("connect");
    topo
}

#[test]
fn chain_routes_agree_for_both_strategies() {
    let (topo, _) = build_chain(&[5, 7]).expect("chain");

    for strategy in [RoutingStrategy::Weighted, RoutingStrategy::MinHop] {
        let table = RoutingTable::compute(&topo, NodeId(1), strategy);
        let entry = table.get(NodeId(3)).expect("route to 3");
        assert_eq!(entry.path, ids(&[1, 2, 3]), "{strategy}");
        assert_eq!(entry.cost, 12, "{strategy}");
        assert_eq!(entry.next_hop(), Some(NodeId(2)));
        assert_eq!(entry.hop_count(), 2);

        let to2 = table.get(NodeId(2)).expect("route to 2");
        assert_eq!(to2.cost, 5);
    }
}

#[test]
fn min_hop_reports_true_weight_of_hop_minimal_path() {
    let topo = triangle();

    let weighted = route_to(&topo, NodeId(1), NodeId(3), RoutingStrategy::Weighted)
        .expect("weighted route");
    assert_eq!(weighted.path, ids(&[1, 2, 3]));
    assert_eq!(weighted.cost, 2);

    let min_hop =
        route_to(&topo, NodeId(1), NodeId(3), RoutingStrategy::MinHop).expect("min-hop route");
    assert_eq!(min_hop.path, ids(&[1, 3]));
    assert_eq!(min_hop.cost, 10);
}

#[test]
fn equal_cost_ties_resolve_by_node_id() {
    // 菱形：1-2-4 与 1-3-4 代价相同
    let mut topo = Topology::new();
    for i in 1..=4 {
        topo.add_node(NodeId(i)).expect("add node");
    }
    for (a, b) in [(1, 3), (1, 2), (3, 4), (2, 4)] {
        topo.connect(NodeId(a), NodeId(b), 1, EdgeKind::Duplex).expect("connect");
    }

    let weighted = route_to(&topo, NodeId(1), NodeId(4), RoutingStrategy::Weighted)
        .expect("weighted route");
    assert_eq!(weighted.path, ids(&[1, 2, 4]));

    // BFS 按关联边的连接顺序扩展，先发现 3
    let min_hop =
        route_to(&topo, NodeId(1), NodeId(4), RoutingStrategy::MinHop).expect("min-hop route");
    assert_eq!(min_hop.path, ids(&[1, 3, 4]));
    assert_eq!(min_hop.cost, 2);

    for _ in 0..5 {
        assert_eq!(
            route_table(&topo, NodeId(1), RoutingStrategy::Weighted),
            route_table(&topo, NodeId(1), RoutingStrategy::Weighted)
        );
    }
}

#[test]
fn weighted_cost_never_exceeds_min_hop_cost() {
    for seed in 1..=8 {
        let g = build_regions(&RegionsOpts {
            seed,
            ..RegionsOpts::default()
        })
        .expect("regions");
        for start in [NodeId(1), NodeId(5), NodeId(14), NodeId(27)] {
            let weighted = RoutingTable::compute(&g.topo, start, RoutingStrategy::Weighted);
            let min_hop = RoutingTable::compute(&g.topo, start, RoutingStrategy::MinHop);
            assert_eq!(weighted.entries().len(), min_hop.entries().len());

            for w in weighted.entries() {
                let m = min_hop.get(w.destination).expect("same reachability");
                assert!(
                    w.cost <= m.cost,
                    "seed {seed}: {start} -> {} weighted {} > min-hop {}",
                    w.destination,
                    w.cost,
                    m.cost
                );
                assert!(w.hop_count() >= m.hop_count());
            }
        }
    }
}

#[test]
fn start_node_never_appears_in_its_own_table() {
    let topo = triangle();
    for start in topo.node_ids() {
        for strategy in [RoutingStrategy::Weighted, RoutingStrategy::MinHop] {
            let table = route_table(&topo, start, strategy);
            assert_eq!(table.len(), 2);
            assert!(table.iter().all(|e| e.destination != start));
            assert!(table.iter().all(|e| e.path.first() == Some(&start)));
        }
    }
}

#[test]
fn missing_start_or_empty_topology_yields_empty_table() {
    let topo = triangle();
    assert!(route_table(&topo, NodeId(42), RoutingStrategy::Weighted).is_empty());
    assert!(route_table(&topo, NodeId(42), RoutingStrategy::MinHop).is_empty());
    assert!(route_table(&Topology::new(), NodeId(1), RoutingStrategy::Weighted).is_empty());
}

#[test]
fn unreachable_destination_has_no_entry() {
    let mut topo = triangle();
    topo.add_node(NodeId(9)).expect("add node");

    let table = RoutingTable::compute(&topo, NodeId(1), RoutingStrategy::Weighted);
    assert!(table.get(NodeId(9)).is_none());
    assert_eq!(
        table.entries().iter().map(|e| e.destination).collect::<Vec<_>>(),
        ids(&[2, 3])
    );
}

#[test]
fn route_to_reports_missing_start_and_missing_path() {
    let mut topo = triangle();
    topo.add_node(NodeId(9)).expect("add node");

    assert_eq!(
        route_to(&topo, NodeId(42), NodeId(1), RoutingStrategy::Weighted),
        Err(RouteError::NoStartNode(NodeId(42)))
    );
    assert_eq!(
        route_to(&topo, NodeId(1), NodeId(9), RoutingStrategy::MinHop),
        Err(RouteError::NoPath {
            from: NodeId(1),
            to: NodeId(9)
        })
    );
    assert_eq!(
        route_to(&topo, NodeId(1), NodeId(1), RoutingStrategy::Weighted),
        Err(RouteError::NoPath {
            from: NodeId(1),
            to: NodeId(1)
        })
    );
}

#[test]
fn routing_strategy_parses_from_cli_names() {
    assert_eq!("weighted".parse::<RoutingStrategy>(), Ok(RoutingStrategy::Weighted));
    assert_eq!("min_hop".parse::<RoutingStrategy>(), Ok(RoutingStrategy::MinHop));
    assert_eq!("Min-Hop".parse::<RoutingStrategy>(), Ok(RoutingStrategy::MinHop));
    assert!("fastest".parse::<RoutingStrategy>().is_err());
    assert_eq!(RoutingStrategy::MinHop.to_string(), "min_hop");
}
