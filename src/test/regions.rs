use crate::net::{EdgeKind, NodeId, RoutingStrategy, RoutingTable};
use crate::topo::regions::{RegionsOpts, WEIGHT_CHOICES, build_regions};

#[test]
fn default_layout_has_three_regions_of_nine() {
    let g = build_regions(&RegionsOpts::default()).expect("regions");
    assert_eq!(g.topo.node_count(), 27);
    assert_eq!(g.regions.len(), 3);
    assert!(g.regions.iter().all(|r| r.len() == 9));
    assert_eq!(g.gateways, vec![NodeId(1), NodeId(10), NodeId(19)]);
    assert_eq!(g.topo.node_ids().next(), Some(NodeId(1)));
    assert_eq!(g.topo.max_node_id(), Some(NodeId(27)));

    // 3 个环 + 网关三角形，外加至多 12 条弦
    let min_edges = 3 * 9 + 3;
    assert!(g.topo.edge_count() >= min_edges);
    assert!(g.topo.edge_count() <= min_edges + 12);
}

#[test]
fn every_node_is_reachable() {
    for seed in 1..=5 {
        let g = build_regions(&RegionsOpts {
            seed,
            ..RegionsOpts::default()
        })
        .expect("regions");
        let table = RoutingTable::compute(&g.topo, NodeId(1), RoutingStrategy::MinHop);
        assert_eq!(table.entries().len(), 26, "seed {seed}");
    }
}

#[test]
fn weights_come_from_the_fixed_set() {
    let g = build_regions(&RegionsOpts {
        seed: 17,
        ..RegionsOpts::default()
    })
    .expect("regions");
    for e in g.topo.edges() {
        let ok = match e.kind() {
            EdgeKind::Duplex => WEIGHT_CHOICES.contains(&e.weight()),
            EdgeKind::HalfDuplex => WEIGHT_CHOICES.iter().any(|w| w * 3 / 2 == e.weight()),
        };
        assert!(ok, "edge {} has weight {} ({:?})", e.id(), e.weight(), e.kind());
    }
}

#[test]
fn same_seed_same_topology() {
    let opts = RegionsOpts {
        seed: 23,
        ..RegionsOpts::default()
    };
    let a = build_regions(&opts).expect("regions");
    let b = build_regions(&opts).expect("regions");
    assert_eq!(a.topo.snapshot(), b.topo.snapshot());
}

#[test]
fn tiny_regions_still_connect() {
    let g = build_regions(&RegionsOpts {
        regions: 2,
        nodes_per_region: 2,
        chords_per_region: 0,
        ..RegionsOpts::default()
    })
    .expect("regions");
    assert_eq!(g.topo.node_count(), 4);
    assert_eq!(g.topo.edge_count(), 3);
}
