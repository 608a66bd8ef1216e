use crate::net::{EdgeKind, NodeId, RoutingStrategy};
use crate::proto::{RetryPolicy, SessionConfig, TransmissionMode, run_transfer};
use crate::sim::{ScenarioSpec, SimTime};

#[test]
fn explicit_scenario_parses_with_defaults() {
    let raw = r#"
{
    "schema_version": 1,
    "topology": {
        "kind": "explicit",
        "nodes": [1, 2, 3],
        "edges": [
            { "source": 1, "dest": 2 },
            { "source": 2, "dest": 3, "weight": 4, "kind": "half_duplex" }
        ]
    },
    "routing": "min_hop",
    "transfer": { "source": 1, "destination": 3, "message_size": 1000, "mtu": 140, "mode": "datagram" },
    "timing": { "hop_ms": 10, "max_retransmissions": 3 },
    "seed": 9
}
"#;
    let sc: ScenarioSpec = serde_json::from_str(raw).expect("parse scenario");
    assert_eq!(sc.seed(), 9);

    let topo = sc.build_topology().expect("build topology");
    assert_eq!(topo.node_count(), 3);
    let e12 = topo.edge_between(NodeId(1), NodeId(2)).expect("edge 1-2");
    assert_eq!((e12.weight(), e12.kind()), (10, EdgeKind::Duplex));
    let e23 = topo.edge_between(NodeId(3), NodeId(2)).expect("edge 2-3");
    assert_eq!((e23.weight(), e23.kind()), (4, EdgeKind::HalfDuplex));

    let req = sc.request();
    assert_eq!(req.strategy, RoutingStrategy::MinHop);
    assert_eq!(req.mode, TransmissionMode::Datagram);
    assert_eq!(req.error_rate, 0);

    let cfg = sc.session_config();
    assert_eq!(cfg.hop_duration, SimTime(10));
    assert_eq!(cfg.admit_interval, SessionConfig::default().admit_interval);
    assert_eq!(cfg.retry_policy, RetryPolicy::Limited(3));
}

#[test]
fn chain_scenario_runs_end_to_end() {
    let raw = r#"
{
    "schema_version": 1,
    "topology": { "kind": "chain", "weights": [5, 7] },
    "transfer": { "source": 1, "destination": 3, "message_size": 1000, "mtu": 140 }
}
"#;
    let sc: ScenarioSpec = serde_json::from_str(raw).expect("parse scenario");
    assert_eq!(sc.seed(), 1);
    let topo = sc.build_topology().expect("build topology");
    let report = run_transfer(&topo, &sc.request(), sc.session_config(), sc.seed(), None)
        .expect("run transfer");

    assert_eq!(report.route.cost, 12);
    assert_eq!(report.plan.mode, TransmissionMode::Virtual);
    assert!(report.result.expect("result").delivered);
}

#[test]
fn snapshot_and_regions_topologies() {
    let raw = r#"
{
    "kind": "snapshot",
    "nodes": [
        { "id": 1, "edges": [ { "id": 0, "source": 1, "dest": 2, "weight": 6 } ] },
        { "id": 2, "edges": [ { "id": 0, "source": 1, "dest": 2, "weight": 6 } ] }
    ]
}
"#;
    let spec: crate::sim::TopologySpec = serde_json::from_str(raw).expect("parse topology");
    let topo = spec.build(1).expect("build");
    assert_eq!(topo.edge_count(), 1);
    assert_eq!(topo.path_weight(&[NodeId(1), NodeId(2)]), Some(6));

    let spec: crate::sim::TopologySpec =
        serde_json::from_str(r#"{ "kind": "regions" }"#).expect("parse topology");
    let topo = spec.build(3).expect("build");
    assert_eq!(topo.node_count(), 27);
}

#[test]
fn invalid_explicit_edge_is_an_error() {
    let raw = r#"{ "kind": "explicit", "nodes": [1, 2], "edges": [ { "source": 1, "dest": 1 } ] }"#;
    let spec: crate::sim::TopologySpec = serde_json::from_str(raw).expect("parse topology");
    assert!(spec.build(1).is_err());
}
