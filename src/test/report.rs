use crate::net::{NodeId, PacketKind, RoutingEntry};
use crate::proto::{Phase, TransmissionMode};
use crate::report::{EventLog, ResultRow, RouteRow, SessionEventKind};

fn row(delivered: bool) -> ResultRow {
    ResultRow {
        source: NodeId(1),
        destination: NodeId(3),
        mode: TransmissionMode::Virtual,
        estimated_time_ms: 206.4,
        service_traffic_bytes: 520,
        packets: 10,
        message_size: 1_000,
        path: "1->2->3".to_string(),
        delivered,
        packets_delivered: 10,
        packets_dropped: 0,
        retransmissions: 0,
        finished_at_ms: 18_000,
    }
}

#[test]
fn route_row_formats_direction_and_path() {
    let entry = RoutingEntry {
        destination: NodeId(3),
        path: vec![NodeId(1), NodeId(2), NodeId(3)],
        cost: 12,
    };
    let r = RouteRow::from_entry(NodeId(1), &entry);
    assert_eq!(r.direction, "1 -> 3");
    assert_eq!(r.next_hop, "2");
    assert_eq!(r.full_path, "1 -> 2 -> 3");
    assert_eq!(r.to_string(), "1 -> 3\t2\t1 -> 2 -> 3\t12");
}

#[test]
fn result_row_cells_follow_headers() {
    let cells = row(false).cells();
    assert_eq!(cells.len(), ResultRow::HEADERS.len());
    assert_eq!(cells[2], "Virtual");
    assert_eq!(cells[3], "206.40");
    assert_eq!(cells[8], "No");
    assert_eq!(row(true).cells()[8], "Yes");
}

#[test]
fn events_serialize_flat_with_kind_tag() {
    let mut log = EventLog::default();
    log.push(
        2_000,
        1,
        SessionEventKind::PacketLost {
            seq: 4,
            packet: PacketKind::Data,
            at_node: NodeId(2),
        },
    );
    log.push(
        2_500,
        1,
        SessionEventKind::PhaseEnter {
            phase: Phase::DataTransfer,
        },
    );
    log.push(18_000, 1, SessionEventKind::SessionComplete(row(true)));

    let v = serde_json::to_value(&log.events).expect("serialize");
    assert_eq!(v[0]["kind"], "packet_lost");
    assert_eq!(v[0]["t_ms"], 2_000);
    assert_eq!(v[0]["packet"], "data");
    assert_eq!(v[0]["at_node"], 2);
    assert_eq!(v[1]["phase"], "data_transfer");
    assert_eq!(v[2]["kind"], "session_complete");
    assert_eq!(v[2]["path"], "1->2->3");
    assert_eq!(v[2]["delivered"], true);

    assert_eq!(log.result().map(|r| r.packets), Some(10));
    assert_eq!(
        log.count(|k| matches!(k, SessionEventKind::PacketLost { .. })),
        1
    );
    assert_eq!(log.take().len(), 3);
    assert!(log.is_empty());
}
