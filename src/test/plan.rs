use crate::error::PlanError;
use crate::proto::{HEADER_SIZE, TransmissionMode, TransmissionPlan};

#[test]
fn thousand_bytes_over_mtu_140() {
    let dg = TransmissionPlan::compute(1_000, 140, TransmissionMode::Datagram, 2).expect("plan");
    assert_eq!(dg.max_payload, 100);
    assert_eq!(dg.total_packets, 10);
    assert_eq!(dg.service_traffic_bytes, 400);
    assert_eq!(dg.total_traffic_bytes, 1_400);
    assert!((dg.estimated_time_ms - 160.0).abs() < 1e-9);

    let vc = TransmissionPlan::compute(1_000, 140, TransmissionMode::Virtual, 2).expect("plan");
    assert_eq!(vc.total_packets, 10);
    assert_eq!(vc.service_traffic_bytes, 520);
    assert_eq!(vc.total_traffic_bytes, 1_520);
    assert!((vc.estimated_time_ms - 206.4).abs() < 1e-9);
}

#[test]
fn last_packet_carries_the_remainder() {
    let plan = TransmissionPlan::compute(1_000, 150, TransmissionMode::Datagram, 1).expect("plan");
    assert_eq!(plan.max_payload, 110);
    assert_eq!(plan.total_packets, 10);

    let payloads: Vec<u32> = plan.payloads().collect();
    assert_eq!(payloads.len(), 10);
    assert!(payloads[..9].iter().all(|&p| p == 110));
    assert_eq!(payloads[9], 10);
    assert_eq!(payloads.iter().map(|&p| p as u64).sum::<u64>(), 1_000);

    assert_eq!(plan.payload_of(0), 0);
    assert_eq!(plan.payload_of(11), 0);
}

#[test]
fn exact_multiple_fills_every_packet() {
    let plan = TransmissionPlan::compute(500, 140, TransmissionMode::Virtual, 3).expect("plan");
    assert_eq!(plan.total_packets, 5);
    assert!(plan.payloads().all(|p| p == 100));
}

#[test]
fn mtu_not_above_header_is_rejected() {
    for mtu in [0, 1, HEADER_SIZE] {
        assert_eq!(
            TransmissionPlan::compute(1_000, mtu, TransmissionMode::Virtual, 2),
            Err(PlanError::InvalidMtu {
                packet_size: mtu,
                header_size: HEADER_SIZE
            })
        );
    }

    let tiny = TransmissionPlan::compute(1_000, HEADER_SIZE + 1, TransmissionMode::Datagram, 2)
        .expect("plan");
    assert_eq!(tiny.max_payload, 1);
    assert_eq!(tiny.total_packets, 1_000);
}

#[test]
fn empty_message_is_rejected_after_mtu_check() {
    assert_eq!(
        TransmissionPlan::compute(0, 140, TransmissionMode::Datagram, 2),
        Err(PlanError::EmptyMessage)
    );
    assert!(matches!(
        TransmissionPlan::compute(0, 40, TransmissionMode::Datagram, 2),
        Err(PlanError::InvalidMtu { .. })
    ));
}

#[test]
fn transmission_mode_names() {
    assert_eq!(TransmissionMode::Virtual.to_string(), "Virtual");
    assert_eq!(TransmissionMode::Datagram.to_string(), "Datagram");
    assert_eq!("datagram".parse::<TransmissionMode>(), Ok(TransmissionMode::Datagram));
    assert_eq!("VIRTUAL".parse::<TransmissionMode>(), Ok(TransmissionMode::Virtual));
    assert_eq!(TransmissionMode::default(), TransmissionMode::Virtual);
}
