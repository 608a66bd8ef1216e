use crate::proto::TransmissionMode;
use crate::proto::sweep::{
    base_traffic, default_error_domain, default_mtu_domain, expected_traffic, packets_vs_mtu,
    traffic_vs_error, traffic_vs_mtu,
};

#[test]
fn half_loss_doubles_traffic() {
    assert_eq!(expected_traffic(1_000, 0.5), Some(2_000.0));
    assert_eq!(expected_traffic(1_000, 0.0), Some(1_000.0));
    assert_eq!(expected_traffic(1_000, 1.0), None);
    assert_eq!(expected_traffic(1_000, -0.1), None);
}

#[test]
fn error_sweep_excludes_certain_loss() {
    let points = traffic_vs_error(1_000, [0, 50, 100, 120]);
    assert_eq!(points.len(), 2);
    assert_eq!((points[1].x, points[1].y), (50.0, 2_000.0));
}

#[test]
fn base_traffic_adds_service_bytes() {
    assert_eq!(base_traffic(1_000, 140, TransmissionMode::Datagram), Ok(1_400));
    assert_eq!(base_traffic(1_000, 140, TransmissionMode::Virtual), Ok(1_520));
    assert!(base_traffic(1_000, 40, TransmissionMode::Virtual).is_err());
}

#[test]
fn mtu_sweeps_skip_invalid_mtus() {
    let traffic = traffic_vs_mtu(1_000, TransmissionMode::Virtual, [30, 40, 140]);
    assert_eq!(traffic.len(), 1);
    assert_eq!((traffic[0].x, traffic[0].y), (140.0, 520.0));

    let packets = packets_vs_mtu(1_000, [40, 140, 1_040]);
    assert_eq!(packets.len(), 2);
    assert_eq!(packets[0].y, 10.0);
    assert_eq!(packets[1].y, 1.0);
}

#[test]
fn default_domains_cover_chart_ranges() {
    let mtus: Vec<u32> = default_mtu_domain().collect();
    assert_eq!(mtus.first(), Some(&50));
    assert_eq!(mtus.last(), Some(&1_500));
    assert_eq!(mtus.len(), 146);

    let errors: Vec<u32> = default_error_domain().collect();
    assert_eq!(errors.first(), Some(&0));
    assert_eq!(errors.last(), Some(&80));
    assert_eq!(errors.len(), 41);
}

#[test]
fn packet_count_does_not_grow_with_mtu() {
    let points = packets_vs_mtu(10_000, default_mtu_domain());
    assert_eq!(points.len(), 146);
    assert!(points.windows(2).all(|w| w[1].y <= w[0].y));

    let traffic = traffic_vs_mtu(10_000, TransmissionMode::Datagram, default_mtu_domain());
    assert!(traffic.windows(2).all(|w| w[1].y <= w[0].y));
}
