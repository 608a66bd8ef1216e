//! 单次传输仿真
//!
//! 计算路由、分片计划，然后按虚电路或数据报模式逐包仿真，打印日志与结果行。

use clap::Parser;
use routesim_rs::net::{NodeId, RoutingStrategy, Topology, format_path};
use routesim_rs::proto::{
    RetryPolicy, SessionConfig, TransferRequest, TransmissionMode, run_transfer,
};
use routesim_rs::report::{ResultRow, SessionEvent, SessionEventKind};
use routesim_rs::sim::{ScenarioSpec, SimTime};
use routesim_rs::topo::chain::build_chain;
use routesim_rs::topo::regions::{RegionsOpts, build_regions};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "transfer-sim", about = "路由 + 分片 + 逐包丢包/重传仿真")]
struct Args {
    /// Path to scenario.json; CLI flags override its values
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Build a chain topology 1-2-3-... with these comma-separated weights
    #[arg(long)]
    chain: Option<String>,

    #[arg(long)]
    source: Option<u32>,
    #[arg(long)]
    destination: Option<u32>,
    /// 报文大小（字节）
    #[arg(long)]
    message_size: Option<u64>,
    /// 包大小（MTU，字节，含 40 字节包头）
    #[arg(long)]
    mtu: Option<u32>,
    /// 每跳丢包率（百分比）
    #[arg(long)]
    error_rate: Option<u32>,
    /// virtual or datagram
    #[arg(long)]
    mode: Option<TransmissionMode>,
    /// weighted or min_hop
    #[arg(long)]
    routing: Option<RoutingStrategy>,
    #[arg(long)]
    seed: Option<u64>,

    /// Per-packet retransmission cap (virtual mode); unbounded when absent
    #[arg(long)]
    max_retransmissions: Option<u32>,

    /// Stop at this simulated time (ms) even if the session is still running
    #[arg(long)]
    until_ms: Option<u64>,

    /// Write the ordered event stream as JSON
    #[arg(long)]
    events_json: Option<PathBuf>,
}

fn load_scenario(path: &PathBuf) -> Result<ScenarioSpec, String> {
    let raw = fs::read_to_string(path).map_err(|e| format!("read {}: {e}", path.display()))?;
    serde_json::from_str(&raw).map_err(|e| format!("parse {}: {e}", path.display()))
}

fn parse_weights(s: &str) -> Result<Vec<u32>, String> {
    s.split(',')
        .map(|w| w.trim().parse::<u32>().map_err(|e| format!("bad weight {w:?}: {e}")))
        .collect()
}

fn describe(ev: &SessionEvent) -> String {
    let t = ev.t_ms;
    match &ev.kind {
        SessionEventKind::PhaseEnter { phase } => format!("{t:>8} === [{phase}] ==="),
        SessionEventKind::PhaseExit { phase } => format!("{t:>8}     [{phase}] done"),
        SessionEventKind::PacketSent {
            seq,
            packet,
            payload_bytes,
            retransmission,
        } => format!(
            "{t:>8} -> [{packet}] #{seq} sent ({payload_bytes} B){}",
            if *retransmission { " (retransmission)" } else { "" }
        ),
        SessionEventKind::Retransmission {
            seq,
            packet,
            attempt,
        } => format!("{t:>8} !! [RETRY] {packet} #{seq} attempt {attempt}"),
        SessionEventKind::PacketDelivered {
            seq, packet, node, ..
        } => format!("{t:>8} >> [{packet}] #{seq} delivered at node {node}"),
        SessionEventKind::PacketLost {
            seq,
            packet,
            at_node,
        } => format!("{t:>8} xx [LOSS] {packet} #{seq} lost on the way to node {at_node}"),
        SessionEventKind::SessionComplete(row) => format!(
            "{t:>8} [FINISH] delivered={} ({}/{} packets, {} retransmissions)",
            row.delivered, row.packets_delivered, row.packets, row.retransmissions
        ),
    }
}

fn run(args: Args) -> Result<(), String> {
    let scenario = args.scenario.as_ref().map(load_scenario).transpose()?;
    let seed = args
        .seed
        .or_else(|| scenario.as_ref().map(ScenarioSpec::seed))
        .unwrap_or(1);

    let topo: Topology = if let Some(chain) = &args.chain {
        build_chain(&parse_weights(chain)?).map_err(|e| e.to_string())?.0
    } else if let Some(sc) = &scenario {
        sc.build_topology().map_err(|e| e.to_string())?
    } else {
        let opts = RegionsOpts {
            seed,
            ..RegionsOpts::default()
        };
        build_regions(&opts).map_err(|e| e.to_string())?.topo
    };

    let base = scenario.as_ref().map(ScenarioSpec::request);
    let req = TransferRequest {
        source: args
            .source
            .map(NodeId)
            .or(base.as_ref().map(|r| r.source))
            .unwrap_or(NodeId(1)),
        destination: args
            .destination
            .map(NodeId)
            .or(base.as_ref().map(|r| r.destination))
            .or(topo.max_node_id())
            .unwrap_or(NodeId(2)),
        message_size: args
            .message_size
            .or(base.as_ref().map(|r| r.message_size))
            .unwrap_or(1_000),
        mtu: args.mtu.or(base.as_ref().map(|r| r.mtu)).unwrap_or(140),
        error_rate: args
            .error_rate
            .or(base.as_ref().map(|r| r.error_rate))
            .unwrap_or(0),
        mode: args
            .mode
            .or(base.as_ref().map(|r| r.mode))
            .unwrap_or_default(),
        strategy: args
            .routing
            .or(base.as_ref().map(|r| r.strategy))
            .unwrap_or_default(),
    };

    let mut cfg = scenario
        .as_ref()
        .map_or_else(SessionConfig::default, ScenarioSpec::session_config);
    if let Some(n) = args.max_retransmissions {
        cfg.retry_policy = RetryPolicy::Limited(n);
    }

    let report = run_transfer(
        &topo,
        &req,
        cfg,
        seed,
        args.until_ms.map(SimTime::from_millis),
    )
    .map_err(|e| format!("[ERROR] {e}"))?;

    println!("--------------------------------------------------");
    println!("ROUTE ({}): cost = {}", req.strategy, report.route.cost);
    println!("path: {}", format_path(&report.route.path, " -> "));
    println!("--------------------------------------------------");
    println!("MTU: {} B, payload: {} B", report.plan.packet_size, report.plan.max_payload);
    println!("data packets: {}", report.plan.total_packets);
    println!("service traffic: {} B", report.plan.service_traffic_bytes);
    println!("estimated time: {:.2} ms", report.plan.estimated_time_ms);
    println!("--------------------------------------------------");
    for ev in &report.events {
        println!("{}", describe(ev));
    }

    match &report.result {
        Some(row) => {
            println!("{}", ResultRow::HEADERS.join("\t"));
            println!("{}", row.cells().join("\t"));
        }
        None => println!(
            "[UNFINISHED] phase={} delivered={}/{} retransmissions={}",
            report.phase,
            report.packets_delivered,
            report.plan.total_packets,
            report.retransmissions
        ),
    }

    if let Some(path) = &args.events_json {
        let json = serde_json::to_string_pretty(&report.events)
            .map_err(|e| format!("serialize events: {e}"))?;
        fs::write(path, json).map_err(|e| format!("write {}: {e}", path.display()))?;
    }

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(2)
        }
    }
}
