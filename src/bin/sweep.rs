//! 派生指标扫描
//!
//! 输出 CSV（x,y），供外部绘图。

use clap::{Parser, ValueEnum};
use routesim_rs::proto::TransmissionMode;
use routesim_rs::proto::sweep::{
    SweepPoint, base_traffic, default_error_domain, default_mtu_domain, packets_vs_mtu,
    traffic_vs_error, traffic_vs_mtu,
};
use std::process::ExitCode;
use tracing::info;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Series {
    /// Service traffic (B) vs MTU
    TrafficMtu,
    /// Packet count vs MTU
    PacketsMtu,
    /// Expected total traffic (B) vs error probability (%)
    TrafficError,
}

#[derive(Debug, Parser)]
#[command(name = "sweep", about = "服务流量 / 包数 / 误码下总流量的扫描曲线")]
struct Args {
    #[arg(long, value_enum)]
    series: Series,
    #[arg(long, default_value_t = 1_000)]
    message_size: u64,
    /// MTU used by the error sweep
    #[arg(long, default_value_t = 140)]
    mtu: u32,
    /// virtual or datagram
    #[arg(long, default_value = "virtual")]
    mode: TransmissionMode,
    /// Domain start; defaults to 50 (MTU) or 0 (error %)
    #[arg(long)]
    from: Option<u32>,
    /// Domain end (inclusive); defaults to 1500 (MTU) or 80 (error %)
    #[arg(long)]
    to: Option<u32>,
    #[arg(long)]
    step: Option<u32>,
}

fn domain(args: &Args, default: Vec<u32>) -> Vec<u32> {
    if args.from.is_none() && args.to.is_none() && args.step.is_none() {
        return default;
    }
    let from = args.from.or(default.first().copied()).unwrap_or(0);
    let to = args.to.or(default.last().copied()).unwrap_or(from);
    let default_step = match default.as_slice() {
        [a, b, ..] => b - a,
        _ => 1,
    };
    let step = args.step.unwrap_or(default_step).max(1) as usize;
    (from..=to).step_by(step).collect()
}

fn run(args: Args) -> Result<Vec<SweepPoint>, String> {
    let points = match args.series {
        Series::TrafficMtu => {
            let mtus = domain(&args, default_mtu_domain().collect());
            traffic_vs_mtu(args.message_size, args.mode, mtus)
        }
        Series::PacketsMtu => {
            let mtus = domain(&args, default_mtu_domain().collect());
            packets_vs_mtu(args.message_size, mtus)
        }
        Series::TrafficError => {
            let base = base_traffic(args.message_size, args.mtu, args.mode)
                .map_err(|e| e.to_string())?;
            traffic_vs_error(base, domain(&args, default_error_domain().collect()))
        }
    };
    info!(series = ?args.series, mode = %args.mode, points = points.len(), "扫描完成");
    Ok(points)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(points) => {
            println!("x,y");
            for p in points {
                println!("{},{}", p.x, p.y);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("[ERROR] {e}");
            ExitCode::from(2)
        }
    }
}
