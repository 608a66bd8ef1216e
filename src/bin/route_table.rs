//! 路由表查看
//!
//! 打印某个节点到其他所有可达节点的路由（按目的地 id 排序）。

use clap::Parser;
use routesim_rs::net::{NodeId, RoutingStrategy, RoutingTable, Topology};
use routesim_rs::report::RouteRow;
use routesim_rs::sim::ScenarioSpec;
use routesim_rs::topo::chain::build_chain;
use routesim_rs::topo::regions::{RegionsOpts, build_regions};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "route-table", about = "打印节点的路由表（加权最短路或最少跳数）")]
struct Args {
    /// Router whose table is printed
    #[arg(long, default_value_t = 1)]
    node: u32,

    /// weighted or min_hop
    #[arg(long, default_value = "weighted")]
    routing: RoutingStrategy,

    /// Read the topology from scenario.json
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Chain topology 1-2-3-... with these comma-separated weights
    #[arg(long)]
    chain: Option<String>,

    /// Seed for the generated three-region topology
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Print rows as JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn build_topology(args: &Args) -> Result<Topology, String> {
    if let Some(chain) = &args.chain {
        let weights = chain
            .split(',')
            .map(|w| w.trim().parse::<u32>().map_err(|e| format!("bad weight {w:?}: {e}")))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(build_chain(&weights).map_err(|e| e.to_string())?.0);
    }
    if let Some(path) = &args.scenario {
        let raw = fs::read_to_string(path).map_err(|e| format!("read {}: {e}", path.display()))?;
        let sc: ScenarioSpec =
            serde_json::from_str(&raw).map_err(|e| format!("parse {}: {e}", path.display()))?;
        return sc.build_topology().map_err(|e| e.to_string());
    }
    let opts = RegionsOpts {
        seed: args.seed,
        ..RegionsOpts::default()
    };
    Ok(build_regions(&opts).map_err(|e| e.to_string())?.topo)
}

fn run(args: Args) -> Result<(), String> {
    let topo = build_topology(&args)?;
    let origin = NodeId(args.node);
    if !topo.contains(origin) {
        return Err(format!("[ERROR] node {origin} not found"));
    }

    let table = RoutingTable::compute(&topo, origin, args.routing);
    let rows: Vec<RouteRow> = table
        .entries()
        .iter()
        .map(|e| RouteRow::from_entry(origin, e))
        .collect();

    if args.json {
        let json = serde_json::to_string_pretty(&rows).map_err(|e| e.to_string())?;
        println!("{json}");
    } else {
        println!("routing table of router #{origin} ({})", args.routing);
        println!("{}", RouteRow::HEADERS.join("\t"));
        for row in &rows {
            println!("{row}");
        }
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
