//! Hydronet CLI - rank and order hydrographic flow networks

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use hydronet_algorithms::network::{
    assign_ranks, compute_orders, find_cycle, run_by_basin, run_pipeline, CycleReport,
    MainstemPolicy, OrderParams, PipelineParams, PipelineReport, RankParams,
};
use hydronet_core::graph::{EdgeType, Graph, Rank};
use hydronet_core::CoordinateUnits;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "hydronet")]
#[command(author, version, about = "Rank and order hydrographic flow networks", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a graph file
    Info {
        /// Input graph (JSON)
        input: PathBuf,
    },
    /// Check the graph for cycles and nodes that cannot reach a sink
    Validate {
        /// Input graph (JSON)
        input: PathBuf,
        /// Report unreachable nodes without failing
        #[arg(long)]
        accept_unreachable: bool,
    },
    /// Assign PRIMARY/SECONDARY rank at divergences
    Rank {
        /// Input graph (JSON)
        input: PathBuf,
        /// Output graph (JSON)
        output: PathBuf,
        #[command(flatten)]
        rank: RankArgs,
    },
    /// Compute stream orders on an already ranked graph
    Order {
        /// Input graph (JSON)
        input: PathBuf,
        /// Output graph (JSON)
        output: PathBuf,
        #[command(flatten)]
        order: OrderArgs,
    },
    /// Rank, validate and order in one pass
    Run {
        /// Input graph (JSON)
        input: PathBuf,
        /// Output graph (JSON)
        output: PathBuf,
        #[command(flatten)]
        rank: RankArgs,
        #[command(flatten)]
        order: OrderArgs,
        /// Process each drainage basin independently
        #[arg(long)]
        by_basin: bool,
    },
}

#[derive(Args, Debug, Clone)]
struct RankArgs {
    /// Coordinate units of the geometry: meters, degrees
    #[arg(short, long, default_value = "meters")]
    units: String,
    /// Weight of channel width against angle at divergences (0 to 1)
    #[arg(short = 'w', long)]
    channel_weight: Option<f64>,
}

#[derive(Args, Debug, Clone)]
struct OrderArgs {
    /// Mainstem policy: basic, named
    #[arg(short, long, default_value = "basic")]
    policy: String,
    /// Order the graph even if some nodes cannot reach a sink
    #[arg(long)]
    accept_unreachable: bool,
}

impl RankArgs {
    fn params(&self) -> Result<RankParams> {
        let units: CoordinateUnits = self.units.parse()?;
        let mut params = RankParams::for_units(units);
        if let Some(w) = self.channel_weight {
            params.channel_weight = w;
        }
        params.validate()?;
        Ok(params)
    }
}

impl OrderArgs {
    fn params(&self) -> Result<OrderParams> {
        let policy: MainstemPolicy = self.policy.parse()?;
        Ok(OrderParams {
            policy,
            accept_unreachable: self.accept_unreachable,
        })
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to install logger")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_graph(path: &Path) -> Result<Graph> {
    let pb = spinner("Reading graph...");
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let graph: Graph =
        serde_json::from_reader(BufReader::new(file)).context("Failed to parse graph")?;
    pb.finish_and_clear();
    info!("Input: {} nodes, {} edges", graph.node_count(), graph.edge_count());
    Ok(graph)
}

fn write_graph(graph: &Graph, path: &Path) -> Result<()> {
    let pb = spinner("Writing output...");
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, graph).context("Failed to write graph")?;
    writer.flush().context("Failed to write graph")?;
    pb.finish_and_clear();
    Ok(())
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

/// Run the cycle check and turn its verdict into a CLI error
fn validate(graph: &Graph, accept_unreachable: bool) -> Result<CycleReport> {
    let report = find_cycle(graph);
    if !report.unreachable.is_empty() {
        let sample: Vec<String> =
            report.unreachable.iter().take(10).map(ToString::to_string).collect();
        println!(
            "Unreachable nodes: {} ({})",
            report.unreachable.len(),
            sample.join(", ")
        );
    }
    report.check(accept_unreachable).context("Graph failed validation")?;
    Ok(report)
}

fn print_report(report: &PipelineReport) {
    println!(
        "  Divergences: {} ({} width refined)",
        report.rank.divergences, report.rank.width_refined
    );
    println!("  Secondary edges: {}", report.rank.secondary_edges);
    if !report.cycle.unreachable.is_empty() {
        println!("  Unreachable nodes: {}", report.cycle.unreachable.len());
    }
    println!(
        "  Ordered edges: {} in {} mainstems ({} outlets)",
        report.order.ordered_edges, report.order.mainstems, report.order.outlets
    );
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Info { input } => {
            let graph = read_graph(&input)?;
            let count = |t: EdgeType| graph.edges().filter(|e| e.edge_type == t).count();
            let secondary = graph.edges().filter(|e| e.rank == Rank::Secondary).count();
            let ordered = graph.edges().filter(|e| e.orders.is_some()).count();

            println!("File: {}", input.display());
            println!("Nodes: {}", graph.node_count());
            println!(
                "Edges: {} (normal {}, bank {}, skeleton {})",
                graph.edge_count(),
                count(EdgeType::Normal),
                count(EdgeType::Bank),
                count(EdgeType::Skeleton)
            );
            println!("Sinks: {}", graph.sinks().count());
            println!("Divergences: {}", graph.divergences().count());
            println!("Waterbodies: {}", graph.waterbodies().count());
            println!("Secondary edges: {}", secondary);
            println!("Ordered edges: {}", ordered);
        }

        Commands::Validate {
            input,
            accept_unreachable,
        } => {
            let graph = read_graph(&input)?;
            let start = Instant::now();
            validate(&graph, accept_unreachable)?;
            let elapsed = start.elapsed();

            println!("Graph is acyclic");
            println!("  Processing time: {:.2?}", elapsed);
        }

        Commands::Rank {
            input,
            output,
            rank,
        } => {
            let params = rank.params()?;
            let mut graph = read_graph(&input)?;
            let start = Instant::now();
            let summary = assign_ranks(&mut graph, &params).context("Failed to assign ranks")?;
            let elapsed = start.elapsed();
            info!(
                "{} divergences, {} secondary edges",
                summary.divergences, summary.secondary_edges
            );
            write_graph(&graph, &output)?;
            done("Ranked graph", &output, elapsed);
        }

        Commands::Order {
            input,
            output,
            order,
        } => {
            let params = order.params()?;
            let mut graph = read_graph(&input)?;
            let start = Instant::now();
            let summary =
                compute_orders(&mut graph, &params).context("Failed to compute stream orders")?;
            let elapsed = start.elapsed();
            info!("{} edges in {} mainstems", summary.ordered_edges, summary.mainstems);
            write_graph(&graph, &output)?;
            done("Ordered graph", &output, elapsed);
        }

        Commands::Run {
            input,
            output,
            rank,
            order,
            by_basin,
        } => {
            let params = PipelineParams {
                rank: rank.params()?,
                order: order.params()?,
            };
            let mut graph = read_graph(&input)?;
            let start = Instant::now();
            let reports = if by_basin {
                let pb = spinner("Processing basins...");
                let reports = run_by_basin(&mut graph, &params).context("Pipeline failed")?;
                pb.finish_and_clear();
                info!("{} basins", reports.len());
                reports
            } else {
                vec![run_pipeline(&mut graph, &params).context("Pipeline failed")?]
            };
            let elapsed = start.elapsed();
            write_graph(&graph, &output)?;
            done("Network", &output, elapsed);
            for report in &reports {
                print_report(report);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::LineString;
    use hydronet_core::graph::{Edge, EdgeId, NodeId};

    fn rank_args(units: &str, channel_weight: Option<f64>) -> RankArgs {
        RankArgs {
            units: units.into(),
            channel_weight,
        }
    }

    #[test]
    fn test_rank_args_keyed_by_units() {
        let meters = rank_args("meters", None).params().unwrap();
        let degrees = rank_args("degrees", None).params().unwrap();
        assert_eq!(meters, RankParams::for_units(CoordinateUnits::Meters));
        assert_eq!(degrees, RankParams::for_units(CoordinateUnits::Degrees));
    }

    #[test]
    fn test_rank_args_override_and_validate() {
        let params = rank_args("meters", Some(0.25)).params().unwrap();
        assert_eq!(params.channel_weight, 0.25);
        assert!(rank_args("meters", Some(1.5)).params().is_err());
        assert!(rank_args("feet", None).params().is_err());
    }

    #[test]
    fn test_order_args_reject_unknown_policy() {
        let args = OrderArgs {
            policy: "widest".into(),
            accept_unreachable: false,
        };
        assert!(args.params().is_err());
    }

    #[test]
    fn test_graph_file_round_trip() {
        let mut graph = Graph::new();
        graph.add_node(NodeId(1)).unwrap();
        graph.add_node(NodeId(2)).unwrap();
        graph
            .add_edge(Edge::new(
                EdgeId(7),
                NodeId(1),
                NodeId(2),
                LineString::from(vec![(0.0, 0.0), (3.0, 4.0)]),
            ))
            .unwrap();

        let tmp = tempfile::NamedTempFile::new().unwrap();
        write_graph(&graph, tmp.path()).unwrap();
        let restored = read_graph(tmp.path()).unwrap();

        assert_eq!(restored.edge_count(), 1);
        assert_eq!(restored.edge_by_id(EdgeId(7)).unwrap().length, 5.0);
    }

    fn looped(edges: &[(u64, u64, u64)]) -> Graph {
        let mut graph = Graph::new();
        for &(id, from, to) in edges {
            graph.ensure_node(NodeId(from));
            graph.ensure_node(NodeId(to));
            let line = LineString::from(vec![(from as f64, 0.0), (to as f64, 0.0)]);
            graph.add_edge(Edge::new(EdgeId(id), NodeId(from), NodeId(to), line)).unwrap();
        }
        graph
    }

    #[test]
    fn test_validate_unreachable_needs_flag() {
        // Sink-less loop 1 <-> 2 next to a clean edge 3 -> 4.
        let graph = looped(&[(1, 1, 2), (2, 2, 1), (3, 3, 4)]);
        assert!(validate(&graph, false).is_err());
        let report = validate(&graph, true).unwrap();
        assert_eq!(report.unreachable.len(), 2);
    }

    #[test]
    fn test_validate_cycle_always_fails() {
        let graph = looped(&[(1, 1, 2), (2, 2, 1), (3, 2, 3)]);
        assert!(validate(&graph, false).is_err());
        assert!(validate(&graph, true).is_err());
    }
}
