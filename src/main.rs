// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use render_graph::config::{
    load_and_validate_graph, load_config, load_graph, persist_updates, save_graph,
    validate_graph, Config, RuntimeBuilder,
};
use render_graph::engine::{NodeOutcome, RunReport};
use render_graph::graph::{ConnectionDecision, ConnectionGate, Edge, ImageRole};

#[derive(Debug, Parser)]
#[command(name = "render-graph", version, about = "Evaluate generative-media node graphs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Evaluate a target node, or every output node when no target is given
    Run {
        graph: PathBuf,
        #[arg(long)]
        target: Option<String>,
        /// Runtime configuration (YAML, JSON, or TOML)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Record service calls instead of sending them
        #[arg(long)]
        dry_run: bool,
        /// Leave the graph file untouched instead of saving uploaded image URLs into it
        #[arg(long)]
        no_write_back: bool,
    },
    /// Check a graph for structural errors and warnings
    Validate { graph: PathBuf },
    /// Connect two nodes, choosing an image role when the target needs one
    Connect {
        graph: PathBuf,
        source: String,
        target: String,
        /// object, scene, or fuse
        #[arg(long)]
        role: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match Cli::parse().command {
        Command::Run {
            graph,
            target,
            config,
            dry_run,
            no_write_back,
        } => run(&graph, target.as_deref(), config.as_deref(), dry_run, !no_write_back).await,
        Command::Validate { graph } => validate(&graph),
        Command::Connect {
            graph,
            source,
            target,
            role,
        } => connect(&graph, source, target, role.as_deref()),
    }
}

async fn run(
    graph_path: &Path,
    target: Option<&str>,
    config_path: Option<&Path>,
    dry_run: bool,
    write_back: bool,
) -> Result<()> {
    let total = Instant::now();
    let config = match config_path {
        Some(path) => load_config(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    let mut doc = load_and_validate_graph(graph_path)
        .with_context(|| format!("loading graph {}", graph_path.display()))?;
    let executor = RuntimeBuilder::from_config(&config, dry_run)?;
    let model = doc.to_model();

    println!("📋 Graph: {}", graph_path.display());
    println!("🔧 Strategy: {}", config.strategy.as_str());
    println!("⚙️  Max Concurrency: {}", config.executor_options.max_concurrency());
    if dry_run {
        println!("🧪 Dry run: service calls are recorded, not sent");
    }

    let reports = match target {
        Some(target) => vec![executor.run(&model, target).await?],
        None => executor.run_outputs(&model).await?,
    };
    if reports.is_empty() {
        println!("\nNo output nodes to evaluate");
    }

    for report in &reports {
        print_report(report);
    }

    let updates: Vec<_> = reports.iter().flat_map(|r| r.node_updates.clone()).collect();
    if write_back && !updates.is_empty() {
        let applied = persist_updates(&mut doc, &updates, graph_path)?;
        println!("\n💾 Applied {} node update(s) to {}", applied, graph_path.display());
    } else if !updates.is_empty() {
        println!("\n⚠️  {} node update(s) not saved; uploads will repeat next run", updates.len());
    }

    println!("\n⏱️  Total Time: {:?}", total.elapsed());
    Ok(())
}

fn print_report(report: &RunReport) {
    println!("\n🎯 Target: {}", report.target);
    match &report.outcome {
        NodeOutcome::Produced { result } => println!("   Result: {}", result),
        NodeOutcome::Empty { why } => println!("   No result: {}", why),
    }
    println!("   Nodes evaluated: {} in {:?}", report.outcomes.len(), report.duration);

    let mut ids: Vec<&String> = report.outcomes.keys().collect();
    ids.sort();
    for id in ids {
        if let Some(NodeOutcome::Empty { why }) = report.outcome_of(id) {
            if why.is_failure() {
                println!("   ❌ {}: {}", id, why);
            }
        }
    }
}

fn validate(graph_path: &Path) -> Result<()> {
    let doc = load_graph(graph_path)?;
    match validate_graph(&doc) {
        Ok(warnings) => {
            println!("✅ {} is valid ({} nodes, {} edges)", graph_path.display(), doc.nodes.len(), doc.edges.len());
            for warning in warnings {
                println!("   ⚠️  {}", warning);
            }
            Ok(())
        }
        Err(errors) => {
            for error in &errors {
                println!("   ❌ {}", error);
            }
            bail!("{} has {} validation error(s)", graph_path.display(), errors.len())
        }
    }
}

fn connect(graph_path: &Path, source: String, target: String, role: Option<&str>) -> Result<()> {
    let mut doc = load_graph(graph_path)?;
    let mut gate = ConnectionGate::new();

    let edge = match gate.on_pending_connection(&mut doc, Edge::connect(source, target))? {
        ConnectionDecision::Committed(edge) => edge,
        ConnectionDecision::PendingClassification(edge) => {
            let Some(role) = role else {
                gate.abandon();
                bail!(
                    "connecting {} to {} needs --role (object, scene, or fuse)",
                    edge.source,
                    edge.target
                );
            };
            let Some(role) = ImageRole::parse(role) else {
                gate.abandon();
                bail!("unknown image role '{}'", role);
            };
            gate.classify_and_commit(&mut doc, role)?
        }
    };

    save_graph(&doc, graph_path)?;
    println!("🔗 Connected {} → {} ({})", edge.source, edge.target, edge.id);
    Ok(())
}
