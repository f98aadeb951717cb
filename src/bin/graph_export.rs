//! Dependency Graph Export
//!
//! Renders the type graph of one schema document as DOT. Lazy edges are
//! dashed and every cyclic group is drawn as a cluster.

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use schema_compiler::codegen::EmissionPlan;
use schema_compiler::loader::load_document;

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Dot,
    Svg,
}

#[derive(Parser)]
#[command(name = "schemac-graph")]
#[command(about = "Export the type dependency graph as DOT or SVG")]
struct Cli {
    /// Schema document
    input: PathBuf,

    /// Output file (stdout for dot when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value = "dot")]
    format: Format,

    /// List cyclic groups on stderr
    #[arg(long)]
    cycles: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let document = load_document(&cli.input)?;
    let plan = EmissionPlan::build(&document.value)
        .with_context(|| format!("failed to build graph for {}", cli.input.display()))?;
    let graph = plan.graph();

    eprintln!(
        "📊 {}: {} types, {} edges, {} cycles",
        cli.input.display(),
        graph.len(),
        graph.dependency_graph().edge_count(),
        plan.cycle_count()
    );

    if cli.cycles {
        for group in plan.analysis().cyclic_groups() {
            let members: Vec<&str> = group.members.iter().map(|id| graph.node(*id).name.as_str()).collect();
            eprintln!("  🔁 {} (anchor {})", members.join(", "), graph.node(group.anchor).name);
        }
    }

    let dot = graph.to_dot();

    match (cli.format, cli.output) {
        (Format::Dot, None) => print!("{}", dot),
        (Format::Dot, Some(path)) => {
            std::fs::write(&path, &dot).with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("✅ {}", path.display());
        }
        (Format::Svg, output) => {
            let path = output.unwrap_or_else(|| PathBuf::from("types.svg"));
            render_svg(&dot, &path)?;
            eprintln!("✅ {}", path.display());
        }
    }

    Ok(())
}

/// Pipe DOT through graphviz
fn render_svg(dot: &str, path: &Path) -> anyhow::Result<()> {
    let source = path.with_extension("dot");
    std::fs::write(&source, dot)?;

    let result = std::process::Command::new("dot")
        .arg("-Tsvg")
        .arg(&source)
        .arg("-o")
        .arg(path)
        .output()
        .context("failed to run graphviz `dot`");
    let _ = std::fs::remove_file(&source);

    let output = result?;
    if !output.status.success() {
        bail!("graphviz failed: {}", String::from_utf8_lossy(&output.stderr).trim());
    }
    Ok(())
}
