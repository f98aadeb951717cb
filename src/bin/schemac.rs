//! Schema Compiler CLI
//!
//! Compiles JSON Schema documents (JSON or YAML) into TypeScript, Zod and Go artifacts.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use schema_compiler::loader::{load_documents, LoadConfig, SchemaDocument};
use schema_compiler::writer::{check_artifacts, document_dirs, write_artifacts, ArtifactStatus};
use schema_compiler::{compile, CompileOutput, CompilerConfig, EmitterRegistry};

#[derive(Parser)]
#[command(name = "schemac")]
#[command(about = "Compile JSON Schema into TypeScript, Zod and Go")]
struct Cli {
    /// Config file layered over schemac.toml and the environment
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log pipeline phases
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile and write artifacts
    Build {
        /// Schema file or directory of schema files
        input: PathBuf,

        /// Output directory (defaults to [output].dir)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Targets to build (defaults to [output].targets)
        #[arg(short, long = "target")]
        targets: Vec<String>,
    },

    /// Compile and compare against the artifacts on disk
    Check {
        input: PathBuf,

        #[arg(short, long)]
        out: Option<PathBuf>,

        #[arg(short, long = "target")]
        targets: Vec<String>,

        /// Print the unified diff of stale files
        #[arg(long)]
        diff: bool,
    },

    /// List available targets
    Targets,

    /// Configuration helpers
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write the default configuration
    Init {
        #[arg(default_value = "schemac.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    if let Err(e) = run(cli) {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = CompilerConfig::load_from(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Commands::Build { input, out, targets } => {
            let compiled = compile_all(&config, &input, &targets)?;
            let out_dir = out.unwrap_or_else(|| config.output_dir());

            for (document, output, dir) in placed(&compiled, &input, &out_dir)? {
                let written = write_artifacts(&dir, &output.artifacts)
                    .with_context(|| format!("failed to write artifacts for {}", document.path.display()))?;
                for path in written {
                    println!("✅ {}", path.display());
                }
            }
        }

        Commands::Check { input, out, targets, diff } => {
            let compiled = compile_all(&config, &input, &targets)?;
            let out_dir = out.unwrap_or_else(|| config.output_dir());
            let mut stale = 0;

            for (_, output, dir) in placed(&compiled, &input, &out_dir)? {
                for check in check_artifacts(&dir, &output.artifacts)? {
                    match &check.status {
                        ArtifactStatus::Fresh => println!("✅ {}", check.path.display()),
                        ArtifactStatus::Missing => {
                            stale += 1;
                            println!("❌ {} (missing)", check.path.display());
                        }
                        ArtifactStatus::Stale { diff: unified, added, removed } => {
                            stale += 1;
                            println!("❌ {} (+{} -{})", check.path.display(), added, removed);
                            if diff {
                                print!("{}", unified);
                            }
                        }
                    }
                }
            }

            if stale > 0 {
                bail!("{} artifact(s) out of date; run `schemac build`", stale);
            }
        }

        Commands::Targets => {
            let registry = EmitterRegistry::with_builtin(&config);
            for emitter in registry.emitters() {
                println!(
                    "{:<12} {:<11} {:<10} {}",
                    emitter.name(),
                    emitter.language(),
                    format!("{:?}", emitter.style()).to_lowercase(),
                    emitter.filename()
                );
            }
        }

        Commands::Config { command } => match command {
            ConfigCommands::Init { path, force } => {
                if path.exists() && !force {
                    bail!("{} already exists (use --force to overwrite)", path.display());
                }
                CompilerConfig::default()
                    .save(&path)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("✅ Wrote {}", path.display());
            }
            ConfigCommands::Show => {
                print!("{}", toml::to_string_pretty(&config)?);
            }
        },
    }

    Ok(())
}

/// Compile every document before anything is written
fn compile_all(
    config: &CompilerConfig,
    input: &Path,
    targets: &[String],
) -> anyhow::Result<Vec<(SchemaDocument, CompileOutput)>> {
    let registry = EmitterRegistry::with_builtin(config);
    let targets = if targets.is_empty() {
        config.output.targets.clone()
    } else {
        targets.to_vec()
    };

    let documents = load_documents(input, &LoadConfig::default())
        .with_context(|| format!("failed to load {}", input.display()))?;
    if documents.is_empty() {
        bail!("no schema documents found under {}", input.display());
    }

    let mut compiled = Vec::with_capacity(documents.len());
    let mut warnings = 0;

    for document in documents {
        let output = compile(&document.value, &registry, &targets)
            .with_context(|| format!("failed to compile {}", document.path.display()))?;

        for item in &output.diagnostics {
            eprintln!("⚠️  {}: {}", document.path.display(), item);
        }
        warnings += output.diagnostics.warning_count();

        println!(
            "📦 {}: {} types, {} artifact(s)",
            document.path.display(),
            output.type_count,
            output.artifacts.len()
        );
        compiled.push((document, output));
    }

    if config.diagnostics.deny_warnings && warnings > 0 {
        bail!("{} warning(s) with diagnostics.deny_warnings set; nothing written", warnings);
    }

    Ok(compiled)
}

/// Pair every compiled document with its output directory
fn placed<'a>(
    compiled: &'a [(SchemaDocument, CompileOutput)],
    input: &Path,
    out_dir: &Path,
) -> anyhow::Result<Vec<(&'a SchemaDocument, &'a CompileOutput, PathBuf)>> {
    let paths: Vec<&Path> = compiled.iter().map(|(document, _)| document.path.as_path()).collect();
    let dirs = document_dirs(out_dir, input, &paths)?;
    Ok(compiled
        .iter()
        .zip(dirs)
        .map(|((document, output), dir)| (document, output, dir))
        .collect())
}
