//! VibeTree developer CLI
//!
//! Drives the core from JSON documents on disk: extraction, flattening,
//! diffing and replaying a chain of edits through an in-memory snapshot store.
//!
//! # Usage
//!
//! ```bash
//! vibetree extract song.json [--request]
//! vibetree flatten song.json
//! vibetree diff before.json after.json
//! vibetree replay v1.json v2.json v3.json
//! ```
//!
//! Results are printed to stdout as pretty JSON; logs go to stderr. Use
//! `RUST_LOG` or `--verbose` to adjust log levels.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use vibetree_core::diff::{build_tree_diff, diff_documents, flatten, NodeDescriptor};
use vibetree_core::extraction::{ExtractionConfig, ParameterExtractor};
use vibetree_core::models::{Document, SnapshotDescriptor, SnapshotRef};
use vibetree_core::services::{CreateSnapshotRequest, SnapshotService, SnapshotServiceConfig};
use vibetree_core::store::InMemorySnapshotStore;

#[derive(Parser)]
#[command(name = "vibetree")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inspect, diff and replay vibe tree documents")]
struct Cli {
    /// Extraction configuration (JSON); missing fields take defaults
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive generation parameters from a tree
    Extract {
        #[arg(value_name = "TREE")]
        tree: PathBuf,

        /// Print the generation request object instead
        #[arg(long)]
        request: bool,
    },

    /// Print the path-addressed flattening of a tree
    Flatten {
        #[arg(value_name = "TREE")]
        tree: PathBuf,
    },

    /// Diff two trees
    Diff {
        #[arg(value_name = "ORIGINAL")]
        original: PathBuf,

        #[arg(value_name = "MODIFIED")]
        modified: PathBuf,
    },

    /// Replay trees as a chain of edits starting from the empty tree
    Replay {
        #[arg(value_name = "TREE", required = true)]
        trees: Vec<PathBuf>,
    },
}

#[derive(Serialize)]
struct FlatEntry<'a> {
    path: &'a str,
    #[serde(flatten)]
    descriptor: &'a NodeDescriptor<'a>,
}

#[derive(Serialize)]
struct ReplayStep {
    file: String,
    snapshot: SnapshotDescriptor,
    summary: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Extract { tree, request } => {
            let document = load_document(&tree)?;
            let params = ParameterExtractor::new(config.clone()).extract(&document);
            if request {
                print_json(&params.to_request_params(&config.request))
            } else {
                print_json(&params)
            }
        }
        Commands::Flatten { tree } => {
            let document = load_document(&tree)?;
            let flat = flatten(&document);
            let entries: Vec<FlatEntry<'_>> = flat
                .iter()
                .map(|(path, descriptor)| FlatEntry { path, descriptor })
                .collect();
            print_json(&entries)
        }
        Commands::Diff { original, modified } => {
            let before = load_document(&original)?;
            let after = load_document(&modified)?;
            let diff = build_tree_diff(
                display_name(&original),
                display_name(&modified),
                diff_documents(&before, &after),
            );
            print_json(&diff)
        }
        Commands::Replay { trees } => replay(&trees, config),
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ExtractionConfig> {
    let Some(path) = path else {
        return Ok(ExtractionConfig::default());
    };

    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: ExtractionConfig = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid config {}: {}", path.display(), e))?;

    tracing::debug!("Loaded extraction config from {}", path.display());
    Ok(config)
}

fn load_document(path: &Path) -> Result<Document> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read tree {}", path.display()))?;
    Document::from_json(&text).with_context(|| format!("Invalid tree {}", path.display()))
}

fn replay(trees: &[PathBuf], extraction: ExtractionConfig) -> Result<()> {
    let config = SnapshotServiceConfig {
        extraction,
        ..Default::default()
    };
    let service = SnapshotService::with_config(Arc::new(InMemorySnapshotStore::new()), config)?;

    let mut reference = SnapshotRef::Initial;
    let mut steps = Vec::with_capacity(trees.len());

    for path in trees {
        let document = load_document(path)?;
        let outcome = service
            .submit_edit(&reference, CreateSnapshotRequest::new(document))
            .with_context(|| format!("Failed to replay {}", path.display()))?;

        tracing::info!("{}: {}", display_name(path), outcome.diff.summary);
        reference = SnapshotRef::parse(&outcome.snapshot.id);
        steps.push(ReplayStep {
            file: display_name(path),
            snapshot: outcome.snapshot,
            summary: outcome.diff.summary,
        });
    }

    print_json(&steps)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", text);
    Ok(())
}
