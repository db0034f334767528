use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use catalog_clusters::config::{AdapterKind, Manifest, MergePolicy};
use catalog_clusters::logging::CATALOG_CLUSTER;
use catalog_clusters::run_manifest;

#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about,
    long_about = "Cut converted catalogues into entries and cluster them by visual similarity.",
    arg_required_else_help = true
)]
pub struct Args {
    /// Path to the corpus manifest (JSON)
    pub manifest: PathBuf,

    /// Optional output file path. If omitted, writes to stdout.
    #[clap(short, long)]
    pub output: Option<PathBuf>,

    /// Pretty print the cluster map.
    #[clap(short, long)]
    pub pretty: bool,

    /// Override the document adapter named in the manifest
    #[clap(long)]
    pub adapter: Option<AdapterKind>,

    /// Override the merge policy (`last-match-wins` or `merge`)
    #[clap(long)]
    pub merge_policy: Option<MergePolicy>,

    /// Log every pipeline decision, not just the summary
    #[clap(short, long)]
    pub verbose: bool,

    /// Directory for a persistent run log
    #[clap(long)]
    pub log_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let _guard = match args.log_dir {
        Some(ref dir) => Some(
            catalog_clusters::logging::init_logging_with_dir(args.verbose, dir.clone())
                .with_context(|| format!("creating log directory {}", dir.display()))?,
        ),
        None => {
            catalog_clusters::logging::init_logging(args.verbose);
            None
        }
    };

    let mut manifest = Manifest::load(&args.manifest)
        .with_context(|| format!("loading manifest {}", args.manifest.display()))?;
    if let Some(kind) = args.adapter {
        manifest.adapter.kind = kind;
    }
    if let Some(policy) = args.merge_policy {
        manifest.merge_policy = policy;
    }

    let (clusters, _summary) = run_manifest(&manifest)?;
    let json = clusters.to_json(args.pretty)?;

    match args.output {
        Some(path) => {
            fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
            info!(target: CATALOG_CLUSTER, "Cluster map written to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
