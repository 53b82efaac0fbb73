//! headroom — estimate how many more instances of a workload a cluster
//! can accommodate.
//!
//! Loads a cluster snapshot and a workload template, then seeds copies of
//! the template through the placement engine against an in-memory copy of
//! the cluster until the workload no longer fits or a limit is reached.
//!
//! # Usage
//!
//! ```text
//! headroom --snapshot cluster.json --workload web.json --max-instances 50
//! ```

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing::debug;

use headroom_sim::{CapacityReport, Simulation, SimulationConfig};
use headroom_snapshot::{DiskCache, FileSource, sync};
use headroom_state::{ClusterStore, WorkloadTemplate};

#[derive(Parser)]
#[command(
    name = "headroom",
    about = "Cluster capacity estimator",
    version,
)]
struct Cli {
    /// Cluster snapshot file (JSON: nodes and running instances).
    #[arg(long)]
    snapshot: PathBuf,

    /// Workload template file (JSON).
    #[arg(long)]
    workload: PathBuf,

    /// Stop after this many placements (0 = run until the workload no
    /// longer fits).
    #[arg(long, default_value = "0")]
    max_instances: usize,

    /// Directory for the snapshot cache.
    #[arg(long, default_value = ".headroom-cache")]
    cache_dir: PathBuf,

    /// Refetch the snapshot even if a cached copy exists.
    #[arg(long)]
    refresh: bool,

    /// Report output format.
    #[arg(long, value_enum, default_value_t = Output::Text)]
    output: Output,
}

#[derive(Clone, Copy, ValueEnum)]
enum Output {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,headroom=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let template: WorkloadTemplate = {
        let bytes = std::fs::read(&cli.workload)?;
        serde_json::from_slice(&bytes)?
    };

    let store = ClusterStore::new()?;
    let source = FileSource::new(&cli.snapshot);
    let cache = DiskCache::new(&cli.cache_dir)?;
    sync(&store, &source, &cache, cli.refresh)?;

    let config = SimulationConfig::new(template.clone(), cli.max_instances);
    let limit = config.limit;
    let sim = Simulation::new(store, config);

    // Ctrl-C aborts the run; the report still covers what was placed.
    let handle = sim.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("interrupt received, closing simulation");
            handle.close();
        }
    });

    let status = sim.run().await?;
    let report = CapacityReport::build(&template, limit, &status);

    match cli.output {
        Output::Text => print!("{report}"),
        Output::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}
