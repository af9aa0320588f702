#![deny(
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used
)]
#![allow(clippy::print_stdout)]

use std::sync::Arc;

use clap::{Parser, Subcommand};
use legisync_api::{
    clock::SystemClock,
    config::Config,
    sources::{BioguideAdapter, DatasetCache, GovtrackAdapter, HttpTransport, UnitedstatesAdapter},
    store::MemoryStore,
    sync::{SourceAdapters, SyncOrchestrator},
};

#[derive(Parser)]
#[command(name = "legisync", about = "Reconcile Congress member data across upstream sources")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one sync cycle for the given bioguide ids and print the projections.
    Sync {
        /// Bioguide ids, e.g. S000622
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load and validate configuration first (fail-fast)
    let config = Config::load().map_err(|e| anyhow::anyhow!("{e}"))?;

    std::env::set_var("RUST_LOG", &config.logging.level);
    tracing_subscriber::fmt::init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "legisync starting up"
    );

    let cli = Cli::parse();

    let transport: Arc<HttpTransport> = Arc::new(HttpTransport::new());
    let clock = Arc::new(SystemClock);
    let cache = Arc::new(DatasetCache::new(config.sync.dataset_cache_ttl_hours));

    let adapters = SourceAdapters {
        bioguide: BioguideAdapter::new(&config.sources.bioguide_base_url, transport.clone()),
        govtrack: GovtrackAdapter::new(&config.sources.govtrack_base_url, transport.clone()),
        unitedstates: UnitedstatesAdapter::new(
            &config.sources.legislators_dataset_url,
            transport.clone(),
            cache,
            clock.clone(),
        ),
    };

    let orchestrator = SyncOrchestrator::new(
        adapters,
        transport,
        Arc::new(MemoryStore::new()),
        clock,
        &config.sources.member_photo_base_url,
        config.sync.max_fail_count,
    );

    match cli.command {
        Command::Sync { ids } => {
            let aggregates = orchestrator.sync_members(&ids).await?;
            for aggregate in aggregates {
                let rendered = serde_json::to_string_pretty(&aggregate.projection)?;
                println!("{rendered}");
                if !aggregate.override_conflicts.is_empty() {
                    tracing::warn!(
                        id = aggregate.id.as_str(),
                        conflicts = aggregate.override_conflicts.len(),
                        "user overrides disagree with synced data"
                    );
                }
            }
        }
    }

    Ok(())
}
