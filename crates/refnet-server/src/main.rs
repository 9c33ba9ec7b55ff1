//! # refnet-server
//!
//! HTTP server for the referral network.
//!
//! This binary:
//! - reads its settings from the environment ([`ServerConfig::from_env`])
//! - opens the configured storage backend (in-memory or SQLite)
//! - optionally loads the demo network into an empty store
//! - serves the REST API until Ctrl+C

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use refnet_server::{serve, AppState, ServerConfig, StorageBackend};
use refnet_store::{seed, Database, MemoryStore, Repository};

fn open_store(config: &ServerConfig) -> anyhow::Result<Arc<dyn Repository>> {
    let repo: Arc<dyn Repository> = match config.storage {
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        StorageBackend::Sqlite => Arc::new(Database::open_at(&config.database_path)?),
    };
    Ok(repo)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,refnet_server=debug,refnet_store=info")
        }))
        .init();

    info!("Starting referral network server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Open storage
    // -----------------------------------------------------------------------
    let repo = open_store(&config)?;
    info!(
        instance = %config.instance_name,
        backend = repo.backend(),
        "Storage ready"
    );

    if config.seed_sample_data {
        seed::load_sample_data(repo.as_ref())?;
    }

    // -----------------------------------------------------------------------
    // 4. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    let http_addr = config.http_addr;
    let state = AppState::new(repo, config);

    tokio::select! {
        result = serve(state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
