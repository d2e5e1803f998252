//! Listing Orchestrator Backend
//!
//! A REST API and SSE server for preparing storewide sales: specialists
//! analyze the catalog, the merged plan is reviewed, and an approved plan
//! is applied to the listings.

use listing_orchestrator::api;
use listing_orchestrator::config::Config;
use listing_orchestrator::orchestrator::constants::DEFAULT_ACTOR;
use listing_orchestrator::state::AppState;
use listing_orchestrator::store::{
    demo_items, seed, InMemoryItemStore, ItemStore, SqliteItemStore, StoreContext,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Open the configured item store and seed it if requested
async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn ItemStore>> {
    let store: Arc<dyn ItemStore> = match &config.storage.database_url {
        Some(url) => {
            info!(database_url = %url, "Using SQLite item store");
            Arc::new(SqliteItemStore::connect(url).await?)
        }
        None => {
            info!("Using in-memory item store");
            Arc::new(InMemoryItemStore::new())
        }
    };

    if config.storage.seed_demo_items {
        let ctx = StoreContext::new(DEFAULT_ACTOR);
        if store.list(&ctx).await?.is_empty() {
            let count = seed(store.as_ref(), &ctx, demo_items()).await?;
            info!("Seeded {} demo items", count);
        }
    }

    Ok(store)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load configuration
    let config = Config::from_env();
    info!("Configuration loaded: {:?}", config);

    let store = build_store(&config).await?;
    if config.generation.api_key.is_none() {
        warn!("GEMINI_API_KEY not set, announcements will use template copy");
    }

    // Initialize application state
    let app_state = Arc::new(RwLock::new(AppState::with_api_key(
        store,
        config.orchestrator_config(),
        config.generation.api_key.clone(),
    )));

    let app = api::router(app_state);

    // Bind to address from config
    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid server address: {}", e))?;

    info!("🚀 Server running on http://{}", addr);
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    // Setup graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Handle graceful shutdown signals (Ctrl+C, SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}
