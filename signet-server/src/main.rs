//! Signet Server
//!
//! Accepts identity signals over HTTP, stores each one as an immutable,
//! checksummed event and notifies downstream subscribers over AMQP.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::runtime::PoolConfig;
use config::{ConfigLoader, get_amqp_url, get_database_url};
use server::{build_router, run_server};
use signet_core::notifier::{AmqpNotifier, Notifier};
use signet_core::processors::{RedeliveryWorker, redelivery_channel};
use signet_core::store::{EventStore, PgEventStore};
use signet_core::{IngestPipeline, NotifyPolicy};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Signet - identity signal ingestion service
#[derive(Parser, Debug)]
#[command(name = "signet-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./signet-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Run database migrations on startup
    #[arg(long, default_value = "false")]
    migrate: bool,

    /// Emit logs as JSON lines
    #[arg(long, default_value = "false")]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    tracing::info!("Starting signet-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = ConfigLoader::new(&args.config, args.listen)
        .load()
        .map_err(|e| {
            tracing::error!("Failed to load configuration: {}", e);
            e
        })?;
    tracing::info!("Configuration loaded from {:?}", args.config);

    let database_url = get_database_url().map_err(|e| {
        tracing::error!("DATABASE_URL environment variable not set");
        e
    })?;
    let amqp_url = get_amqp_url().map_err(|e| {
        tracing::error!("AMQP_URL environment variable not set");
        e
    })?;

    tracing::info!("Connecting to database...");
    let db_pool = connect_database(&database_url, &config.database)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;
    tracing::info!("Database connection established");

    if args.migrate {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&db_pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to run migrations: {}", e);
                e
            })?;
        tracing::info!("Migrations completed successfully");
    }

    tracing::info!("Connecting to message broker...");
    let notifier = match AmqpNotifier::connect(&amqp_url, config.topology.clone()).await {
        Ok(notifier) => notifier,
        Err(e) => {
            tracing::error!("Failed to connect to message broker: {}", e);
            db_pool.close().await;
            return Err(e.into());
        }
    };
    tracing::info!("Message broker connection established");

    let store: Arc<dyn EventStore> = Arc::new(PgEventStore::new(db_pool));
    let notifier: Arc<dyn Notifier> = Arc::new(notifier);

    let mut pipeline =
        IngestPipeline::new(store.clone(), notifier.clone(), config.pipeline.clone());

    // Spawn the redelivery processor when failed notifications are retried
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let redelivery_handle = match config.pipeline.notify_policy {
        NotifyPolicy::Redeliver {
            max_attempts,
            base_delay,
        } => {
            let (tx, rx) = redelivery_channel();
            pipeline = pipeline.with_redelivery(tx);
            let worker = RedeliveryWorker::new(
                notifier.clone(),
                rx,
                shutdown_rx,
                max_attempts,
                base_delay,
            );
            Some(tokio::spawn(worker.run()))
        }
        NotifyPolicy::BestEffort => None,
    };

    let state = AppState::new(Arc::new(pipeline), config.identity);
    let router = build_router(state);

    tracing::info!("Starting HTTP server on {}", config.server.listen);
    let result = run_server(router, config.server.listen).await;

    // Stop the redelivery processor before its notifier goes away
    if let Some(handle) = redelivery_handle {
        tracing::info!("Stopping redelivery processor...");
        let _ = shutdown_tx.send(true);
        if let Err(e) = handle.await {
            tracing::error!("Redelivery processor task failed: {}", e);
        }
    }

    tracing::info!("Closing broker connection...");
    notifier.close().await;

    tracing::info!("Closing database connections...");
    store.close().await;
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

async fn connect_database(url: &str, pool: &PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(pool.max_connections)
        .min_connections(pool.min_connections)
        .acquire_timeout(pool.acquire_timeout)
        .idle_timeout(pool.idle_timeout)
        .max_lifetime(pool.max_lifetime)
        .connect(url)
        .await
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=debug,lapin=warn"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
