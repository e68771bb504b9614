//! Careline Server
//!
//! A headless matching and settlement core for bounded-time connection
//! requests between requesters and responders.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::{ConfigLoader, get_database_url};
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use careline_core::availability::{PgAvailabilityProbe, PresenceWriter};
use careline_core::config::ConfigStore;
use careline_core::coordinator::MatchingCoordinator;
use careline_core::entities::connection_request::ListPendingRequests;
use careline_core::events::{expiry_fired_channel, session_event_channel};
use careline_core::framework::DatabaseProcessor;
use careline_core::ledger::PgLedgerStore;
use careline_core::notifier::{LiveChannelNotifier, Notifier, PushGatewayNotifier};
use careline_core::processors::{EventDispatcher, ExpiryWatcher};
use careline_core::registry::PgRequestStore;
use careline_core::scheduler::ExpiryScheduler;
use careline_core::settlement::SettlementEngine;
use kanau::processor::Processor;

/// Careline - Headless connection matching and wallet settlement server
#[derive(Parser, Debug)]
#[command(name = "careline-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./careline-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Run database migrations on startup
    #[arg(long, default_value = "false")]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let args = Args::parse();

    tracing::info!("Starting careline-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    let listen_addr = loaded_config.server.listen;
    tracing::info!("Configuration loaded from {:?}", args.config);

    let matching_config = ConfigStore::new(loaded_config.matching.clone());
    let settlement_config = ConfigStore::new(loaded_config.settlement.clone());
    let push_gateway = loaded_config.push_gateway.clone();

    // Convert to shared config with separate locks for each section
    let shared_config = loaded_config.into_shared();

    // Get database URL from environment
    let database_url = get_database_url().map_err(|e| {
        tracing::error!("DATABASE_URL environment variable not set");
        e
    })?;

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;
    tracing::info!("Database connection established");

    // Run migrations if requested
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

    // Event channels and the expiry scheduler
    let (expiry_tx, expiry_rx) = expiry_fired_channel();
    let (event_tx, event_rx) = session_event_channel();
    let scheduler = ExpiryScheduler::new(expiry_tx);

    // Matching core
    let coordinator = Arc::new(MatchingCoordinator::new(
        Arc::new(PgRequestStore::new(db_pool.clone())),
        Arc::new(PgAvailabilityProbe::new(db_pool.clone())),
        scheduler,
        event_tx,
        matching_config.clone(),
    ));

    // Settlement core
    let settlement = Arc::new(SettlementEngine::new(
        Arc::new(PgLedgerStore::new(db_pool.clone())),
        settlement_config.clone(),
    ));

    // Notifiers: live websocket channels, plus the push gateway when
    // configured
    let live = Arc::new(LiveChannelNotifier::new());
    let mut notifiers: Vec<Arc<dyn Notifier>> = vec![Arc::clone(&live) as Arc<dyn Notifier>];
    if let Some(endpoint) = push_gateway {
        tracing::info!(%endpoint, "Push gateway enabled");
        notifiers.push(Arc::new(PushGatewayNotifier::new(endpoint)));
    }

    // Background processors
    let (processor_shutdown_tx, processor_shutdown_rx) = tokio::sync::watch::channel(false);
    let expiry_watcher = ExpiryWatcher::new(
        Arc::clone(&coordinator),
        expiry_rx,
        processor_shutdown_rx.clone(),
    );
    let event_dispatcher = EventDispatcher::new(notifiers, event_rx, processor_shutdown_rx);
    let expiry_watcher_handle = tokio::spawn(expiry_watcher.run());
    let event_dispatcher_handle = tokio::spawn(event_dispatcher.run());

    // Re-arm expiry timers for requests that were pending when the
    // previous process stopped.
    let processor = DatabaseProcessor {
        pool: db_pool.clone(),
    };
    let pending = processor.process(ListPendingRequests).await.map_err(|e| {
        tracing::error!("Failed to list pending requests: {}", e);
        e
    })?;
    for request in &pending {
        coordinator.resume(request).await;
    }
    if !pending.is_empty() {
        tracing::info!(count = pending.len(), "Re-armed pending request timers");
    }

    // Create application state
    let state = AppState {
        db: db_pool.clone(),
        config: shared_config,
        coordinator,
        settlement,
        live,
        presence: Arc::new(PresenceWriter::new(db_pool.clone())),
        matching_config,
        settlement_config,
    };

    // Spawn config reload handler (listens for SIGHUP)
    let shutdown_notify = spawn_config_reload_handler(state.clone(), config_loader);

    // Build the router
    let router = build_router(state);

    // Run the server
    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    // Stop the background processors
    let _ = processor_shutdown_tx.send(true);
    let _ = expiry_watcher_handle.await;
    let _ = event_dispatcher_handle.await;

    // Signal the config reload handler to stop
    shutdown_notify.notify_one();

    // Close database connections gracefully
    tracing::info!("Closing database connections...");
    db_pool.close().await;
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
