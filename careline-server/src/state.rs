//! Application state shared across all request handlers.

use std::sync::Arc;

use careline_core::availability::PresenceWriter;
use careline_core::config::{ConfigStore, MatchingConfig, SettlementConfig};
use careline_core::coordinator::MatchingCoordinator;
use careline_core::notifier::LiveChannelNotifier;
use careline_core::settlement::SettlementEngine;
use sqlx::PgPool;

use crate::config::runtime::SharedConfig;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: PgPool,
    /// Runtime configuration (can be reloaded via SIGHUP).
    pub config: SharedConfig,
    /// Matching state machine driving connection requests.
    pub coordinator: Arc<MatchingCoordinator>,
    /// Wallet settlement policy layer.
    pub settlement: Arc<SettlementEngine>,
    /// Live websocket channels for connected actors.
    pub live: Arc<LiveChannelNotifier>,
    /// Responder presence upserts, driven by the actor websocket.
    pub presence: Arc<PresenceWriter>,
    /// Reloadable matching parameters (response window).
    pub matching_config: ConfigStore<MatchingConfig>,
    /// Reloadable settlement parameters (split ratio, penalty).
    pub settlement_config: ConfigStore<SettlementConfig>,
}
