//! Runtime configuration types and shared wrappers.
//!
//! The secret-bearing types are defined in `careline-sdk::config`; this
//! module re-exports them and adds the per-section lock wrapper the server
//! hands to request handlers.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;

pub use careline_sdk::config::{AdminConfig, ServiceConfig};

/// Server listen configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
}

/// Runtime configuration shared across all request handlers, one lock per
/// section so a SIGHUP reload swaps sections independently.
#[derive(Clone)]
pub struct SharedConfig {
    pub server: Arc<RwLock<ServerConfig>>,
    pub admin: Arc<RwLock<AdminConfig>>,
    pub service: Arc<RwLock<ServiceConfig>>,
}
