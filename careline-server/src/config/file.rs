//! TOML file configuration structures.
//!
//! These structs directly map to the `careline-config.toml` file format.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub service: ServiceConfig,
    #[serde(default)]
    pub matching: MatchingSection,
    #[serde(default)]
    pub settlement: SettlementSection,
    #[serde(default)]
    pub push: PushSection,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// Admin configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// The admin secret. If this is plaintext (doesn't start with `$argon2`),
    /// it will be hashed and the config file will be rewritten.
    pub secret: String,
}

/// Trusted application backend that drives the service API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Human-readable backend name (for logs only).
    pub name: String,
    /// Shared HMAC secret for signing service API bodies.
    pub secret: String,
}

/// Matching parameters, reloadable via SIGHUP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingSection {
    /// Seconds a responder has to answer before the request is missed.
    #[serde(default = "default_response_timeout_secs")]
    pub response_timeout_secs: u64,
}

fn default_response_timeout_secs() -> u64 {
    30
}

impl Default for MatchingSection {
    fn default() -> Self {
        Self {
            response_timeout_secs: default_response_timeout_secs(),
        }
    }
}

/// Settlement parameters, reloadable via SIGHUP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementSection {
    /// Fraction of each charge credited to the responder.
    #[serde(default = "default_split_ratio")]
    pub split_ratio: Decimal,
    /// Flat penalty deduction (clamped to the wallet balance when applied).
    #[serde(default = "default_penalty_amount")]
    pub penalty_amount: Decimal,
}

fn default_split_ratio() -> Decimal {
    Decimal::new(5, 1)
}

fn default_penalty_amount() -> Decimal {
    Decimal::new(50, 0)
}

impl Default for SettlementSection {
    fn default() -> Self {
        Self {
            split_ratio: default_split_ratio(),
            penalty_amount: default_penalty_amount(),
        }
    }
}

/// Optional push-gateway side channel for actors without a live channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushSection {
    /// HTTP endpoint events are POSTed to. Absent disables push.
    #[serde(default)]
    pub gateway_url: Option<String>,
}

impl FileConfig {
    /// Check if the admin secret is already hashed (argon2 format).
    pub fn is_admin_secret_hashed(&self) -> bool {
        self.admin.secret.starts_with("$argon2")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config_parses() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:3000"

[admin]
secret = "test-secret"

[service]
name = "app-backend"
secret = "secret123"

[matching]
response_timeout_secs = 45

[settlement]
split_ratio = "0.6"
penalty_amount = "25"

[push]
gateway_url = "https://push.example.com/notify"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 3000);
        assert_eq!(config.service.name, "app-backend");
        assert_eq!(config.matching.response_timeout_secs, 45);
        assert_eq!(config.settlement.split_ratio, Decimal::new(6, 1));
        assert!(config.push.gateway_url.is_some());
        assert!(!config.is_admin_secret_hashed());
    }

    #[test]
    fn optional_sections_fall_back_to_defaults() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:3000"

[admin]
secret = "$argon2id$v=19$m=19456,t=2,p=1$abc123"

[service]
name = "app-backend"
secret = "secret123"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.matching.response_timeout_secs, 30);
        assert_eq!(config.settlement.split_ratio, Decimal::new(5, 1));
        assert_eq!(config.settlement.penalty_amount, Decimal::new(50, 0));
        assert!(config.push.gateway_url.is_none());
        assert!(config.is_admin_secret_hashed());
    }
}
