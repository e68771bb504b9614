//! Configuration module for careline-server.
//!
//! Handles loading configuration from TOML files, CLI arguments, and
//! environment variables. Also handles admin secret hashing.

pub mod file;
pub mod runtime;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use careline_core::config::{MatchingConfig, SettlementConfig};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::config::file::FileConfig;
use crate::config::runtime::{AdminConfig, ServerConfig, ServiceConfig, SharedConfig};

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("password hashing error: {0}")]
    HashError(String),

    #[error("invalid push gateway url: {0}")]
    InvalidPushUrl(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Loaded configuration result containing all parts.
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub service: ServiceConfig,
    pub matching: MatchingConfig,
    pub settlement: SettlementConfig,
    pub push_gateway: Option<url::Url>,
}

impl LoadedConfig {
    /// Convert into a SharedConfig with Arc<RwLock<T>> wrappers.
    pub fn into_shared(self) -> SharedConfig {
        SharedConfig {
            server: Arc::new(RwLock::new(self.server)),
            admin: Arc::new(RwLock::new(self.admin)),
            service: Arc::new(RwLock::new(self.service)),
        }
    }
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    /// 4. Hash the admin secret if it's plaintext (and rewrite the file)
    /// 5. Build the loaded configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        self.validate(&file_config)?;

        // Hash admin secret if needed and rewrite config
        let secret_hash = if file_config.is_admin_secret_hashed() {
            file_config.admin.secret.clone()
        } else {
            let hash = self.hash_secret(&file_config.admin.secret)?;
            file_config.admin.secret = hash.clone();
            self.rewrite_config(&file_config)?;
            tracing::info!("Admin secret hashed and config file updated");
            hash
        };

        self.build_loaded_config(file_config, secret_hash)
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn validate(&self, config: &FileConfig) -> Result<(), ConfigError> {
        if config.service.secret.is_empty() {
            return Err(ConfigError::ValidationError(
                "service secret must not be empty".to_string(),
            ));
        }
        if config.matching.response_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "matching.response_timeout_secs must be positive".to_string(),
            ));
        }
        let settlement = SettlementConfig {
            split_ratio: config.settlement.split_ratio,
            penalty_amount: config.settlement.penalty_amount,
        };
        settlement.validate().map_err(ConfigError::ValidationError)
    }

    fn hash_secret(&self, plaintext: &str) -> Result<String, ConfigError> {
        use argon2::{
            Argon2, PasswordHasher,
            password_hash::{SaltString, rand_core::OsRng},
        };

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ConfigError::HashError(e.to_string()))
    }

    fn rewrite_config(&self, config: &FileConfig) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(config)?;

        // Write atomically: write to temp file, then rename
        let temp_path = self.config_path.with_extension("toml.tmp");
        std::fs::write(&temp_path, toml_string)?;
        std::fs::rename(&temp_path, &self.config_path)?;

        Ok(())
    }

    fn build_loaded_config(
        &self,
        file_config: FileConfig,
        secret_hash: String,
    ) -> Result<LoadedConfig, ConfigError> {
        let push_gateway = file_config
            .push
            .gateway_url
            .as_deref()
            .map(|raw| url::Url::parse(raw).map_err(|_| ConfigError::InvalidPushUrl(raw.into())))
            .transpose()?;

        Ok(LoadedConfig {
            server: ServerConfig {
                listen: file_config.server.listen,
            },
            admin: AdminConfig::new(secret_hash),
            service: ServiceConfig::new(
                file_config.service.name,
                file_config.service.secret.into_bytes().into_boxed_slice(),
            ),
            matching: MatchingConfig {
                response_timeout: std::time::Duration::from_secs(
                    file_config.matching.response_timeout_secs,
                ),
            },
            settlement: SettlementConfig {
                split_ratio: file_config.settlement.split_ratio,
                penalty_amount: file_config.settlement.penalty_amount,
            },
            push_gateway,
        })
    }
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}
