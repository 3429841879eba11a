//! Configuration module for signet-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables.

pub mod file;
pub mod runtime;

use crate::config::file::{FileConfig, NotifyPolicyKind};
use crate::config::runtime::{IdentityConfig, PoolConfig, RuntimeConfig, ServerConfig};
use signet_core::notifier::Topology;
use signet_core::{NotifyPolicy, PipelineConfig};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,

    #[error("AMQP_URL environment variable not set")]
    MissingAmqpUrl,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Read the TOML file, apply CLI overrides, validate, and build the
    /// runtime configuration.
    pub fn load(&self) -> Result<RuntimeConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let file_config: FileConfig = toml::from_str(&config_content)?;
        self.finish(file_config)
    }

    fn finish(&self, mut file_config: FileConfig) -> Result<RuntimeConfig, ConfigError> {
        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }
        validate(&file_config)?;
        Ok(build_runtime_config(file_config))
    }
}

fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    let database = &config.database;
    if database.max_connections == 0 {
        return Err(ConfigError::ValidationError(
            "database.max_connections must be at least 1".to_string(),
        ));
    }
    if database.min_connections > database.max_connections {
        return Err(ConfigError::ValidationError(format!(
            "database.min_connections ({}) exceeds max_connections ({})",
            database.min_connections, database.max_connections
        )));
    }

    let broker = &config.broker;
    for (name, value) in [
        ("exchange", &broker.exchange),
        ("queue", &broker.queue),
        ("routing_key", &broker.routing_key),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "broker.{name} must not be empty"
            )));
        }
    }

    let ingest = &config.ingest;
    if ingest.max_in_flight == 0 {
        return Err(ConfigError::ValidationError(
            "ingest.max_in_flight must be at least 1".to_string(),
        ));
    }
    if ingest.notify_policy == NotifyPolicyKind::Redeliver && ingest.redelivery_max_attempts == 0
    {
        return Err(ConfigError::ValidationError(
            "ingest.redelivery_max_attempts must be at least 1 with the redeliver policy"
                .to_string(),
        ));
    }
    Ok(())
}

fn build_runtime_config(file_config: FileConfig) -> RuntimeConfig {
    let FileConfig {
        server,
        database,
        broker,
        ingest,
    } = file_config;

    let notify_policy = match ingest.notify_policy {
        NotifyPolicyKind::BestEffort => NotifyPolicy::BestEffort,
        NotifyPolicyKind::Redeliver => NotifyPolicy::Redeliver {
            max_attempts: ingest.redelivery_max_attempts,
            base_delay: Duration::from_millis(ingest.redelivery_base_delay_ms),
        },
    };

    RuntimeConfig {
        server: ServerConfig {
            listen: server.listen,
        },
        database: PoolConfig {
            max_connections: database.max_connections,
            min_connections: database.min_connections,
            acquire_timeout: Duration::from_secs(database.acquire_timeout_secs),
            idle_timeout: Duration::from_secs(database.idle_timeout_secs),
            max_lifetime: Duration::from_secs(database.max_lifetime_secs),
        },
        topology: Topology {
            exchange: broker.exchange,
            queue: broker.queue,
            routing_key: broker.routing_key,
        },
        identity: IdentityConfig {
            default_user_id: ingest.default_user_id,
            allow_anonymous: ingest.allow_anonymous,
        },
        pipeline: PipelineConfig {
            notify_policy,
            max_in_flight: ingest.max_in_flight,
            admission_timeout: Duration::from_millis(ingest.admission_timeout_ms),
        },
    }
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}

/// Get the broker URL from the environment.
pub fn get_amqp_url() -> Result<String, ConfigError> {
    std::env::var("AMQP_URL").map_err(|_| ConfigError::MissingAmqpUrl)
}
