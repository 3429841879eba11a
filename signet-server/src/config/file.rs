//! TOML file configuration structures.
//!
//! These structs directly map to the `signet-config.toml` file format.
//! Every field has a default, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use signet_core::notifier::{DEFAULT_EXCHANGE, DEFAULT_QUEUE, DEFAULT_ROUTING_KEY};
use std::net::{Ipv4Addr, SocketAddr};
use uuid::Uuid;

/// Placeholder identity used when a request carries no `X-User-Id`.
pub const DEFAULT_USER_ID: Uuid = Uuid::from_u128(0xa0eebc99_9c0b_4ef8_bb6d_6bb9bd380a11);

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080))
}

/// Connection pool settings. The URL itself comes from `DATABASE_URL`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 0,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

/// Broker topology. The URL itself comes from `AMQP_URL`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub exchange: String,
    pub queue: String,
    pub routing_key: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            exchange: DEFAULT_EXCHANGE.to_string(),
            queue: DEFAULT_QUEUE.to_string(),
            routing_key: DEFAULT_ROUTING_KEY.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyPolicyKind {
    BestEffort,
    Redeliver,
}

/// Ingestion pipeline section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Identity assigned to requests without an `X-User-Id` header.
    pub default_user_id: Uuid,
    /// Reject requests without an `X-User-Id` header when false.
    pub allow_anonymous: bool,
    pub max_in_flight: usize,
    pub admission_timeout_ms: u64,
    pub notify_policy: NotifyPolicyKind,
    /// Only used with `notify_policy = "redeliver"`.
    pub redelivery_max_attempts: u32,
    /// Only used with `notify_policy = "redeliver"`.
    pub redelivery_base_delay_ms: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            default_user_id: DEFAULT_USER_ID,
            allow_anonymous: true,
            max_in_flight: 64,
            admission_timeout_ms: 5_000,
            notify_policy: NotifyPolicyKind::BestEffort,
            redelivery_max_attempts: 5,
            redelivery_base_delay_ms: 500,
        }
    }
}
