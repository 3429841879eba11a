//! Runtime configuration, built from the validated file configuration.

use signet_core::PipelineConfig;
use signet_core::notifier::Topology;
use std::net::SocketAddr;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub server: ServerConfig,
    pub database: PoolConfig,
    pub topology: Topology,
    pub identity: IdentityConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

/// How handlers resolve the caller.
#[derive(Debug, Clone, Copy)]
pub struct IdentityConfig {
    pub default_user_id: Uuid,
    pub allow_anonymous: bool,
}
