//! Application state shared across all request handlers.

use crate::config::runtime::IdentityConfig;
use signet_core::IngestPipeline;
use signet_core::notifier::Notifier;
use signet_core::store::EventStore;
use std::sync::Arc;

pub type Pipeline = IngestPipeline<dyn EventStore, dyn Notifier>;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub identity: IdentityConfig,
}

impl AppState {
    pub fn new(pipeline: Arc<Pipeline>, identity: IdentityConfig) -> Self {
        Self { pipeline, identity }
    }
}
