//! Message published to the downstream identity-events topic.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::source_type::SourceType;
use crate::canonical::Payload;

/// Content type of published notification bodies.
pub const CONTENT_TYPE: &str = "application/json";

/// Projection of a stored ingestion event sent to subscribers.
///
/// This is a notification, not a record: it may never arrive, and consumers
/// that need completeness must re-scan the event store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueMessage {
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub source_type: SourceType,
    pub payload: Payload,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: time::OffsetDateTime,
}
