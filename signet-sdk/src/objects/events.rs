//! Read-back types for `GET /events` and `GET /events/{id}`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::source_type::SourceType;
use crate::canonical::{self, Payload};

/// A stored ingestion event as returned by the query endpoints.
///
/// `raw_payload` is the decoded structured payload; `checksum` is the
/// SHA-256 of its canonical encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventResponse {
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub source_type: SourceType,
    pub raw_payload: Payload,
    pub checksum: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: time::OffsetDateTime,
}

impl EventResponse {
    /// Re-encode the payload and compare against the advertised checksum.
    pub fn verify_checksum(&self) -> bool {
        canonical::encode_canonical(&self.raw_payload)
            .map(|bytes| canonical::verify_checksum(&bytes, &self.checksum))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListEventsResponse {
    pub events: Vec<EventResponse>,
    pub count: usize,
}
