//! `POST /ingest` request and response types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::source_type::SourceType;
use crate::canonical::Payload;

/// Request body for submitting an identity signal.
///
/// The server accepts any JSON body and validates it itself, so a malformed
/// request yields a structured `invalid_request` error instead of a
/// deserialization failure. This type is what well-behaved clients send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestRequest {
    pub source_type: SourceType,
    pub payload: Payload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestStatus {
    Accepted,
}

/// Response returned once the event is durably stored.
///
/// A successful response guarantees storage, never downstream notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestResponse {
    pub event_id: Uuid,
    pub status: IngestStatus,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: time::OffsetDateTime,
}
