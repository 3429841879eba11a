//! Error taxonomy of the ingestion pipeline.
//!
//! `InvalidRequest` and `Storage` are authoritative outcomes for the caller.
//! `PublishError` never leaves the pipeline: a failed notification is
//! logged and the ingestion still succeeds.

use thiserror::Error;
use uuid::Uuid;

/// Errors returned to callers of the pipeline.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Malformed or missing submission fields.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No event with this id exists.
    #[error("event not found: {0}")]
    NotFound(Uuid),

    /// The store was unreachable or rejected the write.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// Payload could not be encoded.
    #[error("internal error: {0}")]
    Internal(String),

    /// No admission permit became available in time.
    #[error("too many ingestions in flight")]
    Overloaded,
}

/// Errors produced by [`EventStore`](crate::store::EventStore) implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Constraint violation: duplicate id, unknown user, bad source type.
    #[error("write rejected: {0}")]
    Rejected(String),

    /// A stored row no longer matches its checksum or cannot be decoded.
    #[error("stored event {event_id} is corrupted: {reason}")]
    Corrupted { event_id: Uuid, reason: String },

    #[error("event store is closed")]
    Closed,

    #[error("event store unavailable: {0}")]
    Unavailable(String),
}

/// Errors produced by [`Notifier`](crate::notifier::Notifier) implementations.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("broker error: {0}")]
    Amqp(#[from] lapin::Error),

    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    /// The broker negatively acknowledged the message.
    #[error("broker rejected message")]
    Rejected,

    #[error("notifier is closed")]
    Closed,

    #[error("notifier unavailable: {0}")]
    Unavailable(String),
}
