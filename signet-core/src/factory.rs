//! Event factory: identity, canonical payload, checksum and timestamp.
//!
//! Pure and synchronous; the only failure is a payload that cannot be
//! encoded.

use crate::entities::IngestionEvent;
use crate::error::IngestError;
use crate::intake::ValidatedSubmission;
use signet_sdk::canonical;
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

/// Source of `created_at` timestamps.
pub type Clock = Arc<dyn Fn() -> OffsetDateTime + Send + Sync>;

#[derive(Clone)]
pub struct EventFactory {
    clock: Clock,
}

impl Default for EventFactory {
    fn default() -> Self {
        Self {
            clock: Arc::new(OffsetDateTime::now_utc),
        }
    }
}

impl EventFactory {
    pub fn with_clock(clock: Clock) -> Self {
        Self { clock }
    }

    pub fn build(
        &self,
        submission: &ValidatedSubmission,
        user_id: Uuid,
    ) -> Result<IngestionEvent, IngestError> {
        let raw_payload = canonical::encode_canonical(&submission.payload)
            .map_err(|e| IngestError::Internal(format!("failed to encode payload: {e}")))?;
        let checksum = canonical::checksum(&raw_payload);

        Ok(IngestionEvent {
            event_id: Uuid::new_v4(),
            user_id,
            source_type: submission.source_type,
            raw_payload,
            checksum,
            created_at: truncate_to_micros((self.clock)()),
        })
    }
}

/// Postgres keeps microseconds; truncating here makes the acknowledged
/// timestamp identical to the one read back.
fn truncate_to_micros(at: OffsetDateTime) -> OffsetDateTime {
    let at = at.to_offset(time::UtcOffset::UTC);
    at.replace_nanosecond(at.nanosecond() / 1_000 * 1_000)
        .unwrap_or(at)
}
