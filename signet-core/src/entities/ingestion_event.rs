use super::SourceTypeName;
use crate::error::StoreError;
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use serde_json::Value;
use signet_sdk::canonical::{self, CanonicalError, Payload};
use signet_sdk::objects::{EventResponse, QueueMessage, SourceType};
use time::OffsetDateTime;
use uuid::Uuid;

/// One immutable ingested submission, the system of record.
///
/// `checksum` is always the hex SHA-256 of `raw_payload`; stores verify it
/// on every read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionEvent {
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub source_type: SourceType,
    /// Canonical encoding of the submitted payload.
    pub raw_payload: Vec<u8>,
    pub checksum: String,
    pub created_at: OffsetDateTime,
}

impl IngestionEvent {
    /// Check the checksum invariant.
    pub fn verify_integrity(&self) -> Result<(), StoreError> {
        if canonical::verify_checksum(&self.raw_payload, &self.checksum) {
            Ok(())
        } else {
            Err(StoreError::Corrupted {
                event_id: self.event_id,
                reason: "checksum does not match payload".to_string(),
            })
        }
    }

    /// Decode the canonical payload back into a structured value.
    pub fn payload(&self) -> Result<Payload, CanonicalError> {
        canonical::decode_payload(&self.raw_payload)
    }

    /// Notification projection of this event.
    pub fn to_queue_message(&self, payload: Payload) -> QueueMessage {
        QueueMessage {
            event_id: self.event_id,
            user_id: self.user_id,
            source_type: self.source_type,
            payload,
            timestamp: self.created_at,
        }
    }

    /// API representation with the payload decoded.
    pub fn to_response(&self) -> Result<EventResponse, CanonicalError> {
        Ok(EventResponse {
            event_id: self.event_id,
            user_id: self.user_id,
            source_type: self.source_type,
            raw_payload: self.payload()?,
            checksum: self.checksum.clone(),
            created_at: self.created_at,
        })
    }
}

/// `jsonb` copy of a canonical payload for the GIN index.
///
/// `None` when jsonb cannot hold the value: Postgres rejects U+0000 in
/// strings and keys. The copy is never read back; `raw_payload` is.
fn index_copy(raw_payload: &[u8]) -> Option<String> {
    let payload = canonical::decode_payload(raw_payload).ok()?;
    let indexable = payload
        .iter()
        .all(|(key, value)| !key.contains('\0') && jsonb_compatible(value));
    if !indexable {
        return None;
    }
    std::str::from_utf8(raw_payload).ok().map(str::to_owned)
}

fn jsonb_compatible(value: &Value) -> bool {
    match value {
        Value::String(s) => !s.contains('\0'),
        Value::Array(items) => items.iter().all(jsonb_compatible),
        Value::Object(map) => map
            .iter()
            .all(|(key, value)| !key.contains('\0') && jsonb_compatible(value)),
        Value::Null | Value::Bool(_) | Value::Number(_) => true,
    }
}

/// Row shape of `ingestion_events` as selected by the processors below.
///
/// `raw_payload` holds the canonical bytes exactly as checksummed.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IngestionEventRow {
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub source_type: SourceTypeName,
    pub raw_payload: Vec<u8>,
    pub checksum: String,
    pub created_at: OffsetDateTime,
}

impl TryFrom<IngestionEventRow> for IngestionEvent {
    type Error = StoreError;

    fn try_from(row: IngestionEventRow) -> Result<Self, Self::Error> {
        let event = IngestionEvent {
            event_id: row.event_id,
            user_id: row.user_id,
            source_type: row.source_type.into(),
            raw_payload: row.raw_payload,
            checksum: row.checksum.trim_end().to_string(),
            created_at: row.created_at,
        };
        event.verify_integrity()?;
        Ok(event)
    }
}

#[derive(Debug, Clone)]
/// Insert a new event row. Rows are never updated afterwards.
pub struct InsertIngestionEvent {
    pub event: IngestionEvent,
}

impl Processor<InsertIngestionEvent> for DatabaseProcessor {
    type Output = ();
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:InsertIngestionEvent")]
    async fn process(&self, insert: InsertIngestionEvent) -> Result<(), sqlx::Error> {
        let InsertIngestionEvent { event } = insert;
        let payload_index = index_copy(&event.raw_payload);

        sqlx::query(
            r#"
            INSERT INTO ingestion_events
            (event_id, user_id, source_type, raw_payload, checksum, payload_index, created_at)
            VALUES ($1, $2, $3, $4, $5, $6::jsonb, $7)
            "#,
        )
        .bind(event.event_id)
        .bind(event.user_id)
        .bind(SourceTypeName::from(event.source_type))
        .bind(event.raw_payload)
        .bind(event.checksum)
        .bind(payload_index)
        .bind(event.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
/// Exact lookup by event id.
pub struct GetIngestionEventById {
    pub event_id: Uuid,
}

impl Processor<GetIngestionEventById> for DatabaseProcessor {
    type Output = Option<IngestionEventRow>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetIngestionEventById")]
    async fn process(
        &self,
        query: GetIngestionEventById,
    ) -> Result<Option<IngestionEventRow>, sqlx::Error> {
        let row = sqlx::query_as::<_, IngestionEventRow>(
            r#"
            SELECT event_id, user_id, source_type, raw_payload, checksum, created_at
            FROM ingestion_events
            WHERE event_id = $1
            "#,
        )
        .bind(query.event_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

#[derive(Debug, Clone)]
/// Most recent events of one user, newest first, at most `limit` rows.
pub struct ListIngestionEventsByUser {
    pub user_id: Uuid,
    pub limit: i64,
}

impl Processor<ListIngestionEventsByUser> for DatabaseProcessor {
    type Output = Vec<IngestionEventRow>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListIngestionEventsByUser")]
    async fn process(
        &self,
        query: ListIngestionEventsByUser,
    ) -> Result<Vec<IngestionEventRow>, sqlx::Error> {
        let rows = sqlx::query_as::<_, IngestionEventRow>(
            r#"
            SELECT event_id, user_id, source_type, raw_payload, checksum, created_at
            FROM ingestion_events
            WHERE user_id = $1
            ORDER BY created_at DESC, event_id DESC
            LIMIT $2
            "#,
        )
        .bind(query.user_id)
        .bind(query.limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
