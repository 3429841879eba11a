use super::EventStore;
use crate::entities::IngestionEvent;
use crate::entities::ingestion_event::{
    GetIngestionEventById, IngestionEventRow, InsertIngestionEvent, ListIngestionEventsByUser,
};
use crate::error::StoreError;
use crate::framework::DatabaseProcessor;
use async_trait::async_trait;
use kanau::processor::Processor;
use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

/// PostgreSQL-backed event store.
///
/// Pool sizing, idle and lifetime eviction are decided by whoever builds the
/// [`PgPool`]; acquiring a connection past the ceiling waits up to the
/// pool's acquire timeout and then fails as a storage error.
#[derive(Clone)]
pub struct PgEventStore {
    processor: DatabaseProcessor,
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            processor: DatabaseProcessor { pool },
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.processor.pool
    }
}

/// Constraint violations become `Rejected`, everything else stays a
/// database error.
fn classify(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            StoreError::Rejected(format!("unknown user reference: {}", db.message()))
        }
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Rejected(format!("duplicate event: {}", db.message()))
        }
        sqlx::Error::Database(db) if db.is_check_violation() => {
            StoreError::Rejected(format!("constraint violated: {}", db.message()))
        }
        sqlx::Error::PoolClosed => StoreError::Closed,
        _ => StoreError::Database(err),
    }
}

/// A corrupted row is logged and left out of listings so it cannot hide
/// the rest of a user's history; `get_by_id` still reports it.
fn readable(row: IngestionEventRow) -> Option<IngestionEvent> {
    match IngestionEvent::try_from(row) {
        Ok(event) => Some(event),
        Err(e) => {
            error!(error = %e, "Skipping unreadable event row");
            None
        }
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn create(&self, event: &IngestionEvent) -> Result<(), StoreError> {
        self.processor
            .process(InsertIngestionEvent {
                event: event.clone(),
            })
            .await
            .map_err(classify)
    }

    async fn get_by_id(&self, event_id: Uuid) -> Result<Option<IngestionEvent>, StoreError> {
        let row = self
            .processor
            .process(GetIngestionEventById { event_id })
            .await
            .map_err(classify)?;
        row.map(IngestionEvent::try_from).transpose()
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<IngestionEvent>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let rows = self
            .processor
            .process(ListIngestionEventsByUser {
                user_id,
                limit: i64::try_from(limit).unwrap_or(i64::MAX),
            })
            .await
            .map_err(classify)?;
        Ok(rows.into_iter().filter_map(readable).collect())
    }

    async fn close(&self) {
        self.processor.pool.close().await;
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.processor.pool)
            .await
            .map_err(classify)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::EventFactory;
    use crate::intake::ValidatedSubmission;
    use signet_sdk::canonical;
    use signet_sdk::objects::SourceType;

    const PLACEHOLDER_USER: Uuid = Uuid::from_u128(0xa0eebc99_9c0b_4ef8_bb6d_6bb9bd380a11);

    #[sqlx::test(migrations = "../migrations")]
    #[ignore = "needs a Postgres server in DATABASE_URL"]
    async fn test_payloads_round_trip_byte_exact(pool: PgPool) {
        let store = PgEventStore::new(pool);
        let factory = EventFactory::default();
        let payloads = [
            r#"{"x":-0.0}"#,
            r#"{"x":1.7976931348623157e308}"#,
            r#"{"a":"\u0000"}"#,
            r#"{"b":[1,{"c":null}],"a":"z"}"#,
        ];

        for text in payloads {
            let payload = canonical::decode_payload(text.as_bytes()).unwrap();
            let submission = ValidatedSubmission {
                source_type: SourceType::Manual,
                payload: payload.clone(),
            };
            let event = factory.build(&submission, PLACEHOLDER_USER).unwrap();
            store.create(&event).await.unwrap();

            let read = store.get_by_id(event.event_id).await.unwrap().unwrap();
            assert_eq!(read, event, "payload {text}");
            assert_eq!(read.payload().unwrap(), payload);
        }

        let listed = store.list_by_user(PLACEHOLDER_USER, 100).await.unwrap();
        assert_eq!(listed.len(), payloads.len());
    }

    #[sqlx::test(migrations = "../migrations")]
    #[ignore = "needs a Postgres server in DATABASE_URL"]
    async fn test_unknown_user_is_rejected(pool: PgPool) {
        let store = PgEventStore::new(pool);
        let submission = ValidatedSubmission {
            source_type: SourceType::Oidc,
            payload: canonical::decode_payload(b"{}").unwrap(),
        };
        let event = EventFactory::default()
            .build(&submission, Uuid::new_v4())
            .unwrap();
        let err = store.create(&event).await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
    }
}
