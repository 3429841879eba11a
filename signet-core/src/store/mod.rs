//! Durable, append-only persistence of ingestion events.
//!
//! Implementations rely on the storage layer for write serialization; the
//! pipeline adds no locking of its own.

mod memory;
mod postgres;

pub use memory::MemoryEventStore;
pub use postgres::PgEventStore;

use crate::entities::IngestionEvent;
use crate::error::StoreError;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Insert an immutable row.
    async fn create(&self, event: &IngestionEvent) -> Result<(), StoreError>;

    /// Exact lookup. `Ok(None)` means the event does not exist.
    async fn get_by_id(&self, event_id: Uuid) -> Result<Option<IngestionEvent>, StoreError>;

    /// Events of `user_id` ordered by `created_at` descending, never more
    /// than `limit` rows.
    async fn list_by_user(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<IngestionEvent>, StoreError>;

    /// Release pooled resources. Calling it more than once is harmless.
    async fn close(&self);

    /// Readiness check.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
