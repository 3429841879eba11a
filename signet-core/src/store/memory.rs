use super::EventStore;
use crate::entities::IngestionEvent;
use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::error;
use uuid::Uuid;

/// In-process event store with the same ordering, limit and integrity
/// semantics as [`PgEventStore`](super::PgEventStore).
///
/// Optionally restricts writes to a set of known users, mirroring the
/// `user_id` foreign key, and can be told to fail writes.
#[derive(Default)]
pub struct MemoryEventStore {
    events: RwLock<Vec<IngestionEvent>>,
    known_users: Option<HashSet<Uuid>>,
    fail_writes: AtomicBool,
    closed: AtomicBool,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only accept events whose `user_id` is in `users`.
    pub fn with_known_users(users: impl IntoIterator<Item = Uuid>) -> Self {
        Self {
            known_users: Some(users.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Make every subsequent `create` fail as if the database were down.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::SeqCst) {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn create(&self, event: &IngestionEvent) -> Result<(), StoreError> {
        self.ensure_open()?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        if let Some(users) = &self.known_users {
            if !users.contains(&event.user_id) {
                return Err(StoreError::Rejected(format!(
                    "unknown user reference: {}",
                    event.user_id
                )));
            }
        }
        event.verify_integrity()?;

        let mut events = self.events.write().await;
        if events.iter().any(|e| e.event_id == event.event_id) {
            return Err(StoreError::Rejected(format!(
                "duplicate event: {}",
                event.event_id
            )));
        }
        events.push(event.clone());
        Ok(())
    }

    async fn get_by_id(&self, event_id: Uuid) -> Result<Option<IngestionEvent>, StoreError> {
        self.ensure_open()?;
        let events = self.events.read().await;
        let Some(event) = events.iter().find(|e| e.event_id == event_id) else {
            return Ok(None);
        };
        event.verify_integrity()?;
        Ok(Some(event.clone()))
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<IngestionEvent>, StoreError> {
        self.ensure_open()?;
        let mut matching: Vec<IngestionEvent> = self
            .events
            .read()
            .await
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.event_id.cmp(&a.event_id))
        });
        matching.retain(|event| match event.verify_integrity() {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "Skipping unreadable event");
                false
            }
        });
        matching.truncate(limit);
        Ok(matching)
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.ensure_open()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signet_sdk::canonical;
    use signet_sdk::objects::SourceType;
    use time::{Duration, OffsetDateTime};

    fn event_at(user_id: Uuid, seconds: i64) -> IngestionEvent {
        let raw_payload = format!(r#"{{"n":{seconds}}}"#).into_bytes();
        IngestionEvent {
            event_id: Uuid::new_v4(),
            user_id,
            source_type: SourceType::Manual,
            checksum: canonical::checksum(&raw_payload),
            raw_payload,
            created_at: OffsetDateTime::UNIX_EPOCH + Duration::seconds(seconds),
        }
    }

    #[tokio::test]
    async fn test_list_is_newest_first_regardless_of_insertion_order() {
        let store = MemoryEventStore::new();
        let user = Uuid::new_v4();
        for seconds in [5, 1, 9, 3, 7] {
            store.create(&event_at(user, seconds)).await.unwrap();
        }
        store.create(&event_at(Uuid::new_v4(), 100)).await.unwrap();

        let listed = store.list_by_user(user, 100).await.unwrap();
        let order: Vec<i64> = listed
            .iter()
            .map(|e| (e.created_at - OffsetDateTime::UNIX_EPOCH).whole_seconds())
            .collect();
        assert_eq!(order, vec![9, 7, 5, 3, 1]);
    }

    #[tokio::test]
    async fn test_limit_is_a_hard_cap() {
        let store = MemoryEventStore::new();
        let user = Uuid::new_v4();
        for seconds in 0..150 {
            store.create(&event_at(user, seconds)).await.unwrap();
        }
        let listed = store.list_by_user(user, 100).await.unwrap();
        assert_eq!(listed.len(), 100);
        assert_eq!(
            (listed[0].created_at - OffsetDateTime::UNIX_EPOCH).whole_seconds(),
            149
        );
        assert!(store.list_by_user(user, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_user_and_duplicates_are_rejected() {
        let known = Uuid::new_v4();
        let store = MemoryEventStore::with_known_users([known]);

        let err = store.create(&event_at(Uuid::new_v4(), 1)).await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));

        let event = event_at(known, 1);
        store.create(&event).await.unwrap();
        let err = store.create(&event).await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_tampered_event_is_not_accepted() {
        let store = MemoryEventStore::new();
        let mut event = event_at(Uuid::new_v4(), 1);
        event.raw_payload = br#"{"n":2}"#.to_vec();
        let err = store.create(&event).await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupted { .. }));
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_blocks_access() {
        let store = MemoryEventStore::new();
        store.close().await;
        store.close().await;
        assert!(matches!(store.ping().await, Err(StoreError::Closed)));
        assert!(matches!(
            store.get_by_id(Uuid::new_v4()).await,
            Err(StoreError::Closed)
        ));
    }
}
