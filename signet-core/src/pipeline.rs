//! Dual-write coordinator and query path.
//!
//! One submission moves through
//!
//! ```text
//! Received -> Validated -> Persisted -> { Notified | NotifyFailed } -> Acknowledged
//! ```
//!
//! Only a failure before `Persisted` is returned to the caller. Once the
//! store has accepted the event the request succeeds, whatever happens to
//! the notification. Within one submission persistence strictly precedes
//! notification; across submissions there is no ordering.

use crate::entities::IngestionEvent;
use crate::error::IngestError;
use crate::factory::EventFactory;
use crate::intake::{self, Submission};
use crate::notifier::Notifier;
use crate::processors::RedeliverySender;
use crate::store::EventStore;
use signet_sdk::objects::QueueMessage;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Semaphore, SemaphorePermit, mpsc::error::TrySendError};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Hard cap on events returned by [`IngestPipeline::list_events`].
pub const MAX_LIST_LIMIT: usize = 100;

/// What happens to a notification whose inline publish failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyPolicy {
    /// Log the failure and move on. Subscribers may miss the event and have
    /// to re-scan the store.
    BestEffort,
    /// Hand the message to the redelivery processor.
    ///
    /// The processor retries one message at a time, so a single message can
    /// occupy it for roughly `base_delay * (2^max_attempts - 1)`. While the
    /// broker is down the redelivery queue fills up and further failed
    /// notifications are dropped and reported as
    /// [`NotificationOutcome::Failed`].
    Redeliver {
        max_attempts: u32,
        base_delay: Duration,
    },
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub notify_policy: NotifyPolicy,
    /// Ingestions allowed to hold a store call at once.
    pub max_in_flight: usize,
    /// How long a submission waits for an admission permit.
    pub admission_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            notify_policy: NotifyPolicy::BestEffort,
            max_in_flight: 64,
            admission_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationOutcome {
    Published,
    /// Publish failed and the message was not queued for redelivery.
    Failed,
    /// Publish failed and the message was queued for redelivery.
    Deferred,
}

/// Acknowledgement of a durably stored event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReceipt {
    pub event_id: Uuid,
    pub created_at: time::OffsetDateTime,
    pub notification: NotificationOutcome,
}

pub struct IngestPipeline<S: ?Sized, N: ?Sized> {
    store: Arc<S>,
    notifier: Arc<N>,
    factory: EventFactory,
    admission: Semaphore,
    admission_timeout: Duration,
    notify_policy: NotifyPolicy,
    redelivery: Option<RedeliverySender>,
}

impl<S, N> IngestPipeline<S, N>
where
    S: EventStore + ?Sized,
    N: Notifier + ?Sized,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, config: PipelineConfig) -> Self {
        Self {
            store,
            notifier,
            factory: EventFactory::default(),
            admission: Semaphore::new(config.max_in_flight.max(1)),
            admission_timeout: config.admission_timeout,
            notify_policy: config.notify_policy,
            redelivery: None,
        }
    }

    pub fn with_factory(mut self, factory: EventFactory) -> Self {
        self.factory = factory;
        self
    }

    /// Attach the sender side of a running redelivery processor.
    pub fn with_redelivery(mut self, sender: RedeliverySender) -> Self {
        self.redelivery = Some(sender);
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn notifier(&self) -> &Arc<N> {
        &self.notifier
    }

    /// Validate, persist, then notify.
    ///
    /// If the returned future is dropped while the store call is pending,
    /// the row may or may not exist afterwards.
    #[tracing::instrument(skip_all, fields(user_id = %user_id))]
    pub async fn ingest(
        &self,
        submission: Submission,
        user_id: Uuid,
    ) -> Result<IngestReceipt, IngestError> {
        let validated = intake::validate(submission)?;
        let permit = self.admit().await?;

        let event = self.factory.build(&validated, user_id)?;

        if let Err(e) = self.store.create(&event).await {
            error!(event_id = %event.event_id, error = %e, "Failed to store event");
            return Err(e.into());
        }
        // The permit bounds store calls only, not the publish below.
        drop(permit);

        let message = event.to_queue_message(validated.payload);
        let notification = self.notify(message).await;

        info!(
            event_id = %event.event_id,
            source_type = %event.source_type,
            notification = ?notification,
            "Event ingested"
        );

        Ok(IngestReceipt {
            event_id: event.event_id,
            created_at: event.created_at,
            notification,
        })
    }

    pub async fn get_event(&self, event_id: Uuid) -> Result<IngestionEvent, IngestError> {
        self.store
            .get_by_id(event_id)
            .await?
            .ok_or(IngestError::NotFound(event_id))
    }

    /// Up to [`MAX_LIST_LIMIT`] most recent events of `user_id`.
    pub async fn list_events(&self, user_id: Uuid) -> Result<Vec<IngestionEvent>, IngestError> {
        Ok(self.store.list_by_user(user_id, MAX_LIST_LIMIT).await?)
    }

    async fn admit(&self) -> Result<SemaphorePermit<'_>, IngestError> {
        match tokio::time::timeout(self.admission_timeout, self.admission.acquire()).await {
            Ok(Ok(permit)) => Ok(permit),
            Ok(Err(_closed)) => Err(IngestError::Internal(
                "admission semaphore closed".to_string(),
            )),
            Err(_elapsed) => {
                warn!("No admission permit available, rejecting submission");
                Err(IngestError::Overloaded)
            }
        }
    }

    async fn notify(&self, message: QueueMessage) -> NotificationOutcome {
        let event_id = message.event_id;
        let err = match self.notifier.publish(&message).await {
            Ok(()) => return NotificationOutcome::Published,
            Err(e) => e,
        };
        error!(event_id = %event_id, error = %err, "Failed to publish event");

        let (NotifyPolicy::Redeliver { .. }, Some(sender)) = (self.notify_policy, &self.redelivery)
        else {
            return NotificationOutcome::Failed;
        };

        match sender.try_send(message) {
            Ok(()) => {
                debug!(event_id = %event_id, "Queued notification for redelivery");
                NotificationOutcome::Deferred
            }
            Err(TrySendError::Full(_)) => {
                error!(event_id = %event_id, "Redelivery queue full, notification dropped");
                NotificationOutcome::Failed
            }
            Err(TrySendError::Closed(_)) => {
                error!(event_id = %event_id, "Redelivery processor stopped, notification dropped");
                NotificationOutcome::Failed
            }
        }
    }
}
