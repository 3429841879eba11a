//! RedeliveryWorker processor.
//!
//! The RedeliveryWorker is responsible for:
//! - Receiving `QueueMessage`s whose inline publish failed
//! - Republishing them with exponential backoff (`base_delay * 2^attempt`)
//! - Dropping a message with an error log once `max_attempts` is exhausted
//!
//! The store stays authoritative: a dropped message is still recorded and
//! can be recovered by re-scanning it.

use crate::notifier::Notifier;
use signet_sdk::objects::QueueMessage;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// Buffer size of the redelivery channel.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Backoff exponent cap (2^11 times the base delay).
const MAX_BACKOFF_EXPONENT: u32 = 11;

pub type RedeliverySender = mpsc::Sender<QueueMessage>;
pub type RedeliveryReceiver = mpsc::Receiver<QueueMessage>;

pub fn redelivery_channel() -> (RedeliverySender, RedeliveryReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}

/// Delay before redelivery attempt `attempt` (zero-based).
fn calculate_retry_delay(base_delay: Duration, attempt: u32) -> Duration {
    base_delay.saturating_mul(1 << attempt.min(MAX_BACKOFF_EXPONENT))
}

pub struct RedeliveryWorker<N: Notifier + ?Sized> {
    notifier: Arc<N>,
    rx: RedeliveryReceiver,
    shutdown_rx: watch::Receiver<bool>,
    max_attempts: u32,
    base_delay: Duration,
}

impl<N: Notifier + ?Sized> RedeliveryWorker<N> {
    pub fn new(
        notifier: Arc<N>,
        rx: RedeliveryReceiver,
        shutdown_rx: watch::Receiver<bool>,
        max_attempts: u32,
        base_delay: Duration,
    ) -> Self {
        Self {
            notifier,
            rx,
            shutdown_rx,
            max_attempts,
            base_delay,
        }
    }

    /// Run until shutdown is signalled or every sender is dropped.
    pub async fn run(mut self) {
        info!(max_attempts = self.max_attempts, "RedeliveryWorker started");

        loop {
            tokio::select! {
                biased;

                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        info!("RedeliveryWorker received shutdown signal");
                        break;
                    }
                }

                received = self.rx.recv() => {
                    let Some(message) = received else {
                        info!("Redelivery channel closed");
                        break;
                    };
                    debug!(event_id = %message.event_id, "Received message for redelivery");
                    if !self.redeliver(&message).await {
                        break;
                    }
                }
            }
        }

        let pending = self.rx.len();
        if pending > 0 {
            warn!(pending, "RedeliveryWorker stopped with undelivered notifications");
        }
        info!("RedeliveryWorker shutdown complete");
    }

    /// Returns `false` if shutdown interrupted the attempts.
    async fn redeliver(&mut self, message: &QueueMessage) -> bool {
        for attempt in 0..self.max_attempts {
            let delay = calculate_retry_delay(self.base_delay, attempt);
            if !self.sleep_unless_shutdown(delay).await {
                warn!(
                    event_id = %message.event_id,
                    "Shutdown during redelivery, notification dropped"
                );
                return false;
            }

            match self.notifier.publish(message).await {
                Ok(()) => {
                    info!(
                        event_id = %message.event_id,
                        attempt = attempt + 1,
                        "Notification redelivered"
                    );
                    return true;
                }
                Err(e) => {
                    warn!(
                        event_id = %message.event_id,
                        attempt = attempt + 1,
                        error = %e,
                        "Notification redelivery failed"
                    );
                }
            }
        }

        error!(
            event_id = %message.event_id,
            attempts = self.max_attempts,
            "Giving up on notification; event remains in the store"
        );
        true
    }

    async fn sleep_unless_shutdown(&mut self, delay: Duration) -> bool {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                biased;

                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        return false;
                    }
                }

                _ = &mut sleep => return true,
            }
        }
    }
}
