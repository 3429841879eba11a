use super::Notifier;
use crate::error::PublishError;
use async_trait::async_trait;
use signet_sdk::objects::QueueMessage;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use tokio::sync::Mutex;

/// Notifier that keeps published messages in memory.
///
/// Failure can be switched on permanently or for the next `n` publishes,
/// which is how the pipeline's failure asymmetry is exercised in tests.
#[derive(Default)]
pub struct MemoryNotifier {
    messages: Mutex<Vec<QueueMessage>>,
    failing: AtomicBool,
    fail_next: AtomicU32,
    attempts: AtomicU32,
    closed: AtomicBool,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every publish fails.
    pub fn failing() -> Self {
        let notifier = Self::default();
        notifier.set_failing(true);
        notifier
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Fail the next `count` publishes, then recover.
    pub fn fail_next(&self, count: u32) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    /// Messages accepted so far, in publish order.
    pub async fn messages(&self) -> Vec<QueueMessage> {
        self.messages.lock().await.clone()
    }

    /// Number of publish calls, successful or not.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    fn take_transient_failure(&self) -> bool {
        self.fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn publish(&self, message: &QueueMessage) -> Result<(), PublishError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.closed.load(Ordering::SeqCst) {
            return Err(PublishError::Closed);
        }
        if self.failing.load(Ordering::SeqCst) || self.take_transient_failure() {
            return Err(PublishError::Unavailable("broker unreachable".to_string()));
        }
        self.messages.lock().await.push(message.clone());
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
