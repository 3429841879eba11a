//! Best-effort notification of downstream subscribers.
//!
//! Topology: one durable broadcast exchange feeding one durable queue
//! through a fixed routing key. Further subscribers bind their own queues
//! to the exchange without the notifier knowing about them.

mod amqp;
mod memory;

pub use amqp::{AmqpNotifier, Topology};
pub use memory::MemoryNotifier;

use crate::error::PublishError;
use async_trait::async_trait;
use signet_sdk::objects::QueueMessage;

/// Default broadcast exchange for identity events.
pub const DEFAULT_EXCHANGE: &str = "identity.events";
/// Default durable queue consumed by the graph engine.
pub const DEFAULT_QUEUE: &str = "graph.engine.queue";
/// Routing key used for every published event.
pub const DEFAULT_ROUTING_KEY: &str = "identity.new";

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Publish one message. `Ok` means the broker accepted it, not that a
    /// subscriber consumed it.
    async fn publish(&self, message: &QueueMessage) -> Result<(), PublishError>;

    /// Release the connection. Calling it more than once is harmless.
    async fn close(&self);
}
