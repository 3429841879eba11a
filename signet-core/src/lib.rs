#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod entities;
pub mod error;
pub mod factory;
pub mod framework;
pub mod intake;
pub mod notifier;
pub mod pipeline;
pub mod processors;
pub mod store;

pub use error::{IngestError, PublishError, StoreError};
pub use pipeline::{IngestPipeline, IngestReceipt, NotificationOutcome, NotifyPolicy, PipelineConfig};
