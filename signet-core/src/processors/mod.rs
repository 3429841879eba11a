//! Background processors.
//!
//! - `RedeliveryWorker`: republishes notifications that failed inline, when
//!   the pipeline runs with [`NotifyPolicy::Redeliver`](crate::NotifyPolicy::Redeliver).

pub mod redelivery;

pub use redelivery::{
    DEFAULT_CHANNEL_BUFFER, RedeliveryReceiver, RedeliverySender, RedeliveryWorker,
    redelivery_channel,
};
