//! Outbox of submissions awaiting delivery.

pub mod error;
pub mod item;
pub mod queue;
pub mod sink;

pub use error::QueueError;
pub use item::{DiscardReason, DrainReport, ItemOutcome, PendingItem};
pub use queue::PendingQueue;
pub use sink::DeliverySink;
