//! Background delivery of the outbox.

pub mod scheduler;

pub use scheduler::SyncScheduler;
