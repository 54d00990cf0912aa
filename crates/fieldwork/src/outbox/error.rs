//! Outbox error types.

use thiserror::Error;

use crate::db::DatabaseError;
use crate::model::PayloadError;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Pending item not found: {0}")]
    NotFound(i64),

    #[error("Invalid payload: {0}")]
    Payload(#[from] PayloadError),

    #[error("Failed to encode pending payload: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}
