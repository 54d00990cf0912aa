//! Local store error types.

use thiserror::Error;

use crate::db::DatabaseError;

/// Errors surfaced by [`LocalStore`](super::LocalStore) operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No record with this id. Never resolved by creating one.
    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("PDF blob not found: {0}")]
    BlobNotFound(String),

    #[error("Photo {seq} of record {record_id} not found")]
    PhotoNotFound { record_id: String, seq: u32 },

    /// A save was attempted without artifact bytes.
    #[error("Refusing to save a record without PDF content")]
    EmptyPayload,

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}
