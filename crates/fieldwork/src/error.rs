use std::path::PathBuf;

use thiserror::Error;

use crate::db::DatabaseError;
use crate::model::PayloadError;
use crate::net::{CallFailure, TransportError};
use crate::outbox::QueueError;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum FieldworkError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Outbox error: {0}")]
    Queue(#[from] QueueError),

    #[error("Submission error: {0}")]
    Submit(#[from] SubmitError),

    #[error("Network error: {0}")]
    Call(#[from] CallFailure),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, FieldworkError>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("No database path configured and no home directory found")]
    NoDatabasePath,
}

/// Why a live submission was not saved or queued.
#[derive(Error, Debug)]
pub enum SubmitError {
    /// The payload cannot be routed to a site.
    #[error("Invalid work order: {0}")]
    Invalid(String),

    #[error("Invalid work order payload: {0}")]
    Payload(#[from] PayloadError),

    /// Rejected locally before any network attempt; attach less evidence.
    #[error("Work order too large: {reason}")]
    TooLarge { reason: String },

    /// The remote refused the content. Nothing was queued.
    #[error("Work order rejected by remote (status {status})")]
    Rejected { status: u16, body: Option<String> },

    #[error("Outbox error: {0}")]
    Queue(#[from] QueueError),
}
