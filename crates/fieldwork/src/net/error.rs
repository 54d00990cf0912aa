//! Network error types.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use super::classify::{classify_status, FailureClass};

/// Why a call ended without a successful response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No network path, or the connection failed before any response.
    Unreachable,
    /// An attempt exceeded its timeout.
    Timeout,
    /// The caller's cancellation token fired.
    Cancelled,
    /// The remote answered with a non-success status.
    Rejected,
    /// The payload could not be encoded as JSON.
    Encode,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Unreachable => "unreachable",
            FailureKind::Timeout => "timed out",
            FailureKind::Cancelled => "cancelled",
            FailureKind::Rejected => "rejected",
            FailureKind::Encode => "unencodable payload",
        };
        f.write_str(s)
    }
}

/// Final failure of a [`NetworkClient::call`](super::NetworkClient::call).
///
/// `status` is `0` whenever the remote never produced a response.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("Call {kind} (status {status}) after {attempts} attempt(s)")]
pub struct CallFailure {
    pub status: u16,
    pub kind: FailureKind,
    pub attempts: u32,
    /// Truncated response body, when the remote answered.
    pub body: Option<String>,
}

impl CallFailure {
    pub(crate) fn new(kind: FailureKind, attempts: u32) -> Self {
        Self {
            status: 0,
            kind,
            attempts,
            body: None,
        }
    }

    pub(crate) fn rejected(status: u16, attempts: u32, body: Option<String>) -> Self {
        Self {
            status,
            kind: FailureKind::Rejected,
            attempts,
            body,
        }
    }

    /// Delivery decision for this failure.
    ///
    /// Unreachable, timed-out and cancelled calls are transient; an
    /// unencodable payload is permanent; a remote answer is classified by
    /// its status.
    pub fn class(&self) -> FailureClass {
        match self.kind {
            FailureKind::Unreachable | FailureKind::Timeout | FailureKind::Cancelled => {
                FailureClass::Transient
            }
            FailureKind::Encode => FailureClass::Permanent,
            FailureKind::Rejected => classify_status(self.status),
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind != FailureKind::Cancelled && self.class().is_retryable()
    }
}

/// Errors from a single transport attempt.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Remote unreachable: {0}")]
    Unreachable(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Failed to build HTTP client: {0}")]
    Build(String),
}
