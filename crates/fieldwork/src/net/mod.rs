//! Outbound calls to the document-generation service.

pub mod classify;
pub mod client;
pub mod connectivity;
pub mod error;
pub mod remote;
pub mod transport;

pub use classify::{classify_status, FailureClass};
pub use client::{CallOptions, NetworkClient, RetryPolicy};
pub use connectivity::Connectivity;
pub use error::{CallFailure, FailureKind, TransportError};
pub use remote::RemoteApi;
pub use transport::{HttpTransport, RemoteResponse, Transport};
