//! Endpoints of the document-generation service.

use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use super::client::{NetworkClient, RetryPolicy};
use super::error::{CallFailure, FailureKind};
use crate::model::WorkOrderPayload;

/// Path of the endpoint that renders a work order into a PDF.
pub const GENERATE_PATH: &str = "/generate";
/// Path of the batch replay endpoint.
pub const RESYNC_PATH: &str = "/resync";

/// Typed access to the remote service.
#[derive(Clone)]
pub struct RemoteApi {
    client: NetworkClient,
    base_url: String,
    policy: RetryPolicy,
}

impl RemoteApi {
    pub fn new(client: NetworkClient, base_url: impl Into<String>, policy: RetryPolicy) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            policy,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn client(&self) -> &NetworkClient {
        &self.client
    }

    /// Renders `payload` remotely and returns the PDF bytes.
    pub async fn generate(
        &self,
        payload: &WorkOrderPayload,
        cancel: CancellationToken,
    ) -> Result<Vec<u8>, CallFailure> {
        let body = encode(payload)?;
        let url = format!("{}{}", self.base_url, GENERATE_PATH);
        let response = self
            .client
            .call(&url, &body, &self.policy.with_cancel(cancel))
            .await?;
        Ok(response.body)
    }

    /// Replays several payloads in one request as `{"orders": [...]}`.
    ///
    /// Returns the decoded JSON answer, or `Null` for an empty or non-JSON body.
    pub async fn resync(
        &self,
        payloads: &[WorkOrderPayload],
        cancel: CancellationToken,
    ) -> Result<Value, CallFailure> {
        let orders = payloads.iter().map(encode).collect::<Result<Vec<_>, _>>()?;
        let url = format!("{}{}", self.base_url, RESYNC_PATH);
        let response = self
            .client
            .call(&url, &json!({ "orders": orders }), &self.policy.with_cancel(cancel))
            .await?;

        if response.body.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&response.body).unwrap_or_else(|e| {
            log::warn!("Resync answer is not JSON, ignoring it: {}", e);
            Value::Null
        }))
    }
}

fn encode(payload: &WorkOrderPayload) -> Result<Value, CallFailure> {
    serde_json::to_value(payload).map_err(|e| {
        log::error!("Work order payload could not be encoded: {}", e);
        CallFailure::new(FailureKind::Encode, 0)
    })
}
