//! Bounded, cancellable, backed-off outbound calls.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::classify::{classify_status, FailureClass};
use super::connectivity::Connectivity;
use super::error::{CallFailure, FailureKind, TransportError};
use super::transport::{RemoteResponse, Transport};
use crate::sanitize::{truncate_body, MAX_LOGGED_BODY};

/// Retry policy shared by every call of one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Per-attempt timeout.
    pub timeout: Duration,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before retry `n` (0-based) is `base_delay * 2^n`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn with_cancel(self, cancel: CancellationToken) -> CallOptions {
        CallOptions {
            timeout: self.timeout,
            max_retries: self.max_retries,
            base_delay: self.base_delay,
            cancel,
        }
    }

    /// Delay inserted before retry number `retry` (0-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        backoff_delay(self.base_delay, retry)
    }
}

/// Options for a single [`NetworkClient::call`].
#[derive(Debug, Clone)]
pub struct CallOptions {
    pub timeout: Duration,
    pub max_retries: u32,
    pub base_delay: Duration,
    pub cancel: CancellationToken,
}

fn backoff_delay(base: Duration, retry: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(retry))
}

/// Issues calls through a [`Transport`] with timeout, retry and cancellation.
///
/// While [`Connectivity`] reports offline, calls fail immediately with
/// status 0 and no attempt is made.
#[derive(Clone)]
pub struct NetworkClient {
    transport: Arc<dyn Transport>,
    connectivity: Connectivity,
}

impl NetworkClient {
    pub fn new(transport: Arc<dyn Transport>, connectivity: Connectivity) -> Self {
        Self {
            transport,
            connectivity,
        }
    }

    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    /// POSTs `payload` to `target`.
    ///
    /// Transient failures are retried up to `max_retries` times. When retries
    /// run out on a timeout or a dropped connection after the remote had
    /// answered once, the failure carries that earlier status and body. A
    /// fired cancellation token abandons the in-flight attempt and stops
    /// retrying.
    pub async fn call(
        &self,
        target: &str,
        payload: &Value,
        options: &CallOptions,
    ) -> Result<RemoteResponse, CallFailure> {
        if options.cancel.is_cancelled() {
            return Err(CallFailure::new(FailureKind::Cancelled, 0));
        }
        if !self.connectivity.is_online() {
            log::debug!("Offline, not calling {}", target);
            return Err(CallFailure::new(FailureKind::Unreachable, 0));
        }

        let mut attempts = 0u32;
        // Status and body of the most recent attempt the remote answered
        let mut last_answer: Option<(u16, Option<String>)> = None;
        loop {
            if attempts > 0 {
                let delay = backoff_delay(options.base_delay, attempts - 1);
                log::info!(
                    "Retrying {} (attempt {}/{}) after {}ms...",
                    target,
                    attempts + 1,
                    options.max_retries + 1,
                    delay.as_millis()
                );
                tokio::select! {
                    biased;
                    _ = options.cancel.cancelled() => {
                        return Err(CallFailure::new(FailureKind::Cancelled, attempts));
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            attempts += 1;
            let outcome = tokio::select! {
                biased;
                _ = options.cancel.cancelled() => {
                    log::debug!("Call to {} cancelled during attempt {}", target, attempts);
                    return Err(CallFailure::new(FailureKind::Cancelled, attempts));
                }
                result = tokio::time::timeout(
                    options.timeout,
                    self.transport.post_json(target, payload),
                ) => result,
            };

            let failure = match outcome {
                Ok(Ok(response)) => match classify_status(response.status) {
                    FailureClass::Success => return Ok(response),
                    _ => {
                        let body = String::from_utf8_lossy(&response.body);
                        CallFailure::rejected(
                            response.status,
                            attempts,
                            Some(truncate_body(&body, MAX_LOGGED_BODY)),
                        )
                    }
                },
                Ok(Err(TransportError::Timeout)) | Err(_) => {
                    CallFailure::new(FailureKind::Timeout, attempts)
                }
                Ok(Err(e)) => {
                    log::debug!("Attempt {} to {} failed: {}", attempts, target, e);
                    CallFailure::new(FailureKind::Unreachable, attempts)
                }
            };

            if failure.is_retryable() && attempts <= options.max_retries {
                log::warn!("Call to {} failed with retryable error: {}", target, failure);
                if failure.status != 0 {
                    last_answer = Some((failure.status, failure.body.clone()));
                }
                continue;
            }

            let mut failure = failure;
            if failure.status == 0 {
                if let Some((status, body)) = last_answer {
                    failure.status = status;
                    failure.body = body;
                }
            }
            return Err(failure);
        }
    }
}
