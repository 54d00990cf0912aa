//! Live submission of a completed work order.
//!
//! A submission is first sent to the remote service. On success its PDF and
//! photos are stored locally in one transaction; on a transient failure, or
//! when that local save fails, it is queued without evidence for a later drain.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::SyncConfig;
use crate::error::SubmitError;
use crate::model::{normalize, RecordMeta, WorkOrderPayload, WorkOrderRecord};
use crate::net::{FailureClass, RemoteApi};
use crate::outbox::{PendingItem, PendingQueue};
use crate::store::LocalStore;

/// Longest encoded photo the remote accepts.
pub const MAX_PHOTO_CHARS: usize = 2_000_000;

/// Where a submission ended up.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Generated remotely and stored locally.
    Saved(WorkOrderRecord),
    /// Not delivered yet; waiting in the outbox.
    Queued(PendingItem),
}

/// Client-side size limits checked before any network attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitLimits {
    pub max_payload_bytes: usize,
    pub max_photos: usize,
}

impl From<&SyncConfig> for SubmitLimits {
    fn from(config: &SyncConfig) -> Self {
        Self {
            max_payload_bytes: config.max_payload_bytes,
            max_photos: config.max_photos,
        }
    }
}

impl Default for SubmitLimits {
    fn default() -> Self {
        Self::from(&SyncConfig::default())
    }
}

#[derive(Clone)]
pub struct WorkOrderService {
    store: LocalStore,
    queue: PendingQueue,
    remote: RemoteApi,
    limits: SubmitLimits,
}

impl WorkOrderService {
    pub fn new(
        store: LocalStore,
        queue: PendingQueue,
        remote: RemoteApi,
        limits: SubmitLimits,
    ) -> Self {
        Self {
            store,
            queue,
            remote,
            limits,
        }
    }

    /// Submits a raw form payload in any historical shape.
    ///
    /// A transient failure queues the submission. A permanent rejection
    /// returns [`SubmitError::Rejected`] and nothing is queued, so the caller
    /// still holds the only copy. If the remote succeeds but the local save
    /// fails, the submission is queued for another attempt.
    pub async fn submit(
        &self,
        raw: Value,
        cancel: &CancellationToken,
    ) -> Result<SubmitOutcome, SubmitError> {
        let payload = normalize(raw)?;
        if payload.grouping_key().is_empty() {
            return Err(SubmitError::Invalid("a board is required".to_string()));
        }
        self.check_size(&payload)?;

        let span = tracing::info_span!("submit", board = %payload.grouping_key());
        self.deliver(payload, cancel).instrument(span).await
    }

    async fn deliver(
        &self,
        payload: WorkOrderPayload,
        cancel: &CancellationToken,
    ) -> Result<SubmitOutcome, SubmitError> {
        match self.remote.generate(&payload, cancel.child_token()).await {
            Ok(pdf) => {
                let photos = decode_photos(&payload.photos);
                let meta = RecordMeta::from_payload(&payload);
                match self.store.save_record_with_photos(meta, &pdf, &photos) {
                    Ok(record) => Ok(SubmitOutcome::Saved(record)),
                    Err(e) => {
                        log::error!("Generated work order could not be stored ({}), queueing", e);
                        let item = self.queue.enqueue_payload(payload)?;
                        Ok(SubmitOutcome::Queued(item))
                    }
                }
            }
            Err(failure) => match failure.class() {
                FailureClass::TooLarge => Err(SubmitError::TooLarge {
                    reason: format!("remote refused the request size (status {})", failure.status),
                }),
                FailureClass::Permanent => {
                    log::warn!("Submission rejected by remote: {}", failure);
                    Err(SubmitError::Rejected {
                        status: failure.status,
                        body: failure.body,
                    })
                }
                _ => {
                    log::info!("Submission not delivered ({}), queueing", failure);
                    let item = self.queue.enqueue_payload(payload)?;
                    Ok(SubmitOutcome::Queued(item))
                }
            },
        }
    }

    fn check_size(&self, payload: &WorkOrderPayload) -> Result<(), SubmitError> {
        if payload.photos.len() > self.limits.max_photos {
            return Err(SubmitError::TooLarge {
                reason: format!(
                    "{} photos attached, at most {} allowed",
                    payload.photos.len(),
                    self.limits.max_photos
                ),
            });
        }

        if let Some(index) = payload.photos.iter().position(|p| p.len() > MAX_PHOTO_CHARS) {
            return Err(SubmitError::TooLarge {
                reason: format!("photo {} exceeds {} characters", index + 1, MAX_PHOTO_CHARS),
            });
        }

        let size = serde_json::to_vec(payload)
            .map(|bytes| bytes.len())
            .map_err(|e| SubmitError::Invalid(e.to_string()))?;
        if size > self.limits.max_payload_bytes {
            return Err(SubmitError::TooLarge {
                reason: format!(
                    "payload is {} bytes, limit is {}",
                    size, self.limits.max_payload_bytes
                ),
            });
        }
        Ok(())
    }
}

/// Decodes base64 photos, with or without a `data:` URL prefix.
/// Undecodable entries are skipped.
fn decode_photos(photos: &[String]) -> Vec<Vec<u8>> {
    photos
        .iter()
        .enumerate()
        .filter_map(|(index, photo)| {
            let encoded = match photo.split_once(',') {
                Some((header, data)) if header.starts_with("data:") => data,
                _ => photo.as_str(),
            };
            match STANDARD.decode(encoded.trim()) {
                Ok(bytes) if !bytes.is_empty() => Some(bytes),
                Ok(_) => None,
                Err(e) => {
                    log::warn!("Photo {} is not valid base64, skipping: {}", index + 1, e);
                    None
                }
            }
        })
        .collect()
}
