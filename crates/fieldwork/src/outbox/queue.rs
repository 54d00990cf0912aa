//! Persisted outbox with at-least-once replay.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::error::QueueError;
use super::item::{DiscardReason, DrainReport, ItemOutcome, PendingItem};
use super::sink::DeliverySink;
use crate::db::{Collection, Database};
use crate::model::{normalize, WorkOrderPayload};
use crate::net::RemoteApi;
use crate::sanitize::strip_evidence;

/// Submissions whose first delivery failed.
///
/// Items are processed oldest first. An item leaves the queue when it is
/// delivered and stored, when the remote rejects its content, or when it has
/// no grouping key. Transient failures keep it for the next drain.
#[derive(Clone)]
pub struct PendingQueue {
    db: Database,
    remote: RemoteApi,
    sink: Option<Arc<dyn DeliverySink>>,
}

impl PendingQueue {
    pub fn new(db: Database, remote: RemoteApi) -> Self {
        Self {
            db,
            remote,
            sink: None,
        }
    }

    /// Installs the hook that stores artifacts of replayed submissions.
    pub fn with_sink(mut self, sink: Arc<dyn DeliverySink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Normalizes a raw payload and queues it without its evidence.
    pub fn enqueue(&self, raw: Value) -> Result<PendingItem, QueueError> {
        let payload = normalize(raw)?;
        self.enqueue_payload(payload)
    }

    /// Queues an already normalized payload without its evidence.
    pub fn enqueue_payload(&self, mut payload: WorkOrderPayload) -> Result<PendingItem, QueueError> {
        strip_evidence(&mut payload);
        let value = serde_json::to_value(&payload).map_err(QueueError::Encode)?;
        let text = value.to_string();
        let enqueued_at = Utc::now().to_rfc3339();

        let id = self.db.unit_of_work(&[Collection::Pending], |uow| {
            uow.pending()?.push(&text, &enqueued_at)
        })?;

        log::info!(
            "Queued work order for board '{}' as pending item {}",
            payload.grouping_key(),
            id
        );
        Ok(PendingItem {
            id,
            payload: value,
            enqueued_at,
        })
    }

    /// All queued items, oldest first.
    pub fn list(&self) -> Result<Vec<PendingItem>, QueueError> {
        let rows = self
            .db
            .unit_of_work(&[Collection::Pending], |uow| uow.pending()?.list())?;
        Ok(rows.into_iter().map(PendingItem::from_row).collect())
    }

    pub fn len(&self) -> Result<u64, QueueError> {
        Ok(self
            .db
            .unit_of_work(&[Collection::Pending], |uow| uow.pending()?.count())?)
    }

    pub fn is_empty(&self) -> Result<bool, QueueError> {
        Ok(self.len()? == 0)
    }

    /// Discards an item without delivering it. Returns whether it existed.
    pub fn remove(&self, id: i64) -> Result<bool, QueueError> {
        let removed = self
            .db
            .unit_of_work(&[Collection::Pending], |uow| uow.pending()?.delete(id))?;
        if removed {
            log::info!("Pending item {} removed manually", id);
        }
        Ok(removed)
    }

    /// Delivers one item now, with the same rules as a drain.
    pub async fn replay(
        &self,
        id: i64,
        cancel: &CancellationToken,
    ) -> Result<ItemOutcome, QueueError> {
        let row = self
            .db
            .unit_of_work(&[Collection::Pending], |uow| uow.pending()?.get(id))?
            .ok_or(QueueError::NotFound(id))?;
        self.process(PendingItem::from_row(row), cancel).await
    }

    /// One pass over the items queued when the drain starts.
    ///
    /// Items enqueued meanwhile wait for the next drain. If `cancel` fires,
    /// the remaining items stay queued untouched and count as retained.
    pub async fn drain(&self, cancel: &CancellationToken) -> Result<DrainReport, QueueError> {
        let snapshot = self.list()?;
        let span = tracing::info_span!("outbox.drain", items = snapshot.len());

        async move {
            let mut report = DrainReport::default();
            for item in snapshot {
                if cancel.is_cancelled() {
                    report.retained += 1;
                    continue;
                }
                let outcome = self.process(item, cancel).await?;
                report.record(&outcome);
            }

            if report.processed() > 0 {
                log::info!(
                    "Drain finished: {} delivered, {} discarded, {} retained",
                    report.delivered,
                    report.discarded,
                    report.retained
                );
            }
            Ok::<_, QueueError>(report)
        }
        .instrument(span)
        .await
    }

    async fn process(
        &self,
        item: PendingItem,
        cancel: &CancellationToken,
    ) -> Result<ItemOutcome, QueueError> {
        let payload = match item.normalized() {
            Ok(payload) if !payload.grouping_key().is_empty() => payload,
            Ok(_) => {
                log::warn!("Pending item {} has no board, discarding", item.id);
                self.delete(item.id)?;
                return Ok(ItemOutcome::Discarded(DiscardReason::Unroutable));
            }
            Err(e) => {
                log::warn!("Pending item {} is unusable, discarding: {}", item.id, e);
                self.delete(item.id)?;
                return Ok(ItemOutcome::Discarded(DiscardReason::Unroutable));
            }
        };

        match self.remote.generate(&payload, cancel.child_token()).await {
            Ok(pdf) => {
                if let Some(sink) = &self.sink {
                    if let Err(e) = sink.delivered(&payload, &pdf) {
                        log::error!(
                            "Pending item {} delivered but its PDF could not be stored, kept: {}",
                            item.id,
                            e
                        );
                        return Ok(ItemOutcome::Unstored(e.to_string()));
                    }
                }
                self.delete(item.id)?;
                log::info!("Pending item {} delivered ({} bytes)", item.id, pdf.len());
                Ok(ItemOutcome::Delivered)
            }
            Err(failure) if failure.class().is_permanent() => {
                log::warn!(
                    "Pending item {} rejected by remote (status {}), discarding",
                    item.id,
                    failure.status
                );
                self.delete(item.id)?;
                Ok(ItemOutcome::Discarded(DiscardReason::Rejected(failure)))
            }
            Err(failure) => {
                log::warn!("Pending item {} kept for retry: {}", item.id, failure);
                Ok(ItemOutcome::Retained(failure))
            }
        }
    }

    fn delete(&self, id: i64) -> Result<(), QueueError> {
        self.db
            .unit_of_work(&[Collection::Pending], |uow| uow.pending()?.delete(id))?;
        Ok(())
    }
}
