//! Queued submissions and drain bookkeeping.

use serde::Serialize;
use serde_json::Value;

use crate::db::pending::PendingRow;
use crate::model::{normalize, PayloadError, WorkOrderPayload};
use crate::net::CallFailure;

/// A submission awaiting delivery.
///
/// `payload` is kept exactly as stored, since items written by older
/// releases may use a legacy shape. [`PendingItem::normalized`] resolves it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingItem {
    pub id: i64,
    pub payload: Value,
    pub enqueued_at: String,
}

impl PendingItem {
    pub(crate) fn from_row(row: PendingRow) -> Self {
        // A row that is not JSON at all is kept as a string so drain can
        // recognize and evict it.
        let payload = serde_json::from_str(&row.payload).unwrap_or_else(|e| {
            log::warn!("Pending item {} has an unreadable payload: {}", row.id, e);
            Value::String(row.payload)
        });
        Self {
            id: row.id,
            payload,
            enqueued_at: row.enqueued_at,
        }
    }

    pub fn normalized(&self) -> Result<WorkOrderPayload, PayloadError> {
        normalize(self.payload.clone())
    }
}

/// What happened to one item during a drain or a manual replay.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    /// The remote accepted it; the item is gone.
    Delivered,
    /// It can never succeed; the item is gone.
    Discarded(DiscardReason),
    /// Delivery failed transiently; the item stays queued.
    Retained(CallFailure),
    /// The remote accepted it but the result could not be stored locally.
    /// The item stays queued.
    Unstored(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DiscardReason {
    /// No usable payload or no grouping key. No delivery was attempted.
    Unroutable,
    /// The remote rejected the content.
    Rejected(CallFailure),
}

/// Counts for one drain pass.
///
/// `attempted` counts delivery calls. Every snapshot item ends up in
/// exactly one of `delivered`, `discarded` or `retained`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    pub attempted: u32,
    pub delivered: u32,
    pub discarded: u32,
    pub retained: u32,
}

impl DrainReport {
    pub(crate) fn record(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Delivered => {
                self.attempted += 1;
                self.delivered += 1;
            }
            ItemOutcome::Discarded(DiscardReason::Unroutable) => self.discarded += 1,
            ItemOutcome::Discarded(DiscardReason::Rejected(_)) => {
                self.attempted += 1;
                self.discarded += 1;
            }
            ItemOutcome::Retained(failure) => {
                if failure.attempts > 0 {
                    self.attempted += 1;
                }
                self.retained += 1;
            }
            ItemOutcome::Unstored(_) => {
                self.attempted += 1;
                self.retained += 1;
            }
        }
    }

    pub fn processed(&self) -> u32 {
        self.delivered + self.discarded + self.retained
    }
}
