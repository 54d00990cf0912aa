//! Where artifacts of replayed submissions go.

use crate::model::{RecordMeta, WorkOrderPayload};
use crate::store::{LocalStore, StoreError};

/// Receives the artifact of every submission delivered from the outbox.
pub trait DeliverySink: Send + Sync {
    fn delivered(&self, payload: &WorkOrderPayload, pdf: &[u8]) -> Result<(), StoreError>;
}

/// Replayed work orders land in the local store like live submissions,
/// minus the evidence that was stripped when they were queued.
impl DeliverySink for LocalStore {
    fn delivered(&self, payload: &WorkOrderPayload, pdf: &[u8]) -> Result<(), StoreError> {
        self.save_record(RecordMeta::from_payload(payload), pdf)?;
        Ok(())
    }
}
