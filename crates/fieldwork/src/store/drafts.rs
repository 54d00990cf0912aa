//! Autosave of in-progress forms.
//!
//! Drafts are a convenience. A write that cannot be stored (too large, or
//! the database refuses it) is dropped and the caller keeps its in-memory
//! state; it never surfaces as an error.

use chrono::Utc;
use serde_json::Value;

use crate::db::{Collection, Database, DatabaseError};
use crate::sanitize::strip_evidence_value;

/// Outcome of a draft save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftWrite {
    Saved { bytes: usize },
    Dropped,
}

#[derive(Clone)]
pub struct DraftStore {
    db: Database,
    max_bytes: usize,
}

impl DraftStore {
    pub fn new(db: Database, max_bytes: usize) -> Self {
        Self { db, max_bytes }
    }

    /// Stores `draft` under `key` with evidence removed.
    ///
    /// An oversized draft also clears any previously stored draft for the
    /// key so a stale version is never restored.
    pub fn save(&self, key: &str, draft: &Value) -> DraftWrite {
        let mut draft = draft.clone();
        strip_evidence_value(&mut draft);

        let content = match serde_json::to_string(&draft) {
            Ok(content) => content,
            Err(e) => {
                log::warn!("Draft '{}' not serializable, dropped: {}", key, e);
                return DraftWrite::Dropped;
            }
        };

        if content.len() > self.max_bytes {
            log::debug!(
                "Draft '{}' is {} bytes (limit {}), dropped",
                key,
                content.len(),
                self.max_bytes
            );
            self.clear(key);
            return DraftWrite::Dropped;
        }

        let updated_at = Utc::now().to_rfc3339();
        let result = self.db.unit_of_work(&[Collection::Drafts], |uow| {
            uow.drafts()?.upsert(key, &content, &updated_at)
        });
        match result {
            Ok(()) => DraftWrite::Saved {
                bytes: content.len(),
            },
            Err(e) => {
                log::warn!("Draft '{}' could not be stored, dropped: {}", key, e);
                DraftWrite::Dropped
            }
        }
    }

    /// The stored draft for `key`. Unreadable drafts load as `None`.
    pub fn load(&self, key: &str) -> Option<Value> {
        let content = self
            .db
            .unit_of_work(&[Collection::Drafts], |uow| uow.drafts()?.get(key))
            .map_err(|e| log::warn!("Draft '{}' could not be read: {}", key, e))
            .ok()??;

        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Draft '{}' is corrupt, ignoring: {}", key, e);
                None
            }
        }
    }

    pub fn clear(&self, key: &str) {
        let result: Result<bool, DatabaseError> = self
            .db
            .unit_of_work(&[Collection::Drafts], |uow| uow.drafts()?.delete(key));
        if let Err(e) = result {
            log::warn!("Draft '{}' could not be cleared: {}", key, e);
        }
    }
}
