//! Persisted work-order records and the values used to create and query them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::detail::{BoardHealth, LuminaireHealth, WorkOrderDetail};
use super::payload::WorkOrderPayload;

/// Case-folded copy of a site name, used as the secondary lookup key.
pub fn fold_case(value: &str) -> String {
    value.to_lowercase()
}

/// One completed work order with its denormalized search fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrderRecord {
    pub id: String,
    /// Attachment id of the generated PDF. `None` means no artifact.
    pub pdf_id: Option<String>,

    pub date: String,
    pub board: String,
    pub board_folded: String,
    pub location: String,
    pub zone: String,
    pub technician: String,
    pub vehicle: String,
    pub tags: Vec<String>,

    pub favorite: bool,
    pub sent: bool,
    pub reprint_count: u32,

    pub pdf_bytes: u64,
    /// Milliseconds since the Unix epoch; strictly increasing per store.
    pub created_at: i64,

    pub detail: Option<WorkOrderDetail>,
}

impl WorkOrderRecord {
    /// Lowercased concatenation of every searchable text field.
    pub fn haystack(&self) -> String {
        let mut text = [
            self.board.as_str(),
            self.zone.as_str(),
            self.location.as_str(),
            self.technician.as_str(),
            self.vehicle.as_str(),
            self.date.as_str(),
        ]
        .join(" ");
        for tag in &self.tags {
            text.push(' ');
            text.push_str(tag);
        }
        if let Some(detail) = &self.detail {
            text.push(' ');
            text.push_str(&detail.search_text());
        }
        text.to_lowercase()
    }
}

/// Descriptive metadata supplied when a record is saved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMeta {
    /// `YYYY-MM-DD`; today's UTC date when empty.
    pub date: String,
    pub board: String,
    pub location: String,
    pub zone: String,
    pub technician: String,
    pub vehicle: String,
    pub tags: Vec<String>,
    pub detail: Option<WorkOrderDetail>,
}

impl RecordMeta {
    /// Builds record metadata from a normalized payload.
    ///
    /// Evidence is reduced to flags. Health classifications that do not
    /// apply to the payload's scope are recorded as unspecified.
    pub fn from_payload(payload: &WorkOrderPayload) -> Self {
        let mut detail = WorkOrderDetail {
            scope: payload.scope,
            outcome: payload.outcome,
            board_health: payload.board_health,
            luminaire_health: payload.luminaire_health,
            circuit: payload.circuit.clone(),
            luminaire_equipment: payload.luminaire_equipment.clone(),
            km_start: payload.km_start,
            km_end: payload.km_end,
            km_total: payload.km_total,
            technicians: payload.technicians.clone(),
            materials: payload.materials.clone(),
            task_requested: payload.task_requested.clone(),
            task_performed: payload.task_performed.clone(),
            task_pending: payload.task_pending.clone(),
            observations: payload.observations.clone(),
            technician_signatory: payload.technician_signatory.clone(),
            supervisor_signatory: payload.supervisor_signatory.clone(),
            has_signature: !payload.signature_image.is_empty(),
            photo_count: u32::try_from(payload.photos.len()).unwrap_or(u32::MAX),
        };

        if let Some(scope) = detail.scope {
            if !scope.allows_board_health() {
                detail.board_health = Some(BoardHealth::Unspecified);
            }
            if !scope.allows_luminaire_health() {
                detail.luminaire_health = Some(LuminaireHealth::Unspecified);
            }
        }

        Self {
            date: payload.date.clone(),
            board: payload.board.clone(),
            location: payload.location.clone(),
            zone: payload.zone.clone(),
            technician: payload.primary_technician().to_string(),
            vehicle: payload.vehicle.clone(),
            tags: payload.tags.clone(),
            detail: Some(detail),
        }
    }
}

/// Partial update of the local-only flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagPatch {
    pub favorite: Option<bool>,
    pub sent: Option<bool>,
    pub reprint_count: Option<u32>,
}

impl FlagPatch {
    pub fn is_empty(&self) -> bool {
        self.favorite.is_none() && self.sent.is_none() && self.reprint_count.is_none()
    }

    pub fn apply(&self, record: &mut WorkOrderRecord) {
        if let Some(favorite) = self.favorite {
            record.favorite = favorite;
        }
        if let Some(sent) = self.sent {
            record.sent = sent;
        }
        if let Some(reprint_count) = self.reprint_count {
            record.reprint_count = reprint_count;
        }
    }
}

/// Query filter parameters for record listing.
///
/// `favorite: Some(true)` keeps only favorites, `Some(false)` only
/// non-favorites, `None` both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub text: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub favorite: Option<bool>,
}

impl RecordFilter {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Trimmed, lowercased search needle; `None` when there is nothing to match.
    pub(crate) fn needle(&self) -> Option<String> {
        self.text
            .as_deref()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
    }
}

/// One photo attached to a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoBlob {
    pub record_id: String,
    pub seq: u32,
    pub content: Vec<u8>,
    pub created_at: i64,
}

/// Storage footprint of the local store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageUsage {
    pub records: u64,
    pub pdf_bytes: u64,
    pub photos: u64,
    pub photo_bytes: u64,
}
