//! Backfill of classification fields on records written by older releases.
//!
//! Inference only fills gaps. An explicit value, even an explicitly empty
//! health value, is never overwritten, which keeps a second pass a no-op.
//! A record whose stored detail no longer decodes is counted but left as is.

use serde::Serialize;

use crate::db::{Collection, Database, DatabaseError};
use crate::model::{
    fold_case, BoardHealth, LuminaireHealth, Outcome, Scope, WorkOrderDetail, WorkOrderRecord,
};

/// Counts reported by one migration pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub scanned: u64,
    pub updated: u64,
}

pub struct SchemaMigrator {
    db: Database,
}

impl SchemaMigrator {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Scans every record and rewrites the ones with missing classifications
    /// or a stale folded board key. Runs in one transaction.
    pub fn migrate(&self) -> Result<MigrationReport, DatabaseError> {
        let _span = tracing::info_span!("migrator.backfill").entered();

        let report = self.db.unit_of_work(&[Collection::Records], |uow| {
            let records = uow.records()?;
            let mut report = MigrationReport::default();

            for stored in records.scan_stored()? {
                report.scanned += 1;
                let mut record = stored.record;
                if stored.detail_unreadable {
                    log::warn!("Record {} has an unreadable detail, left untouched", record.id);
                    continue;
                }
                if backfill(&mut record) {
                    records.update(&record)?;
                    report.updated += 1;
                    log::debug!("Backfilled record {}", record.id);
                }
            }
            Ok::<_, DatabaseError>(report)
        })?;

        if report.updated > 0 {
            log::info!(
                "Record migration updated {} of {} records",
                report.updated,
                report.scanned
            );
        } else {
            log::debug!("Record migration: {} records already current", report.scanned);
        }
        Ok(report)
    }
}

/// Applies every backfill rule to `record`. Returns whether it changed.
pub(crate) fn backfill(record: &mut WorkOrderRecord) -> bool {
    let mut changed = false;

    let folded = fold_case(&record.board);
    if record.board_folded != folded {
        record.board_folded = folded;
        changed = true;
    }

    let detail = record.detail.get_or_insert_with(|| {
        changed = true;
        WorkOrderDetail::default()
    });
    if detail.missing_classification() {
        infer_classification(detail);
        changed = true;
    }

    changed
}

fn infer_classification(detail: &mut WorkOrderDetail) {
    let inferred = if detail.mentions_luminaires() {
        Scope::Luminaire
    } else {
        Scope::Board
    };
    let scope = *detail.scope.get_or_insert(inferred);

    if detail.outcome.is_none() {
        detail.outcome = Some(if detail.task_pending.trim().is_empty() {
            Outcome::Complete
        } else {
            Outcome::Partial
        });
    }

    if detail.board_health.is_none() {
        detail.board_health = Some(BoardHealth::Unspecified);
    }

    if detail.luminaire_health.is_none() {
        detail.luminaire_health = Some(if scope != Scope::Luminaire {
            LuminaireHealth::Unspecified
        } else if !detail.task_performed.trim().is_empty() {
            LuminaireHealth::Repaired
        } else if !detail.task_requested.trim().is_empty()
            || !detail.task_pending.trim().is_empty()
        {
            LuminaireHealth::Pending
        } else {
            LuminaireHealth::Unspecified
        });
    }
}
