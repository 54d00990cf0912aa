//! Durable, queryable storage of work-order records and their blobs.
//!
//! Every multi-collection write runs inside one [`UnitOfWork`], so a record
//! and its PDF (and photos) appear or disappear together.
//!
//! [`UnitOfWork`]: crate::db::UnitOfWork

use chrono::{Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::db::records::RecordScan;
use crate::db::{Collection, Database};
use crate::model::{
    fold_case, FlagPatch, PhotoBlob, RecordFilter, RecordMeta, StorageUsage, WorkOrderRecord,
};

pub mod drafts;
pub mod error;

pub use drafts::{DraftStore, DraftWrite};
pub use error::StoreError;

const SAVE_SCOPE: &[Collection] = &[Collection::Records, Collection::Blobs, Collection::Photos];
const DELETE_SCOPE: &[Collection] = SAVE_SCOPE;

/// Result of an age-based photo purge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    pub deleted: u64,
}

/// Local-first store for completed work orders.
#[derive(Clone)]
pub struct LocalStore {
    db: Database,
}

impl LocalStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Persists a record together with its PDF in one transaction.
    pub fn save_record(&self, meta: RecordMeta, pdf: &[u8]) -> Result<WorkOrderRecord, StoreError> {
        self.save_record_with_photos(meta, pdf, &[])
    }

    /// Persists a record, its PDF and any photos in one transaction.
    ///
    /// The attachment id equals the record id. `created_at` is strictly
    /// greater than every existing record's, so newest-first ordering is
    /// stable even for saves within the same millisecond.
    pub fn save_record_with_photos(
        &self,
        meta: RecordMeta,
        pdf: &[u8],
        photos: &[Vec<u8>],
    ) -> Result<WorkOrderRecord, StoreError> {
        if pdf.is_empty() {
            return Err(StoreError::EmptyPayload);
        }

        let id = Uuid::new_v4().to_string();
        let date = if meta.date.trim().is_empty() {
            Utc::now().date_naive().format("%Y-%m-%d").to_string()
        } else {
            meta.date.trim().to_string()
        };

        let record = self.db.unit_of_work(SAVE_SCOPE, |uow| {
            let records = uow.records()?;
            let now = Utc::now().timestamp_millis();
            let created_at = match records.max_created_at()? {
                Some(latest) if latest >= now => latest + 1,
                _ => now,
            };

            let record = WorkOrderRecord {
                id: id.clone(),
                pdf_id: Some(id.clone()),
                date,
                board_folded: fold_case(&meta.board),
                board: meta.board,
                location: meta.location,
                zone: meta.zone,
                technician: meta.technician,
                vehicle: meta.vehicle,
                tags: meta.tags,
                favorite: false,
                sent: false,
                reprint_count: 0,
                pdf_bytes: pdf.len() as u64,
                created_at,
                detail: meta.detail,
            };

            records.insert(&record)?;
            uow.blobs()?.put(&id, pdf)?;
            let photo_table = uow.photos()?;
            for photo in photos {
                photo_table.append(&id, photo, created_at)?;
            }
            Ok::<_, StoreError>(record)
        })?;

        log::info!(
            "Saved work order {} for board '{}' ({} bytes, {} photos)",
            record.id,
            record.board,
            record.pdf_bytes,
            photos.len()
        );
        Ok(record)
    }

    /// Lists records matching `filter`, newest first.
    ///
    /// Date and favorite constraints run in SQL; the text needle is matched
    /// case-insensitively against every denormalized and detail text field.
    pub fn query(&self, filter: &RecordFilter) -> Result<Vec<WorkOrderRecord>, StoreError> {
        let scan = RecordScan {
            date_from: filter.date_from.map(|d| d.format("%Y-%m-%d").to_string()),
            date_to: filter.date_to.map(|d| d.format("%Y-%m-%d").to_string()),
            favorite: filter.favorite,
        };
        let mut records = self
            .db
            .unit_of_work(&[Collection::Records], |uow| uow.records()?.scan(&scan))?;

        if let Some(needle) = filter.needle() {
            records.retain(|r| r.haystack().contains(&needle));
        }
        Ok(records)
    }

    /// Records whose board matches `board` ignoring case, via the folded index.
    pub fn find_by_board(&self, board: &str) -> Result<Vec<WorkOrderRecord>, StoreError> {
        let folded = fold_case(board.trim());
        Ok(self
            .db
            .unit_of_work(&[Collection::Records], |uow| {
                uow.records()?.find_by_board(&folded)
            })?)
    }

    pub fn get_record(&self, id: &str) -> Result<WorkOrderRecord, StoreError> {
        self.db
            .unit_of_work(&[Collection::Records], |uow| uow.records()?.find(id))?
            .ok_or_else(|| StoreError::RecordNotFound(id.to_string()))
    }

    pub fn get_blob(&self, pdf_id: &str) -> Result<Vec<u8>, StoreError> {
        self.db
            .unit_of_work(&[Collection::Blobs], |uow| uow.blobs()?.get(pdf_id))?
            .ok_or_else(|| StoreError::BlobNotFound(pdf_id.to_string()))
    }

    /// Read-modify-write of the local-only flags. Fails on a missing id.
    pub fn patch_flags(&self, id: &str, patch: FlagPatch) -> Result<WorkOrderRecord, StoreError> {
        self.db.unit_of_work(&[Collection::Records], |uow| {
            let records = uow.records()?;
            let mut record = records
                .find(id)?
                .ok_or_else(|| StoreError::RecordNotFound(id.to_string()))?;
            if patch.is_empty() {
                return Ok(record);
            }
            patch.apply(&mut record);
            records.update_flags(&record)?;
            Ok::<_, StoreError>(record)
        })
    }

    /// Removes a record, its PDF and all of its photos atomically.
    ///
    /// Deleting an id that does not exist is a no-op.
    pub fn delete_record(&self, id: &str) -> Result<(), StoreError> {
        let removed = self.db.unit_of_work(DELETE_SCOPE, |uow| {
            let records = uow.records()?;
            let Some(record) = records.find(id)? else {
                return Ok::<_, StoreError>(None);
            };
            records.delete(id)?;
            if let Some(pdf_id) = record.pdf_id.as_deref() {
                uow.blobs()?.delete(pdf_id)?;
            }
            let photos = uow.photos()?.delete_for(id)?;
            Ok(Some(photos))
        })?;

        match removed {
            Some(photos) => log::info!("Deleted work order {} ({} photos)", id, photos),
            None => log::debug!("Delete of unknown work order {} ignored", id),
        }
        Ok(())
    }

    /// Attaches a photo to an existing record after the fact.
    pub fn attach_photo(&self, record_id: &str, content: &[u8]) -> Result<PhotoBlob, StoreError> {
        self.db
            .unit_of_work(&[Collection::Records, Collection::Photos], |uow| {
                if uow.records()?.find(record_id)?.is_none() {
                    return Err(StoreError::RecordNotFound(record_id.to_string()));
                }
                let photo = uow.photos()?.append(
                    record_id,
                    content,
                    Utc::now().timestamp_millis(),
                )?;
                Ok(photo)
            })
    }

    pub fn list_photos(&self, record_id: &str) -> Result<Vec<PhotoBlob>, StoreError> {
        Ok(self
            .db
            .unit_of_work(&[Collection::Photos], |uow| uow.photos()?.list(record_id))?)
    }

    pub fn get_photo(&self, record_id: &str, seq: u32) -> Result<PhotoBlob, StoreError> {
        self.db
            .unit_of_work(&[Collection::Photos], |uow| uow.photos()?.get(record_id, seq))?
            .ok_or_else(|| StoreError::PhotoNotFound {
                record_id: record_id.to_string(),
                seq,
            })
    }

    /// Deletes photos older than `older_than_days`. Records and PDFs are untouched.
    pub fn purge_old_photos(&self, older_than_days: u32) -> Result<PurgeReport, StoreError> {
        let cutoff = Utc::now() - Duration::days(i64::from(older_than_days));
        self.purge_photos_before(cutoff.timestamp_millis())
    }

    /// Deletes photos created before `cutoff_millis` (Unix epoch milliseconds).
    pub fn purge_photos_before(&self, cutoff_millis: i64) -> Result<PurgeReport, StoreError> {
        let deleted = self.db.unit_of_work(&[Collection::Photos], |uow| {
            uow.photos()?.delete_older_than(cutoff_millis)
        })?;
        if deleted > 0 {
            log::info!("Purged {} photos older than {}", deleted, cutoff_millis);
        }
        Ok(PurgeReport { deleted })
    }

    /// Counts and byte totals across records, PDFs and photos.
    pub fn storage_usage(&self) -> Result<StorageUsage, StoreError> {
        let usage = self
            .db
            .unit_of_work(&[Collection::Records, Collection::Photos], |uow| {
                let (records, pdf_bytes) = uow.records()?.totals()?;
                let (photos, photo_bytes) = uow.photos()?.totals()?;
                Ok::<_, StoreError>(StorageUsage {
                    records,
                    pdf_bytes,
                    photos,
                    photo_bytes,
                })
            })?;
        Ok(usage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Technician, WorkOrderDetail};
    use chrono::NaiveDate;

    fn store() -> LocalStore {
        LocalStore::new(Database::open_in_memory().unwrap())
    }

    fn meta(board: &str) -> RecordMeta {
        RecordMeta {
            date: "2026-05-04".to_string(),
            board: board.to_string(),
            location: "Ruta 9 km 41".to_string(),
            zone: "Norte".to_string(),
            technician: "Ana".to_string(),
            vehicle: "AB123CD".to_string(),
            tags: vec!["nightly".to_string()],
            detail: Some(WorkOrderDetail {
                technicians: vec![Technician {
                    badge: "5521".into(),
                    name: "Ana".into(),
                }],
                observations: "Gabinete con humedad".into(),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_save_record_round_trips_blob() {
        let store = store();
        let record = store.save_record(meta("TS-Norte 4"), b"%PDF-data").unwrap();

        assert_eq!(record.pdf_id.as_deref(), Some(record.id.as_str()));
        assert_eq!(record.board_folded, "ts-norte 4");
        assert_eq!(record.pdf_bytes, 9);
        assert!(!record.favorite && !record.sent);
        assert_eq!(store.get_blob(&record.id).unwrap(), b"%PDF-data");
        assert_eq!(store.query(&RecordFilter::default()).unwrap(), vec![record]);
    }

    #[test]
    fn test_save_requires_pdf_bytes() {
        let store = store();
        assert!(matches!(
            store.save_record(meta("TS"), b""),
            Err(StoreError::EmptyPayload)
        ));
        assert!(store.query(&RecordFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn test_save_defaults_missing_date_to_today() {
        let store = store();
        let mut m = meta("TS");
        m.date = String::new();
        let record = store.save_record(m, b"pdf").unwrap();
        assert_eq!(
            record.date,
            Utc::now().date_naive().format("%Y-%m-%d").to_string()
        );
    }

    #[test]
    fn test_created_at_is_strictly_increasing() {
        let store = store();
        let a = store.save_record(meta("A"), b"1").unwrap();
        let b = store.save_record(meta("B"), b"2").unwrap();
        let c = store.save_record(meta("C"), b"3").unwrap();
        assert!(a.created_at < b.created_at && b.created_at < c.created_at);

        let ids: Vec<_> = store
            .query(&RecordFilter::default())
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![c.id, b.id, a.id]);
    }

    #[test]
    fn test_query_on_empty_store_is_empty() {
        assert!(store().query(&RecordFilter::text("x")).unwrap().is_empty());
    }

    #[test]
    fn test_query_text_matches_case_insensitively_across_fields() {
        let store = store();
        store.save_record(meta("TS-Norte 4"), b"1").unwrap();
        store.save_record(meta("TS-Sur 2"), b"2").unwrap();

        assert_eq!(store.query(&RecordFilter::text("ts-norte")).unwrap().len(), 1);
        assert_eq!(store.query(&RecordFilter::text("HUMEDAD")).unwrap().len(), 2);
        assert_eq!(store.query(&RecordFilter::text("5521")).unwrap().len(), 2);
        assert_eq!(store.query(&RecordFilter::text("nightly")).unwrap().len(), 2);
        assert!(store.query(&RecordFilter::text("oeste")).unwrap().is_empty());
    }

    #[test]
    fn test_query_date_range_is_inclusive() {
        let store = store();
        for (board, date) in [("A", "2026-05-01"), ("B", "2026-05-04"), ("C", "2026-05-09")] {
            let mut m = meta(board);
            m.date = date.to_string();
            store.save_record(m, b"pdf").unwrap();
        }
        let filter = RecordFilter {
            date_from: NaiveDate::from_ymd_opt(2026, 5, 1),
            date_to: NaiveDate::from_ymd_opt(2026, 5, 4),
            ..Default::default()
        };
        let boards: Vec<_> = store
            .query(&filter)
            .unwrap()
            .into_iter()
            .map(|r| r.board)
            .collect();
        assert_eq!(boards, vec!["B", "A"]);
    }

    #[test]
    fn test_patch_flags() {
        let store = store();
        let record = store.save_record(meta("TS"), b"pdf").unwrap();

        let patched = store
            .patch_flags(
                &record.id,
                FlagPatch {
                    favorite: Some(true),
                    reprint_count: Some(3),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(patched.favorite);
        assert_eq!(patched.reprint_count, 3);
        assert!(!patched.sent);

        let favorites = store
            .query(&RecordFilter {
                favorite: Some(true),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(favorites.len(), 1);
    }

    #[test]
    fn test_patch_flags_on_missing_record_fails_without_creating() {
        let store = store();
        let err = store
            .patch_flags(
                "ghost",
                FlagPatch {
                    favorite: Some(true),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::RecordNotFound(id) if id == "ghost"));
        assert!(store.query(&RecordFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn test_delete_cascades_to_pdf_and_photos() {
        let store = store();
        let keep = store.save_record(meta("KEEP"), b"k").unwrap();
        store.attach_photo(&keep.id, b"kp").unwrap();

        let record = store
            .save_record_with_photos(meta("TS"), b"pdf", &[b"p0".to_vec(), b"p1".to_vec()])
            .unwrap();
        store.attach_photo(&record.id, b"p2").unwrap();
        assert_eq!(store.list_photos(&record.id).unwrap().len(), 3);

        store.delete_record(&record.id).unwrap();

        assert!(matches!(
            store.get_blob(&record.id),
            Err(StoreError::BlobNotFound(_))
        ));
        assert!(store.list_photos(&record.id).unwrap().is_empty());
        assert!(matches!(
            store.get_record(&record.id),
            Err(StoreError::RecordNotFound(_))
        ));
        assert_eq!(store.list_photos(&keep.id).unwrap().len(), 1);
        assert_eq!(store.get_blob(&keep.id).unwrap(), b"k");
    }

    #[test]
    fn test_delete_unknown_record_is_noop() {
        store().delete_record("missing").unwrap();
    }

    #[test]
    fn test_attach_photo_requires_record() {
        let store = store();
        assert!(matches!(
            store.attach_photo("ghost", b"x"),
            Err(StoreError::RecordNotFound(_))
        ));
    }

    #[test]
    fn test_get_photo() {
        let store = store();
        let record = store.save_record(meta("TS"), b"pdf").unwrap();
        let photo = store.attach_photo(&record.id, b"img").unwrap();
        assert_eq!(photo.seq, 0);
        assert_eq!(store.get_photo(&record.id, 0).unwrap().content, b"img");
        assert!(matches!(
            store.get_photo(&record.id, 5),
            Err(StoreError::PhotoNotFound { seq: 5, .. })
        ));
    }

    #[test]
    fn test_purge_old_photos_keeps_records_and_pdfs() {
        let store = store();
        let record = store
            .save_record_with_photos(meta("TS"), b"pdf", &[b"p".to_vec()])
            .unwrap();

        assert_eq!(store.purge_old_photos(30).unwrap().deleted, 0);

        let future = Utc::now().timestamp_millis() + 60_000;
        assert_eq!(store.purge_photos_before(future).unwrap().deleted, 1);
        assert!(store.list_photos(&record.id).unwrap().is_empty());
        assert_eq!(store.get_blob(&record.id).unwrap(), b"pdf");
        assert!(store.get_record(&record.id).is_ok());
    }

    #[test]
    fn test_storage_usage() {
        let store = store();
        store
            .save_record_with_photos(meta("A"), b"12345", &[b"abc".to_vec()])
            .unwrap();
        store.save_record(meta("B"), b"123").unwrap();

        let usage = store.storage_usage().unwrap();
        assert_eq!(
            usage,
            StorageUsage {
                records: 2,
                pdf_bytes: 8,
                photos: 1,
                photo_bytes: 3,
            }
        );
    }

    #[test]
    fn test_find_by_board_ignores_case() {
        let store = store();
        store.save_record(meta("TS-Norte"), b"pdf").unwrap();
        assert_eq!(store.find_by_board("  ts-NORTE ").unwrap().len(), 1);
    }
}
