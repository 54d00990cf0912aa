//! Durability properties of the local store, the migrator and drafts.

mod common;

use tokio_util::sync::CancellationToken;

use common::{FakeRemote, TestHarness, WorkOrderBuilder};
use fieldwork::model::{BoardHealth, LuminaireHealth, Outcome, Scope, WorkOrderDetail};
use fieldwork::store::DraftWrite;
use fieldwork::{
    Connectivity, FieldworkCore, LocalStore, RecordFilter, RecordMeta, StoreError, SyncConfig,
};

fn meta(board: &str) -> RecordMeta {
    RecordMeta {
        date: "2026-05-04".into(),
        board: board.into(),
        zone: "Norte".into(),
        technician: "Ana Gómez".into(),
        ..Default::default()
    }
}

#[test]
fn test_saved_record_and_blob_are_readable() {
    let h = TestHarness::new();
    let store = &h.core.store;

    for (i, size) in [1usize, 17, 4096, 70_000].into_iter().enumerate() {
        let pdf: Vec<u8> = (0..size).map(|b| (b % 251) as u8).collect();
        let record = store.save_record(meta(&format!("TS-{}", i)), &pdf).unwrap();

        let pdf_id = record.pdf_id.clone().unwrap();
        assert_eq!(store.get_blob(&pdf_id).unwrap(), pdf);
        assert_eq!(record.pdf_bytes, size as u64);
        let all = store.query(&RecordFilter::default()).unwrap();
        assert!(all.iter().any(|r| r.id == record.id));
    }

    // Newest first
    let all = store.query(&RecordFilter::default()).unwrap();
    assert_eq!(all[0].board, "TS-3");
    assert!(all.windows(2).all(|w| w[0].created_at > w[1].created_at));
}

#[test]
fn test_delete_cascades_to_blob_and_photos() {
    let h = TestHarness::new();
    let store = &h.core.store;

    for photos in [0usize, 1, 3] {
        let record = store
            .save_record_with_photos(meta("TS-1"), b"%PDF", &vec![b"jpg".to_vec(); photos])
            .unwrap();
        store.attach_photo(&record.id, b"late photo").unwrap();
        assert_eq!(store.list_photos(&record.id).unwrap().len(), photos + 1);

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
    }
    assert_eq!(store.storage_usage().unwrap().photos, 0);
}

#[test]
fn test_migration_second_pass_is_a_no_op() {
    let h = TestHarness::new();
    let store = &h.core.store;

    // Written by an older release: no classification at all
    store.save_record(meta("TS-Old"), b"%PDF").unwrap();
    let mut luminaire = meta("TS-Lum");
    luminaire.detail = Some(WorkOrderDetail {
        luminaire_equipment: "LED 150W".into(),
        task_performed: "Cambio de luminarias".into(),
        task_pending: "Falta una columna".into(),
        ..Default::default()
    });
    let lum = store.save_record(luminaire, b"%PDF").unwrap();
    let mut current = meta("TS-New");
    current.detail = Some(WorkOrderDetail {
        scope: Some(Scope::Board),
        outcome: Some(Outcome::Complete),
        board_health: Some(BoardHealth::Ok),
        luminaire_health: Some(LuminaireHealth::Unspecified),
        ..Default::default()
    });
    store.save_record(current, b"%PDF").unwrap();

    let first = h.core.prepare().unwrap();
    assert_eq!(first.scanned, 3);
    assert_eq!(first.updated, 2);

    let second = h.core.prepare().unwrap();
    assert_eq!(second.scanned, 3);
    assert_eq!(second.updated, 0);

    let detail = store.get_record(&lum.id).unwrap().detail.unwrap();
    assert_eq!(detail.scope, Some(Scope::Luminaire));
    assert_eq!(detail.outcome, Some(Outcome::Partial));
    assert_eq!(detail.luminaire_health, Some(LuminaireHealth::Repaired));
    assert_eq!(detail.board_health, Some(BoardHealth::Unspecified));
}

#[test]
fn test_prepare_applies_photo_retention() {
    let config = SyncConfig {
        photo_retention_days: Some(30),
        ..Default::default()
    };
    let h = TestHarness::with_config(config, true);
    let record = h.core.store.save_record(meta("TS-1"), b"%PDF").unwrap();
    h.core.store.attach_photo(&record.id, b"recent").unwrap();

    h.core.prepare().unwrap();

    // Recent photos survive; records and PDFs are never purged
    assert_eq!(h.core.store.list_photos(&record.id).unwrap().len(), 1);
    assert_eq!(h.core.store.get_blob(&record.id).unwrap(), b"%PDF");
}

#[tokio::test]
async fn test_records_and_queue_survive_reopen() {
    let h = TestHarness::new();
    let cancel = CancellationToken::new();
    h.core
        .service
        .submit(WorkOrderBuilder::new("TS-Saved").build(), &cancel)
        .await
        .unwrap();
    h.set_online(false);
    h.core
        .service
        .submit(WorkOrderBuilder::new("TS-Queued").build(), &cancel)
        .await
        .unwrap();

    let db = h.reopen();
    let store = LocalStore::new(db.clone());
    let saved = store.find_by_board("TS-SAVED").unwrap();
    assert_eq!(saved.len(), 1);

    let remote = FakeRemote::new();
    let restarted = FieldworkCore::with_parts(
        SyncConfig::default(),
        db,
        "http://remote.test",
        remote.clone(),
        Connectivity::new(true),
    );
    let pending = restarted.queue.list().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].payload["board"], "TS-Queued");

    let report = restarted.queue.drain(&cancel).await.unwrap();
    assert_eq!(report.delivered, 1);
    assert_eq!(remote.calls(), 1);
    assert_eq!(
        restarted.store.query(&RecordFilter::default()).unwrap().len(),
        2
    );
}

#[test]
fn test_draft_round_trip_drops_evidence() {
    let h = TestHarness::new();
    let draft = WorkOrderBuilder::new("TS-1")
        .with_photos(2)
        .with_signature()
        .build();

    assert!(matches!(
        h.core.drafts.save("work-order", &draft),
        DraftWrite::Saved { .. }
    ));

    let restored = h.core.drafts.load("work-order").unwrap();
    assert_eq!(restored["board"], "TS-1");
    assert_eq!(restored["photos"], serde_json::json!([]));
    assert_eq!(restored["signature_image"], "");

    h.core.drafts.clear("work-order");
    assert!(h.core.drafts.load("work-order").is_none());
}

#[test]
fn test_oversized_draft_clears_previous_version() {
    let config = SyncConfig {
        draft_max_bytes: 2048,
        ..Default::default()
    };
    let h = TestHarness::with_config(config, true);
    h.core
        .drafts
        .save("work-order", &WorkOrderBuilder::new("TS-1").build());

    let huge = WorkOrderBuilder::new("TS-1")
        .with("observations", serde_json::json!("x".repeat(4096)))
        .build();
    assert_eq!(h.core.drafts.save("work-order", &huge), DraftWrite::Dropped);
    assert!(h.core.drafts.load("work-order").is_none());
}
