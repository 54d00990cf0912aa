//! Wiring of every component over one database and one remote.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::config::{resolve_base_url, resolve_database_path, Environment, SyncConfig};
use crate::db::Database;
use crate::error::Result;
use crate::migrator::{MigrationReport, SchemaMigrator};
use crate::net::{Connectivity, HttpTransport, NetworkClient, RemoteApi, Transport};
use crate::outbox::PendingQueue;
use crate::sanitize::redact_url;
use crate::store::{DraftStore, LocalStore};
use crate::submit::{SubmitLimits, WorkOrderService};
use crate::sync::SyncScheduler;

/// The local-first core: storage, outbox, submission and background sync.
pub struct FieldworkCore {
    pub store: LocalStore,
    pub drafts: DraftStore,
    pub queue: PendingQueue,
    pub service: WorkOrderService,
    pub connectivity: Connectivity,
    pub scheduler: SyncScheduler,
    db: Database,
    config: SyncConfig,
}

impl FieldworkCore {
    /// Opens the configured database and connects to the configured remote
    /// over HTTP. The device is assumed online until told otherwise.
    pub fn open(config: SyncConfig, env: Environment) -> Result<Self> {
        let db_path = resolve_database_path(&config)?;
        let base_url = resolve_base_url(&config, env)?;
        let db = Database::open(&db_path)?;
        let transport = Arc::new(HttpTransport::new()?);

        log::info!("Using remote service at {}", redact_url(&base_url));
        Ok(Self::with_parts(
            config,
            db,
            base_url,
            transport,
            Connectivity::default(),
        ))
    }

    /// Builds the core from explicit parts.
    pub fn with_parts(
        config: SyncConfig,
        db: Database,
        base_url: impl Into<String>,
        transport: Arc<dyn Transport>,
        connectivity: Connectivity,
    ) -> Self {
        let client = NetworkClient::new(transport, connectivity.clone());
        let remote = RemoteApi::new(client, base_url, config.retry_policy());

        let store = LocalStore::new(db.clone());
        let drafts = DraftStore::new(db.clone(), config.draft_max_bytes);
        let queue = PendingQueue::new(db.clone(), remote.clone()).with_sink(Arc::new(store.clone()));
        let service = WorkOrderService::new(
            store.clone(),
            queue.clone(),
            remote,
            SubmitLimits::from(&config),
        );
        let scheduler = SyncScheduler::new(
            queue.clone(),
            connectivity.clone(),
            config.drain_interval(),
        );

        Self {
            store,
            drafts,
            queue,
            service,
            connectivity,
            scheduler,
            db,
            config,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Startup maintenance: backfills old records and applies photo retention.
    pub fn prepare(&self) -> Result<MigrationReport> {
        let report = SchemaMigrator::new(self.db.clone()).migrate()?;
        if let Some(days) = self.config.photo_retention_days {
            self.store.purge_old_photos(days)?;
        }
        Ok(report)
    }

    /// Starts background draining. Must be called within a tokio runtime.
    pub fn start(&self) -> JoinHandle<()> {
        self.scheduler.start()
    }

    pub fn shutdown(&self) {
        self.scheduler.stop();
    }
}
