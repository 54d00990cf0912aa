pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod migrator;
pub mod model;
pub mod net;
pub mod outbox;
pub mod sanitize;
pub mod store;
pub mod submit;
pub mod sync;
pub mod telemetry;

pub use app::FieldworkCore;
pub use config::{load_config, Environment, SyncConfig};
pub use db::{Collection, Database, DatabaseError};
pub use error::{ConfigError, FieldworkError, Result, SubmitError};
pub use migrator::{MigrationReport, SchemaMigrator};
pub use model::{normalize, FlagPatch, RecordFilter, RecordMeta, WorkOrderPayload, WorkOrderRecord};
pub use net::{CallFailure, CallOptions, Connectivity, FailureClass, NetworkClient, RemoteApi};
pub use outbox::{DrainReport, PendingItem, PendingQueue};
pub use store::{DraftStore, LocalStore, StoreError};
pub use submit::{SubmitOutcome, WorkOrderService};
pub use sync::SyncScheduler;
pub use telemetry::{init_logging, LogFormat};
