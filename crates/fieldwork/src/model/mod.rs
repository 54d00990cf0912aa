//! Domain types shared by the store, the outbox and the migrator.

pub mod detail;
pub(crate) mod lenient;
pub mod payload;
pub mod record;

pub use detail::{
    BoardHealth, LuminaireHealth, Material, Outcome, Scope, Technician, UnknownClassification,
    WorkOrderDetail,
};
pub use payload::{normalize, PayloadError, WorkOrderPayload, CIRCUIT_SEPARATOR};
pub use record::{
    fold_case, FlagPatch, PhotoBlob, RecordFilter, RecordMeta, StorageUsage, WorkOrderRecord,
};
