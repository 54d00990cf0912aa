use rusqlite::Transaction;

use super::blobs::BlobsTable;
use super::drafts::DraftsTable;
use super::pending::PendingTable;
use super::photos::PhotosTable;
use super::records::RecordsTable;
use super::{Collection, DatabaseError};

/// One open transaction spanning a declared set of collections.
///
/// Table handles borrow the unit of work, so none of them can outlive it,
/// and the writes they make become visible only when
/// [`Database::unit_of_work`](super::Database::unit_of_work) commits.
pub struct UnitOfWork<'c> {
    tx: Transaction<'c>,
    scope: Vec<Collection>,
}

impl<'c> UnitOfWork<'c> {
    pub(super) fn new(tx: Transaction<'c>, scope: &[Collection]) -> Self {
        Self {
            tx,
            scope: scope.to_vec(),
        }
    }

    pub(super) fn commit(self) -> Result<(), DatabaseError> {
        self.tx.commit()?;
        Ok(())
    }

    fn require(&self, collection: Collection) -> Result<(), DatabaseError> {
        if self.scope.contains(&collection) {
            Ok(())
        } else {
            Err(DatabaseError::CollectionNotInScope(collection))
        }
    }

    pub fn records(&self) -> Result<RecordsTable<'_>, DatabaseError> {
        self.require(Collection::Records)?;
        Ok(RecordsTable::new(&self.tx))
    }

    pub fn blobs(&self) -> Result<BlobsTable<'_>, DatabaseError> {
        self.require(Collection::Blobs)?;
        Ok(BlobsTable::new(&self.tx))
    }

    pub fn photos(&self) -> Result<PhotosTable<'_>, DatabaseError> {
        self.require(Collection::Photos)?;
        Ok(PhotosTable::new(&self.tx))
    }

    pub fn pending(&self) -> Result<PendingTable<'_>, DatabaseError> {
        self.require(Collection::Pending)?;
        Ok(PendingTable::new(&self.tx))
    }

    pub fn drafts(&self) -> Result<DraftsTable<'_>, DatabaseError> {
        self.require(Collection::Drafts)?;
        Ok(DraftsTable::new(&self.tx))
    }
}
