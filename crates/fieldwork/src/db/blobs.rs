//! Blob collection — opaque PDF content keyed by attachment id.

use rusqlite::{params, Connection, OptionalExtension};

use super::DatabaseError;

/// Handle to the `blobs` collection inside a unit of work.
pub struct BlobsTable<'a> {
    conn: &'a Connection,
}

impl<'a> BlobsTable<'a> {
    pub(crate) fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Stores (or replaces) the content for `pdf_id`.
    pub fn put(&self, pdf_id: &str, content: &[u8]) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO blobs (pdf_id, content) VALUES (?1, ?2)",
            params![pdf_id, content],
        )?;
        Ok(())
    }

    pub fn get(&self, pdf_id: &str) -> Result<Option<Vec<u8>>, DatabaseError> {
        let content = self
            .conn
            .query_row(
                "SELECT content FROM blobs WHERE pdf_id = ?1",
                params![pdf_id],
                |r| r.get(0),
            )
            .optional()?;
        Ok(content)
    }

    pub fn delete(&self, pdf_id: &str) -> Result<bool, DatabaseError> {
        let count = self
            .conn
            .execute("DELETE FROM blobs WHERE pdf_id = ?1", params![pdf_id])?;
        Ok(count > 0)
    }
}
