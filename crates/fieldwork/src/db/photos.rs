//! Photo collection — evidence images keyed by `(record_id, seq)`.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::DatabaseError;
use crate::model::PhotoBlob;

/// Handle to the `photos` collection inside a unit of work.
pub struct PhotosTable<'a> {
    conn: &'a Connection,
}

fn photo_from_row(row: &Row<'_>) -> Result<PhotoBlob, rusqlite::Error> {
    Ok(PhotoBlob {
        record_id: row.get("record_id")?,
        seq: row.get("seq")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
    })
}

impl<'a> PhotosTable<'a> {
    pub(crate) fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Appends a photo after the record's highest sequence index.
    pub fn append(
        &self,
        record_id: &str,
        content: &[u8],
        created_at: i64,
    ) -> Result<PhotoBlob, DatabaseError> {
        let next: u32 = self.conn.query_row(
            "SELECT COALESCE(MAX(seq) + 1, 0) FROM photos WHERE record_id = ?1",
            params![record_id],
            |r| r.get(0),
        )?;
        self.conn.execute(
            "INSERT INTO photos (record_id, seq, content, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![record_id, next, content, created_at],
        )?;
        Ok(PhotoBlob {
            record_id: record_id.to_string(),
            seq: next,
            content: content.to_vec(),
            created_at,
        })
    }

    pub fn get(&self, record_id: &str, seq: u32) -> Result<Option<PhotoBlob>, DatabaseError> {
        let photo = self
            .conn
            .query_row(
                "SELECT * FROM photos WHERE record_id = ?1 AND seq = ?2",
                params![record_id, seq],
                photo_from_row,
            )
            .optional()?;
        Ok(photo)
    }

    /// All photos of a record in sequence order.
    pub fn list(&self, record_id: &str) -> Result<Vec<PhotoBlob>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM photos WHERE record_id = ?1 ORDER BY seq")?;
        let rows = stmt
            .query_map(params![record_id], photo_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Deletes every photo of a record. Returns the number removed.
    pub fn delete_for(&self, record_id: &str) -> Result<u64, DatabaseError> {
        let count = self
            .conn
            .execute("DELETE FROM photos WHERE record_id = ?1", params![record_id])?;
        Ok(count as u64)
    }

    /// Deletes photos created strictly before `cutoff` (epoch millis).
    pub fn delete_older_than(&self, cutoff: i64) -> Result<u64, DatabaseError> {
        let count = self
            .conn
            .execute("DELETE FROM photos WHERE created_at < ?1", params![cutoff])?;
        Ok(count as u64)
    }

    /// Returns `(photo count, total bytes)`.
    pub fn totals(&self) -> Result<(u64, u64), DatabaseError> {
        let (count, bytes): (i64, i64) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(LENGTH(content)), 0) FROM photos",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;
        Ok((count.max(0) as u64, bytes.max(0) as u64))
    }
}
