//! Pending collection — the outbox's persisted FIFO list.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::DatabaseError;

/// A raw pending row from the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRow {
    pub id: i64,
    pub payload: String,
    pub enqueued_at: String,
}

impl PendingRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            payload: row.get("payload")?,
            enqueued_at: row.get("enqueued_at")?,
        })
    }
}

/// Handle to the `pending_items` collection inside a unit of work.
pub struct PendingTable<'a> {
    conn: &'a Connection,
}

impl<'a> PendingTable<'a> {
    pub(crate) fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Appends an item and returns its id. Ids grow monotonically, so id
    /// order is enqueue order.
    pub fn push(&self, payload: &str, enqueued_at: &str) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO pending_items (payload, enqueued_at) VALUES (?1, ?2)",
            params![payload, enqueued_at],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get(&self, id: i64) -> Result<Option<PendingRow>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                "SELECT * FROM pending_items WHERE id = ?1",
                params![id],
                PendingRow::from_row,
            )
            .optional()?;
        Ok(row)
    }

    /// All items, oldest first.
    pub fn list(&self) -> Result<Vec<PendingRow>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM pending_items ORDER BY id ASC")?;
        let rows = stmt
            .query_map([], PendingRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
        let count = self
            .conn
            .execute("DELETE FROM pending_items WHERE id = ?1", params![id])?;
        Ok(count > 0)
    }

    pub fn count(&self) -> Result<u64, DatabaseError> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM pending_items", [], |r| r.get(0))?;
        Ok(count.max(0) as u64)
    }
}
