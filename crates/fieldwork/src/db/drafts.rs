//! Draft collection — autosaved, not-yet-submitted forms.

use rusqlite::{params, Connection, OptionalExtension};

use super::DatabaseError;

/// Handle to the `drafts` collection inside a unit of work.
pub struct DraftsTable<'a> {
    conn: &'a Connection,
}

impl<'a> DraftsTable<'a> {
    pub(crate) fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn upsert(&self, key: &str, content: &str, updated_at: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO drafts (key, content, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET content = ?2, updated_at = ?3",
            params![key, content, updated_at],
        )?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let content = self
            .conn
            .query_row(
                "SELECT content FROM drafts WHERE key = ?1",
                params![key],
                |r| r.get(0),
            )
            .optional()?;
        Ok(content)
    }

    pub fn delete(&self, key: &str) -> Result<bool, DatabaseError> {
        let count = self
            .conn
            .execute("DELETE FROM drafts WHERE key = ?1", params![key])?;
        Ok(count > 0)
    }
}
