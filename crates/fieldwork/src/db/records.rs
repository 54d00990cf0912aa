//! Record collection — SQL for the `records` table.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::DatabaseError;
use crate::model::{WorkOrderDetail, WorkOrderRecord};

/// Date/flag constraints pushed down into SQL. Text matching happens in Rust.
#[derive(Debug, Default, Clone)]
pub struct RecordScan {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub favorite: Option<bool>,
}

/// Handle to the `records` collection inside a unit of work.
pub struct RecordsTable<'a> {
    conn: &'a Connection,
}

/// A record row together with how its detail column decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub record: WorkOrderRecord,
    /// The detail column holds JSON that no longer decodes. `record.detail`
    /// is `None` then, and the row must not be rewritten from this value.
    pub detail_unreadable: bool,
}

fn stored_from_row(row: &Row<'_>) -> Result<StoredRecord, rusqlite::Error> {
    let id: String = row.get("id")?;
    let tags_json: String = row.get("tags")?;
    let detail_json: Option<String> = row.get("detail")?;

    let tags = serde_json::from_str(&tags_json).unwrap_or_else(|e| {
        log::warn!("Record {} has unreadable tags, ignoring them: {}", id, e);
        Vec::new()
    });
    let mut detail_unreadable = false;
    let detail = detail_json.and_then(|json| {
        serde_json::from_str::<WorkOrderDetail>(&json)
            .map_err(|e| {
                log::warn!("Record {} has unreadable detail: {}", id, e);
                detail_unreadable = true;
            })
            .ok()
    });

    let record = WorkOrderRecord {
        id,
        pdf_id: row.get("pdf_id")?,
        date: row.get("date")?,
        board: row.get("board")?,
        board_folded: row.get("board_folded")?,
        location: row.get("location")?,
        zone: row.get("zone")?,
        technician: row.get("technician")?,
        vehicle: row.get("vehicle")?,
        tags,
        favorite: row.get("favorite")?,
        sent: row.get("sent")?,
        reprint_count: row.get("reprint_count")?,
        pdf_bytes: row.get::<_, i64>("pdf_bytes")?.max(0) as u64,
        created_at: row.get("created_at")?,
        detail,
    };
    Ok(StoredRecord {
        record,
        detail_unreadable,
    })
}

fn record_from_row(row: &Row<'_>) -> Result<WorkOrderRecord, rusqlite::Error> {
    stored_from_row(row).map(|stored| stored.record)
}

fn encode_tags(tags: &[String]) -> Result<String, DatabaseError> {
    serde_json::to_string(tags).map_err(|source| DatabaseError::Json {
        column: "tags",
        source,
    })
}

fn encode_detail(detail: Option<&WorkOrderDetail>) -> Result<Option<String>, DatabaseError> {
    detail
        .map(serde_json::to_string)
        .transpose()
        .map_err(|source| DatabaseError::Json {
            column: "detail",
            source,
        })
}

impl<'a> RecordsTable<'a> {
    pub(crate) fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Inserts a new record row.
    pub fn insert(&self, record: &WorkOrderRecord) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO records (id, pdf_id, date, board, board_folded, location, zone,
             technician, vehicle, tags, favorite, sent, reprint_count, pdf_bytes,
             created_at, detail)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                record.id,
                record.pdf_id,
                record.date,
                record.board,
                record.board_folded,
                record.location,
                record.zone,
                record.technician,
                record.vehicle,
                encode_tags(&record.tags)?,
                record.favorite,
                record.sent,
                record.reprint_count,
                record.pdf_bytes as i64,
                record.created_at,
                encode_detail(record.detail.as_ref())?,
            ],
        )?;
        Ok(())
    }

    /// Overwrites every mutable column. `id`, `pdf_id` and `created_at` are fixed.
    pub fn update(&self, record: &WorkOrderRecord) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE records SET date=?2, board=?3, board_folded=?4, location=?5, zone=?6,
             technician=?7, vehicle=?8, tags=?9, favorite=?10, sent=?11, reprint_count=?12,
             pdf_bytes=?13, detail=?14
             WHERE id=?1",
            params![
                record.id,
                record.date,
                record.board,
                record.board_folded,
                record.location,
                record.zone,
                record.technician,
                record.vehicle,
                encode_tags(&record.tags)?,
                record.favorite,
                record.sent,
                record.reprint_count,
                record.pdf_bytes as i64,
                encode_detail(record.detail.as_ref())?,
            ],
        )?;
        Ok(changed > 0)
    }

    /// Writes only the local flags, leaving every other column as stored.
    pub fn update_flags(&self, record: &WorkOrderRecord) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE records SET favorite=?2, sent=?3, reprint_count=?4 WHERE id=?1",
            params![record.id, record.favorite, record.sent, record.reprint_count],
        )?;
        Ok(changed > 0)
    }

    /// Finds a record by its ID.
    pub fn find(&self, id: &str) -> Result<Option<WorkOrderRecord>, DatabaseError> {
        let record = self
            .conn
            .query_row(
                "SELECT * FROM records WHERE id = ?1",
                params![id],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// Deletes a record row. Returns whether a row existed.
    pub fn delete(&self, id: &str) -> Result<bool, DatabaseError> {
        let count = self
            .conn
            .execute("DELETE FROM records WHERE id = ?1", params![id])?;
        Ok(count > 0)
    }

    /// Lists records matching the scan, newest first.
    ///
    /// Records without a date are kept regardless of the date range.
    pub fn scan(&self, scan: &RecordScan) -> Result<Vec<WorkOrderRecord>, DatabaseError> {
        let mut conditions = Vec::new();
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(ref from) = scan.date_from {
            conditions.push(format!(
                "(date = '' OR date >= ?{})",
                param_values.len() + 1
            ));
            param_values.push(Box::new(from.clone()));
        }
        if let Some(ref to) = scan.date_to {
            conditions.push(format!(
                "(date = '' OR date <= ?{})",
                param_values.len() + 1
            ));
            param_values.push(Box::new(to.clone()));
        }
        if let Some(favorite) = scan.favorite {
            conditions.push(format!("favorite = ?{}", param_values.len() + 1));
            param_values.push(Box::new(favorite));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let sql = format!(
            "SELECT * FROM records {} ORDER BY created_at DESC",
            where_clause
        );
        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_ref.as_slice(), record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Every row, newest first, flagged when its detail does not decode.
    pub fn scan_stored(&self) -> Result<Vec<StoredRecord>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM records ORDER BY created_at DESC")?;
        let rows = stmt
            .query_map([], stored_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Finds records whose case-folded board equals `folded`, newest first.
    pub fn find_by_board(&self, folded: &str) -> Result<Vec<WorkOrderRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT * FROM records WHERE board_folded = ?1 ORDER BY created_at DESC",
        )?;
        let rows = stmt
            .query_map(params![folded], record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Highest creation timestamp in the table.
    pub fn max_created_at(&self) -> Result<Option<i64>, DatabaseError> {
        let max: Option<i64> =
            self.conn
                .query_row("SELECT MAX(created_at) FROM records", [], |r| r.get(0))?;
        Ok(max)
    }

    /// Returns `(record count, sum of pdf bytes)`.
    pub fn totals(&self) -> Result<(u64, u64), DatabaseError> {
        let (count, bytes): (i64, i64) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(pdf_bytes), 0) FROM records",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;
        Ok((count.max(0) as u64, bytes.max(0) as u64))
    }
}
