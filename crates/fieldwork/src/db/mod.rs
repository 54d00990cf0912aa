//! Database module for durable local storage.
//!
//! Uses rusqlite (SQLite) with a thread-safe `Database` handle.
//! All access is serialized through a `Mutex<Connection>`; multi-table
//! writes go through a [`UnitOfWork`] so they commit or roll back together.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::{Connection, TransactionBehavior};

pub mod blobs;
pub mod drafts;
pub mod error;
pub mod migrations;
pub mod pending;
pub mod photos;
pub mod records;
mod unit_of_work;

pub use error::DatabaseError;
pub use unit_of_work::UnitOfWork;

/// The named collections a unit of work can span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Records,
    Blobs,
    Photos,
    Pending,
    Drafts,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Records => "records",
            Collection::Blobs => "blobs",
            Collection::Photos => "photos",
            Collection::Pending => "pending_items",
            Collection::Drafts => "drafts",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thread-safe database handle wrapping a single rusqlite connection.
///
/// Cloning is cheap (inner `Arc`). The device is the only writer, so one
/// serialized connection is enough. WAL mode is enabled for on-disk files.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens (or creates) the database at the given path and runs all
    /// pending migrations.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

        migrations::run_all(&conn)?;

        log::info!("Database opened at {}", path.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory database for testing. Runs all migrations.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        migrations::run_all(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Provides locked access to the underlying connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError>,
    {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        f(&conn)
    }

    /// Runs `f` inside one SQLite transaction scoped to `scope`.
    ///
    /// The transaction commits only if `f` returns `Ok`. Any error, including
    /// a domain error raised by `f` itself, rolls back every write made
    /// through the unit of work.
    pub fn unit_of_work<F, T, E>(&self, scope: &[Collection], f: F) -> Result<T, E>
    where
        F: FnOnce(&UnitOfWork<'_>) -> Result<T, E>,
        E: From<DatabaseError>,
    {
        let mut conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(DatabaseError::from)?;

        let uow = UnitOfWork::new(tx, scope);
        let value = f(&uow)?;
        uow.commit()?;
        Ok(value)
    }
}

/// Returns the canonical database path: `~/.fieldwork/data/fieldwork.db`.
pub fn default_database_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".fieldwork").join("data").join("fieldwork.db"))
}
