//! SQLite persistence for variants, targets, effects and gene annotations.
//!
//! Every entity has a small repository module of free functions taking a
//! `&Connection`; [`Database`] owns the connection and hands it out one
//! caller at a time.

pub mod effects;
pub mod genes;
pub mod import_log;
pub mod schema;
pub mod targets;
pub mod transcripts;
pub mod variants;

use parking_lot::{Mutex, MutexGuard};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;

pub use import_log::{ImportRecord, ImportStatus};
pub use schema::{init_schema, missing_tables};
pub use variants::{SortField, SortOrder, VariantFilter};

/// Shared handle to the database connection.
///
/// Cloning is cheap; all clones share the same connection. The guard
/// returned by [`Database::connection`] releases it when dropped.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) a database file and make sure the schema exists.
    pub fn open<P: AsRef<Path>>(path: P) -> rusqlite::Result<Self> {
        let db = Self::connect(path)?;
        init_schema(&db.connection())?;
        Ok(db)
    }

    /// Open a database file without touching the schema.
    pub fn connect<P: AsRef<Path>>(path: P) -> rusqlite::Result<Self> {
        let conn = Connection::open(path)?;

        // WAL lets readers proceed while an import is writing
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA temp_store=memory;",
        )?;

        Ok(Self::from_connection(conn))
    }

    /// Create an in-memory database with the schema applied.
    pub fn in_memory() -> rusqlite::Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Acquire the connection for the duration of the returned guard.
    pub fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }

    /// Trivial round-trip used by health checks.
    pub fn ping(&self) -> rusqlite::Result<()> {
        self.connection()
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map(|_| ())
    }
}

/// Row counts reported by `/stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub variants: i64,
    pub targets: i64,
    pub effects: i64,
}

/// Count variants, targets and effects.
pub fn counts(conn: &Connection) -> rusqlite::Result<Counts> {
    Ok(Counts {
        variants: variants::count(conn)?,
        targets: targets::count(conn)?,
        effects: effects::count(conn)?,
    })
}
