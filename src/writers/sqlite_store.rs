use crate::error::Result;
use crate::utils::constants::BUSY_TIMEOUT_MS;
use rusqlite::{Connection, OpenFlags, Transaction};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Schema shared with the viewer. Column names and types are a stable contract.
pub const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS locations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    );

    CREATE TABLE IF NOT EXISTS temperatures (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        location_id INTEGER NOT NULL REFERENCES locations(id),
        data_time TEXT,
        temperature REAL NOT NULL,
        unit TEXT,
        source_element TEXT,
        UNIQUE(location_id, data_time, source_element)
    );
";

/// Row counts of the two tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub locations: usize,
    pub temperatures: usize,
}

/// One connection to the temperature database, scoped to a single command.
///
/// The connection is closed when the store is dropped, on every exit path.
pub struct TemperatureStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl TemperatureStore {
    /// Open (creating if needed) a database for writing.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "Opened temperature store");
        Self::configure(conn, Some(path.to_path_buf()))
    }

    /// Open an existing database without write access.
    pub fn open_read_only(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Self::configure(conn, Some(path.to_path_buf()))
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure(conn, None)
    }

    fn configure(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS))?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(Self { conn, path })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Start the transaction that wraps one whole ingestion pass.
    ///
    /// Dropping the transaction without committing rolls everything back.
    pub fn transaction(&mut self) -> Result<Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }

    pub fn ensure_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    pub fn has_schema(&self) -> Result<bool> {
        let tables: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master
             WHERE type = 'table' AND name IN ('locations', 'temperatures')",
            [],
            |row| row.get(0),
        )?;
        Ok(tables == 2)
    }

    pub fn counts(&self) -> Result<StoreCounts> {
        if !self.has_schema()? {
            return Ok(StoreCounts::default());
        }

        let locations: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM locations", [], |row| row.get(0))?;
        let temperatures: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM temperatures", [], |row| row.get(0))?;

        Ok(StoreCounts {
            locations: locations as usize,
            temperatures: temperatures as usize,
        })
    }
}
