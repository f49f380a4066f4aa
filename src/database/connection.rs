//! SQLite connection for AstroLab's on-device state.

use rusqlite::Connection;
use std::path::Path;

use super::migrations;

/// On-device database. Owned by the application root; the favorites store
/// reaches it only through [`super::KeyValueStorage`].
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens or creates the database file, then migrates it.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        Self::prepare(conn)
    }

    /// Throwaway database for tests; gone when dropped.
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        Self::prepare(Connection::open_in_memory()?)
    }

    fn prepare(conn: Connection) -> Result<Self, rusqlite::Error> {
        conn.busy_timeout(std::time::Duration::from_secs(2))?;
        migrations::run_all(&conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}
