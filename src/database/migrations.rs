//! Schema migrations for the AstroLab SQLite database.
//!
//! Applied steps are recorded in `schema_version`; each step runs in its own
//! transaction together with its version row.

use rusqlite::{params, Connection};

/// A schema step: version, description, SQL.
type Migration = (i32, &'static str, &'static str);

const MIGRATIONS: &[Migration] = &[(
    1,
    "Key-value store for local-first snapshots",
    "CREATE TABLE IF NOT EXISTS kv_store (
         key TEXT PRIMARY KEY,
         value TEXT NOT NULL,
         updated_at INTEGER NOT NULL
     );",
)];

/// Highest version in the migration list.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Version of the newest applied step, 0 on a fresh database.
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT IFNULL(MAX(version), 0) FROM schema_version", [], |row| row.get(0))
        .unwrap_or(0)
}

/// Brings the schema up to [`CURRENT_SCHEMA_VERSION`]. Idempotent.
pub fn run_all(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
             version INTEGER PRIMARY KEY,
             applied_at INTEGER NOT NULL,
             description TEXT NOT NULL
         );",
    )?;

    let applied = get_schema_version(conn);
    for (version, description, sql) in MIGRATIONS.iter().filter(|(v, _, _)| *v > applied) {
        let applied_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64;

        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(sql)?;
        tx.execute(
            "INSERT INTO schema_version (version, applied_at, description) VALUES (?1, ?2, ?3)",
            params![version, applied_at, description],
        )?;
        tx.commit()?;
        tracing::debug!(version, "schema migration applied");
    }

    Ok(())
}
