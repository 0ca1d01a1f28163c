pub mod migrations;
pub mod schema;

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

/// Open (or create) the Aura database at the given path with the schema
/// initialized and migrations applied.
pub fn open_database(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let mut conn = Connection::open(path)
        .with_context(|| format!("failed to open database at {}", path.display()))?;

    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.busy_timeout(Duration::from_secs(5))?;

    schema::init_schema(&conn).context("failed to initialize schema")?;
    migrations::run_migrations(&mut conn).context("failed to run migrations")?;

    tracing::info!(path = %path.display(), "database initialized");
    Ok(conn)
}

/// Result of [`check_database_health`].
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub schema_version: u32,
    pub integrity_ok: bool,
    pub integrity_details: String,
    pub entry_count: u64,
    pub log_count: u64,
    /// Size of the stored collection JSON.
    pub collection_bytes: u64,
}

/// Run `PRAGMA integrity_check` and gather row counts.
pub fn check_database_health(conn: &Connection) -> Result<HealthReport> {
    let schema_version = migrations::get_schema_version(conn)?;

    let integrity: String = conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
    let integrity_ok = integrity == "ok";

    let log_count: i64 = conn.query_row("SELECT COUNT(*) FROM entry_log", [], |row| row.get(0))?;

    let raw = crate::journal::store::load_raw(conn)?;
    let collection_bytes = raw.as_ref().map(|r| r.len() as u64).unwrap_or(0);
    let entry_count = crate::journal::store::load_records(conn)
        .context("stored journal entries are unreadable")?
        .len() as u64;

    Ok(HealthReport {
        schema_version,
        integrity_ok,
        integrity_details: integrity,
        entry_count,
        log_count: log_count as u64,
        collection_bytes,
    })
}
