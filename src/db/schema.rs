//! SQL DDL for all Aura tables.
//!
//! Defines the `kv_store` slot table (the journal collection lives under a
//! single key), the `entry_log` audit table, and `schema_meta`. All DDL uses
//! `IF NOT EXISTS` for idempotent initialization.

use rusqlite::Connection;

use super::migrations::CURRENT_SCHEMA_VERSION;

const SCHEMA_SQL: &str = r#"
-- Durable key-value slots
CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Audit log
CREATE TABLE IF NOT EXISTS entry_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    operation TEXT NOT NULL CHECK(operation IN ('create','update','import','migrate')),
    entry_id TEXT NOT NULL,
    details TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_entry_log_entry ON entry_log(entry_id);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
///
/// An empty database is stamped with the current schema version. One that
/// already holds `kv_store` slots but no version is stamped v1, so the
/// migrations inspect its data.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) \
         SELECT 'schema_version', CASE WHEN EXISTS (SELECT 1 FROM kv_store) THEN '1' ELSE ?1 END",
        [CURRENT_SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}
