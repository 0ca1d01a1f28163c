//! Forward-only schema migration framework.
//!
//! Tracks the schema version in `schema_meta` and runs sequential migrations
//! to bring the database up to [`CURRENT_SCHEMA_VERSION`].

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::journal::store;

/// The schema version that the current binary expects.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Get the current schema version from the database.
pub fn get_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT value FROM schema_meta WHERE key = 'schema_version'",
        [],
        |row| {
            let val: String = row.get(0)?;
            Ok(val.parse::<u32>().unwrap_or(0))
        },
    )
}

fn update_schema_version(conn: &Connection, version: u32) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE schema_meta SET value = ?1 WHERE key = 'schema_version'",
        [version.to_string()],
    )?;
    Ok(())
}

/// Run any pending forward-only migrations. Each migration runs in a transaction.
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let mut version = get_schema_version(conn)?;
    tracing::debug!(schema_version = version, target = CURRENT_SCHEMA_VERSION, "checking migrations");

    while version < CURRENT_SCHEMA_VERSION {
        let next = version + 1;
        tracing::info!(from = version, to = next, "running migration");

        let tx = conn.transaction()?;
        match next {
            2 => migrate_v1_to_v2(&tx).context("migration v1 -> v2 failed")?,
            _ => {
                tracing::error!(version = next, "unknown migration target");
                break;
            }
        }
        update_schema_version(&tx, next)?;
        tx.commit()?;

        version = next;
    }

    Ok(())
}

/// Migration v1 → v2: rewrite legacy records (timestamp ids, `date` field,
/// several entries per day) into date-keyed records.
///
/// Only runs for databases stamped v1: those created before v2 existed, or
/// ones whose `kv_store` already held data when the schema was first
/// initialized. Fresh databases start at v2.
fn migrate_v1_to_v2(conn: &Connection) -> Result<()> {
    let Some(raw) = store::load_raw(conn)? else {
        return Ok(());
    };

    let values: Vec<serde_json::Value> =
        serde_json::from_str(&raw).context("stored journal entries are not a JSON array")?;
    let normalized = store::normalize_legacy(values);

    if normalized.reshaped == 0 && normalized.merged == 0 && normalized.dropped == 0 {
        return Ok(());
    }

    store::save_records(conn, &normalized.records)?;
    store::write_audit_log(
        conn,
        "migrate",
        store::ENTRIES_KEY,
        Some(&serde_json::json!({
            "reshaped": normalized.reshaped,
            "merged": normalized.merged,
            "dropped": normalized.dropped,
        })),
    )?;

    tracing::info!(
        records = normalized.records.len(),
        reshaped = normalized.reshaped,
        merged = normalized.merged,
        "legacy journal entries migrated"
    );
    Ok(())
}
