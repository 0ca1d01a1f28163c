//! Persistence for the journal collection.
//!
//! The whole collection is one JSON array stored under [`ENTRIES_KEY`] in the
//! `kv_store` table, read on load and rewritten on every save. Also holds the
//! helpers that keep the collection keyed and ordered: [`upsert_record`],
//! [`normalize_legacy`] for records written by older clients, and
//! [`merge_imported`].

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::types::{date_key, parse_date_key, Analysis, JournalRecord, Location};

/// Fixed key of the journal collection slot.
pub const ENTRIES_KEY: &str = "journal-entries";

/// Read the raw value of a `kv_store` slot, if any.
pub fn load_slot(conn: &Connection, key: &str) -> Result<Option<String>> {
    let raw = conn
        .query_row(
            "SELECT value FROM kv_store WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(raw)
}

/// Overwrite a `kv_store` slot.
pub fn save_slot(conn: &Connection, key: &str, value: &str) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value, now],
    )?;
    Ok(())
}

/// Read the raw stored collection, if any.
pub fn load_raw(conn: &Connection) -> Result<Option<String>> {
    load_slot(conn, ENTRIES_KEY)
}

/// Load the collection, newest first. A missing slot is an empty journal.
pub fn load_records(conn: &Connection) -> Result<Vec<JournalRecord>> {
    let Some(raw) = load_raw(conn)? else {
        return Ok(Vec::new());
    };
    let mut records: Vec<JournalRecord> =
        serde_json::from_str(&raw).context("failed to parse stored journal entries")?;
    sort_newest_first(&mut records);
    Ok(records)
}

/// Overwrite the stored collection.
pub fn save_records(conn: &Connection, records: &[JournalRecord]) -> Result<()> {
    let json = serde_json::to_string(records)?;
    save_slot(conn, ENTRIES_KEY, &json)
}

/// Save the collection and log the change to one entry atomically.
pub fn commit_entry(
    conn: &mut Connection,
    records: &[JournalRecord],
    operation: &str,
    entry_id: &str,
    details: Option<&serde_json::Value>,
) -> Result<()> {
    let tx = conn.transaction()?;
    save_records(&tx, records)?;
    write_audit_log(&tx, operation, entry_id, details)?;
    tx.commit()?;
    Ok(())
}

/// Write an entry to the entry_log audit table.
pub fn write_audit_log(
    conn: &Connection,
    operation: &str,
    entry_id: &str,
    details: Option<&serde_json::Value>,
) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    let details_json = details.map(|d| d.to_string());
    conn.execute(
        "INSERT INTO entry_log (operation, entry_id, details, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![operation, entry_id, details_json, now],
    )?;
    Ok(())
}

pub fn find_record<'a>(records: &'a [JournalRecord], key: &str) -> Option<&'a JournalRecord> {
    records.iter().find(|r| r.id == key)
}

/// Descending date key order.
pub fn sort_newest_first(records: &mut [JournalRecord]) {
    records.sort_by(|a, b| b.id.cmp(&a.id));
}

/// Replace the record with the same key in place, or insert it at its
/// newest-first position. Returns `true` when an existing record was replaced.
pub fn upsert_record(records: &mut Vec<JournalRecord>, record: JournalRecord) -> bool {
    if let Some(slot) = records.iter_mut().find(|r| r.id == record.id) {
        *slot = record;
        return true;
    }
    let pos = records
        .iter()
        .position(|r| r.id < record.id)
        .unwrap_or(records.len());
    records.insert(pos, record);
    false
}

/// Counts from [`merge_imported`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

/// Add incoming records whose day is not in the journal yet.
pub fn merge_imported(records: &mut Vec<JournalRecord>, incoming: Vec<JournalRecord>) -> ImportSummary {
    let mut summary = ImportSummary::default();
    for record in incoming {
        if find_record(records, &record.id).is_some() {
            summary.skipped += 1;
            continue;
        }
        upsert_record(records, record);
        summary.imported += 1;
    }
    summary
}

/// Export document written by `aura export`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExportData {
    pub entries: Vec<JournalRecord>,
}

/// Parse an import file: either an [`ExportData`] document or a bare array of
/// records as kept by older clients.
pub fn parse_import(json: &str) -> Result<Vec<serde_json::Value>> {
    let value: serde_json::Value = serde_json::from_str(json).context("import file is not JSON")?;
    match value {
        serde_json::Value::Array(items) => Ok(items),
        serde_json::Value::Object(mut obj) => match obj.remove("entries") {
            Some(serde_json::Value::Array(items)) => Ok(items),
            _ => anyhow::bail!("import object has no `entries` array"),
        },
        _ => anyhow::bail!("import file must be an array or an object with `entries`"),
    }
}

/// Result of [`normalize_legacy`].
#[derive(Debug, Default)]
pub struct Normalized {
    /// Date-keyed records, newest first.
    pub records: Vec<JournalRecord>,
    /// Records whose key or timestamp had to be derived.
    pub reshaped: usize,
    /// Records folded into another record of the same day.
    pub merged: usize,
    /// Values that could not be placed on any day.
    pub dropped: usize,
}

/// Loose view of a stored record, covering the older shape where `id` was the
/// full creation instant and the instant lived in `date`.
#[derive(Debug, Deserialize)]
struct LooseRecord {
    id: Option<String>,
    timestamp: Option<String>,
    date: Option<String>,
    #[serde(default)]
    content: String,
    image: Option<String>,
    location: Option<Location>,
    analysis: Option<Analysis>,
}

/// Bring arbitrary stored values into the current record shape.
///
/// Keys are derived from the UTC day of the record's instant. Several records
/// on the same day are folded into one: contents are joined oldest first, and
/// the newest record's analysis, image and location win.
pub fn normalize_legacy(values: Vec<serde_json::Value>) -> Normalized {
    let mut out = Normalized::default();
    let mut by_day: BTreeMap<String, Vec<(DateTime<Utc>, LooseRecord)>> = BTreeMap::new();

    for value in values {
        let Ok(loose) = serde_json::from_value::<LooseRecord>(value) else {
            out.dropped += 1;
            continue;
        };

        let keyed = loose.id.as_deref().and_then(parse_date_key);
        let instant = [loose.timestamp.as_deref(), loose.date.as_deref(), loose.id.as_deref()]
            .into_iter()
            .flatten()
            .find_map(parse_instant);

        let (key, instant) = match (keyed, instant) {
            (Some(day), Some(at)) => (date_key(day), at),
            (Some(day), None) => (date_key(day), start_of_day(day)),
            (None, Some(at)) => (date_key(at.date_naive()), at),
            (None, None) => {
                out.dropped += 1;
                continue;
            }
        };

        if keyed.is_none() || loose.timestamp.is_none() {
            out.reshaped += 1;
        }
        by_day.entry(key).or_default().push((instant, loose));
    }

    for (key, mut group) in by_day {
        group.sort_by_key(|(at, _)| *at);
        out.merged += group.len() - 1;

        let newest_at = group.last().map(|(at, _)| *at).unwrap_or_else(Utc::now);
        let content = if group.len() == 1 {
            group[0].1.content.clone()
        } else {
            group
                .iter()
                .map(|(_, r)| r.content.trim_end())
                .filter(|c| !c.is_empty())
                .collect::<Vec<_>>()
                .join("\n\n")
        };
        let image = group.iter().rev().find_map(|(_, r)| r.image.clone());
        let location = group.iter().rev().find_map(|(_, r)| r.location);
        let analysis = group.iter().rev().find_map(|(_, r)| r.analysis.clone());

        out.records.push(JournalRecord {
            id: key,
            timestamp: newest_at.to_rfc3339(),
            content,
            image,
            location,
            analysis,
        });
    }

    sort_newest_first(&mut out.records);
    out
}

fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn start_of_day(day: chrono::NaiveDate) -> DateTime<Utc> {
    day.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::types::Emotion;

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::schema::init_schema(&conn).unwrap();
        conn
    }

    fn record(id: &str, content: &str) -> JournalRecord {
        JournalRecord {
            id: id.into(),
            timestamp: format!("{id}T09:00:00+00:00"),
            content: content.into(),
            image: None,
            location: None,
            analysis: None,
        }
    }

    #[test]
    fn empty_store_loads_no_records() {
        let conn = test_db();
        assert!(load_records(&conn).unwrap().is_empty());
    }

    #[test]
    fn save_then_load_round_trips_and_sorts() {
        let conn = test_db();
        let records = vec![record("2024-01-01", "first"), record("2024-02-10", "later")];
        save_records(&conn, &records).unwrap();

        let loaded = load_records(&conn).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, "2024-02-10");
        assert_eq!(loaded[1].content, "first");
    }

    #[test]
    fn save_overwrites_single_slot() {
        let conn = test_db();
        save_records(&conn, &[record("2024-01-01", "a")]).unwrap();
        save_records(&conn, &[record("2024-01-01", "b")]).unwrap();

        let slots: i64 = conn
            .query_row("SELECT COUNT(*) FROM kv_store", [], |row| row.get(0))
            .unwrap();
        assert_eq!(slots, 1);
        assert_eq!(load_records(&conn).unwrap()[0].content, "b");
    }

    #[test]
    fn commit_entry_writes_audit_log() {
        let mut conn = test_db();
        commit_entry(
            &mut conn,
            &[record("2024-01-01", "a")],
            "create",
            "2024-01-01",
            Some(&serde_json::json!({"analyzed": true})),
        )
        .unwrap();

        let (op, entry_id, details): (String, String, String) = conn
            .query_row(
                "SELECT operation, entry_id, details FROM entry_log",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(op, "create");
        assert_eq!(entry_id, "2024-01-01");
        assert!(details.contains("analyzed"));
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut records = vec![
            record("2024-01-03", "c"),
            record("2024-01-02", "b"),
            record("2024-01-01", "a"),
        ];
        let replaced = upsert_record(&mut records, record("2024-01-02", "B"));
        assert!(replaced);
        assert_eq!(records[1].content, "B");
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn upsert_inserts_in_descending_order() {
        let mut records = vec![record("2024-01-05", "e"), record("2024-01-01", "a")];
        assert!(!upsert_record(&mut records, record("2024-01-03", "c")));
        assert!(!upsert_record(&mut records, record("2024-01-09", "i")));
        assert!(!upsert_record(&mut records, record("2023-12-31", "z")));

        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["2024-01-09", "2024-01-05", "2024-01-03", "2024-01-01", "2023-12-31"]
        );
    }

    #[test]
    fn merge_imported_skips_existing_days() {
        let mut records = vec![record("2024-01-01", "mine")];
        let summary = merge_imported(
            &mut records,
            vec![record("2024-01-01", "theirs"), record("2024-01-02", "new")],
        );
        assert_eq!(summary, ImportSummary { imported: 1, skipped: 1 });
        assert_eq!(find_record(&records, "2024-01-01").unwrap().content, "mine");
        assert_eq!(records[0].id, "2024-01-02");
    }

    #[test]
    fn parse_import_accepts_both_shapes() {
        assert_eq!(parse_import(r#"[{"id":"2024-01-01"}]"#).unwrap().len(), 1);
        assert_eq!(
            parse_import(r#"{"entries":[{"id":"2024-01-01"},{"id":"2024-01-02"}]}"#)
                .unwrap()
                .len(),
            2
        );
        assert!(parse_import(r#"{"memories":[]}"#).is_err());
        assert!(parse_import("42").is_err());
    }

    #[test]
    fn normalize_keeps_current_records_untouched() {
        let current = serde_json::to_value(record("2024-05-05", "today")).unwrap();
        let normalized = normalize_legacy(vec![current]);
        assert_eq!(normalized.reshaped, 0);
        assert_eq!(normalized.merged, 0);
        assert_eq!(normalized.records, vec![record("2024-05-05", "today")]);
    }

    #[test]
    fn normalize_folds_same_day_records() {
        let values = vec![
            serde_json::json!({"id": "2024-01-01T20:00:00Z", "date": "2024-01-01T20:00:00Z", "content": "night",
                "analysis": {"emotion": "Gratitude", "summary": "s", "suggestions": []}}),
            serde_json::json!({"id": "2024-01-01T08:00:00Z", "date": "2024-01-01T08:00:00Z", "content": "morning",
                "analysis": {"emotion": "Fear", "summary": "s", "suggestions": []}}),
            serde_json::json!({"content": "no date at all"}),
        ];
        let normalized = normalize_legacy(values);
        assert_eq!(normalized.records.len(), 1);
        assert_eq!(normalized.merged, 1);
        assert_eq!(normalized.dropped, 1);
        assert_eq!(normalized.reshaped, 2);

        let day = &normalized.records[0];
        assert_eq!(day.id, "2024-01-01");
        assert_eq!(day.content, "morning\n\nnight");
        assert_eq!(day.emotion(), Some(Emotion::Gratitude));
    }
}
