use anyhow::{Context, Result};
use std::path::Path;

use crate::config::AuraConfig;
use crate::journal::store::{self, Normalized};

/// Import entries from a JSON file.
///
/// Accepts the `export` format or a bare array as kept by older clients, whose
/// records are brought into the day-keyed shape first. Days that already have
/// an entry are skipped.
pub fn import(config: &AuraConfig, file: &Path) -> Result<()> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read import file: {}", file.display()))?;

    let values = store::parse_import(&json)?;
    let Normalized {
        records: incoming,
        reshaped,
        merged,
        dropped,
    } = store::normalize_legacy(values);

    let mut conn = crate::db::open_database(config.resolved_db_path())?;
    let mut records = store::load_records(&conn)?;

    println!("Importing {} entries...", incoming.len());

    let new_ids: Vec<String> = incoming
        .iter()
        .filter(|r| store::find_record(&records, &r.id).is_none())
        .map(|r| r.id.clone())
        .collect();
    let summary = store::merge_imported(&mut records, incoming);

    if summary.imported > 0 {
        let tx = conn.transaction()?;
        store::save_records(&tx, &records)?;
        for id in &new_ids {
            store::write_audit_log(&tx, "import", id, None)?;
        }
        tx.commit()?;
    }

    println!("Import complete:");
    println!("  Entries imported:  {}", summary.imported);
    println!("  Entries skipped:   {} (day already has an entry)", summary.skipped);
    if reshaped > 0 || merged > 0 {
        println!("  Legacy records:    {reshaped} re-keyed, {merged} merged into their day");
    }
    if dropped > 0 {
        println!("  Unreadable:        {dropped}");
    }

    Ok(())
}
