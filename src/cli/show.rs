//! CLI `list` and `show` commands.

use anyhow::{Context, Result};

use crate::config::AuraConfig;
use crate::journal::store;
use crate::journal::types::date_key;

const PREVIEW_CHARS: usize = 60;

/// List the most recent entries, one line each.
pub fn list(config: &AuraConfig, limit: usize) -> Result<()> {
    let conn = crate::db::open_database(config.resolved_db_path())?;
    let records = store::load_records(&conn)?;

    if records.is_empty() {
        println!("No entries yet. Start with `aura write` or `aura edit`.");
        return Ok(());
    }

    for record in records.iter().take(limit) {
        let marker = record
            .emotion()
            .map(|e| e.emoji())
            .unwrap_or("·");
        println!("{}  {}  {}", record.id, marker, preview(&record.content));
    }
    if records.len() > limit {
        println!("... and {} older entries", records.len() - limit);
    }

    Ok(())
}

/// Display one day's entry in full.
pub fn show(config: &AuraConfig, date: &str) -> Result<()> {
    let date = super::resolve_date(Some(date))?;
    let conn = crate::db::open_database(config.resolved_db_path())?;
    let records = store::load_records(&conn)?;

    let key = date_key(date);
    let record = store::find_record(&records, &key)
        .with_context(|| format!("no entry for {key}"))?;
    super::print_record(record);

    Ok(())
}

fn preview(content: &str) -> String {
    let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= PREVIEW_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_flattens_and_truncates() {
        assert_eq!(preview("one\ntwo   three"), "one two three");
        let long = "word ".repeat(30);
        let p = preview(&long);
        assert!(p.ends_with("..."));
        assert_eq!(p.chars().count(), 62);
    }
}
