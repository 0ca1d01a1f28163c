use anyhow::Result;

use crate::config::AuraConfig;
use crate::journal::store::{self, ExportData};

/// Export all entries as JSON to stdout.
pub fn export(config: &AuraConfig) -> Result<()> {
    let conn = crate::db::open_database(config.resolved_db_path())?;

    let data = ExportData {
        entries: store::load_records(&conn)?,
    };

    let json = serde_json::to_string_pretty(&data)?;
    println!("{json}");

    eprintln!("Exported {} entries.", data.entries.len());

    Ok(())
}
