//! CLI `doctor` command: run database diagnostics and print a health report.

use anyhow::{Context, Result};

use crate::config::AuraConfig;
use crate::db;

/// Run database diagnostics and print a health report.
pub fn doctor(config: &AuraConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    if !db_path.exists() {
        println!("Database: not found at {}", db_path.display());
        println!("Run `aura write` or `aura edit` to create it.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&db_path)
        .map(|m| m.len())
        .unwrap_or(0);

    let conn = db::open_database(&db_path)
        .context("failed to open database (may be corrupt)")?;

    let report = db::check_database_health(&conn)
        .context("failed to run health check")?;

    let key_set = std::env::var(&config.insight.api_key_env)
        .map(|k| !k.trim().is_empty())
        .unwrap_or(false);

    println!("Aura Health Report");
    println!("==================");
    println!();
    println!("Database:          {}", db_path.display());
    println!("File size:         {}", format_bytes(file_size));
    println!("Schema version:    {}", report.schema_version);
    println!();
    println!("Insight service:");
    println!("  Provider:        {}", config.insight.provider);
    println!("  Model:           {}", config.insight.model);
    if key_set {
        println!("  API key:         {} is set", config.insight.api_key_env);
    } else {
        println!("  WARNING: {} is not set, entries cannot be analyzed.", config.insight.api_key_env);
    }
    println!();
    println!("Contents:");
    println!("  Entries:         {}", report.entry_count);
    println!("  Stored JSON:     {}", format_bytes(report.collection_bytes));
    println!("  Audit log:       {}", report.log_count);
    println!();
    if report.integrity_ok {
        println!("Integrity check:   PASSED");
    } else {
        println!("Integrity check:   FAILED ({})", report.integrity_details);
    }

    if !report.integrity_ok {
        println!();
        println!("Recovery steps:");
        println!("  1. Restore from a backup: cp backup.db ~/.aura/journal.db");
        println!("  2. Or export from a good copy and reimport:");
        println!("     aura export > backup.json");
        println!("     aura import backup.json");
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_formatting() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
