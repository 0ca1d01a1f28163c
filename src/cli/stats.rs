use anyhow::Result;

use crate::config::AuraConfig;
use crate::journal::types::Emotion;

/// Display journal statistics in the terminal.
pub fn stats(config: &AuraConfig) -> Result<()> {
    let conn = crate::db::open_database(config.resolved_db_path())?;
    let records = crate::journal::store::load_records(&conn)?;

    let response = crate::journal::stats::journal_stats(&records);

    println!("Journal Statistics");
    println!("{}", "=".repeat(40));
    println!("  Total entries:       {}", response.total_entries);
    println!("  Analyzed:            {}", response.analyzed_entries);
    println!("  With image:          {}", response.with_image);
    println!("  With location:       {}", response.with_location);
    println!("  Longest streak:      {} days", response.longest_streak);
    println!();

    println!("By Emotion:");
    for emotion in Emotion::ALL {
        let count = response.by_emotion.get(emotion.as_str()).copied().unwrap_or(0);
        println!("  {} {:<12} {}", emotion.emoji(), emotion.as_str(), count);
    }
    println!();

    if let Some(ref oldest) = response.oldest_entry {
        println!("Oldest entry:          {oldest}");
    }
    if let Some(ref newest) = response.newest_entry {
        println!("Newest entry:          {newest}");
    }

    Ok(())
}
