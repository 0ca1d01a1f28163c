use serde::Serialize;
use std::collections::BTreeMap;

use super::types::JournalRecord;

/// Aggregate view of the journal.
#[derive(Debug, Default, Serialize)]
pub struct JournalStats {
    pub total_entries: u64,
    pub analyzed_entries: u64,
    pub with_image: u64,
    pub with_location: u64,
    pub by_emotion: BTreeMap<String, u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_entry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_entry: Option<String>,
    /// Longest run of consecutive days with an entry.
    pub longest_streak: u64,
}

/// Compute journal statistics over `records` in any order.
pub fn journal_stats(records: &[JournalRecord]) -> JournalStats {
    let mut stats = JournalStats {
        total_entries: records.len() as u64,
        ..Default::default()
    };

    for record in records {
        if let Some(emotion) = record.emotion() {
            stats.analyzed_entries += 1;
            *stats.by_emotion.entry(emotion.to_string()).or_insert(0) += 1;
        }
        if record.image.is_some() {
            stats.with_image += 1;
        }
        if record.location.is_some() {
            stats.with_location += 1;
        }
    }

    stats.oldest_entry = records.iter().map(|r| &r.id).min().cloned();
    stats.newest_entry = records.iter().map(|r| &r.id).max().cloned();
    stats.longest_streak = longest_streak(records);
    stats
}

fn longest_streak(records: &[JournalRecord]) -> u64 {
    let mut days: Vec<_> = records.iter().filter_map(JournalRecord::date).collect();
    days.sort_unstable();
    days.dedup();

    let mut best = 0;
    let mut run = 0;
    let mut previous = None;
    for day in days {
        run = match previous {
            Some(prev) if day.pred_opt() == Some(prev) => run + 1,
            _ => 1,
        };
        best = best.max(run);
        previous = Some(day);
    }
    best
}
