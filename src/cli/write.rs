//! CLI `write` command: one reconciliation pass for a day.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

use crate::config::AuraConfig;
use crate::journal::reconcile::{self, RecordAction};
use crate::journal::store;
use crate::journal::types::{date_key, Draft, Location};

/// Save `text` as the entry of the given day. The day's stored image and
/// location are kept unless replaced.
pub async fn write(
    config: &AuraConfig,
    date: Option<&str>,
    image: Option<&Path>,
    location: Option<Location>,
    text: &str,
) -> Result<()> {
    let date = super::resolve_date(date)?;
    let db_path = config.resolved_db_path();
    let mut conn = crate::db::open_database(&db_path)?;
    let mut records = store::load_records(&conn)?;

    let mut draft = store::find_record(&records, &date_key(date))
        .map(Draft::from_record)
        .unwrap_or_default();
    draft.content = text.to_string();
    if let Some(path) = image {
        draft.image = Some(super::read_image(path)?);
    }
    if location.is_some() {
        draft.location = location;
    }

    let insight = super::open_insight(config)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner} {msg}")?);
    pb.set_message("Reflecting on your entry...");
    pb.enable_steady_tick(Duration::from_millis(100));

    let outcome = reconcile::reconcile(&draft, date, &mut records, insight.as_ref()).await;
    pb.finish_and_clear();

    let Some(reconciled) = outcome else {
        println!("Nothing to save: the entry for {} is blank.", date_key(date));
        return Ok(());
    };

    let details = serde_json::json!({
        "analyzed": reconciled.analyzed,
        "emotion": reconciled.record.emotion(),
    });
    store::commit_entry(
        &mut conn,
        &records,
        reconciled.action.as_str(),
        &reconciled.record.id,
        Some(&details),
    )?;

    match reconciled.action {
        RecordAction::Created => println!("Created entry for {}.", reconciled.record.id),
        RecordAction::Updated => println!("Updated entry for {}.", reconciled.record.id),
    }
    if !reconciled.analyzed {
        println!("Text unchanged, kept the previous reflection.");
    }
    println!();
    super::print_record(&reconciled.record);

    Ok(())
}
