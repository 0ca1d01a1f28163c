pub mod calendar;
pub mod chat;
pub mod doctor;
pub mod edit;
pub mod export;
pub mod import;
pub mod show;
pub mod stats;
pub mod write;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use std::path::Path;
use std::sync::Arc;

use crate::config::AuraConfig;
use crate::insight::{CompanionService, InsightService};
use crate::journal::types::{parse_date_key, ImageAttachment, JournalRecord};

/// Parse a `YYYY-MM-DD` argument, defaulting to today's local date.
pub fn resolve_date(arg: Option<&str>) -> Result<NaiveDate> {
    match arg {
        Some(s) => parse_date_key(s.trim())
            .with_context(|| format!("invalid date `{s}`, expected YYYY-MM-DD")),
        None => Ok(Local::now().date_naive()),
    }
}

/// Read an image file into an attachment, inferring the MIME type from the
/// extension.
pub fn read_image(path: &Path) -> Result<ImageAttachment> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read image: {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let mime = match ext.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        _ => "image/jpeg",
    };
    Ok(ImageAttachment::from_bytes(mime, &bytes))
}

pub fn open_insight(config: &AuraConfig) -> Result<Arc<dyn InsightService>> {
    let service = crate::insight::create_service(&config.insight)?;
    Ok(Arc::from(service))
}

pub fn open_companion(config: &AuraConfig) -> Result<Box<dyn CompanionService>> {
    crate::insight::create_companion(&config.insight)
}

/// Print a record with its analysis.
pub fn print_record(record: &JournalRecord) {
    println!("Entry: {}", record.id);
    println!("{}", "=".repeat(50));
    println!("  Saved:          {}", record.timestamp);
    if let Some(loc) = record.location {
        println!("  Location:       {:.5}, {:.5}", loc.latitude, loc.longitude);
    }
    if let Some(ref image) = record.image {
        let attachment = ImageAttachment::from_preview(image.as_str());
        println!(
            "  Image:          {} ({} bytes encoded)",
            attachment.mime_type(),
            attachment.encoded_payload.len()
        );
    }
    println!();
    for line in record.content.lines() {
        println!("  {line}");
    }

    match record.analysis {
        Some(ref analysis) => {
            println!();
            println!(
                "Reflection: {} {}",
                analysis.emotion.emoji(),
                analysis.emotion
            );
            println!("  {}", analysis.summary);
            for suggestion in &analysis.suggestions {
                println!("  - {suggestion}");
            }
        }
        None => {
            println!();
            println!("Reflection: (not analyzed)");
        }
    }
}
