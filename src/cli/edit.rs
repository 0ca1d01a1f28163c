//! CLI `edit` command: an interactive session on the journal editor.
//!
//! Each plain stdin line is appended to the day's text. Lines starting with
//! `:` are commands.

use anyhow::Result;
use chrono::NaiveDate;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::AuraConfig;
use crate::journal::editor::{EditorStatus, EditorTimings, JournalEditor, SaveStatus};
use crate::journal::store;
use crate::journal::types::{date_key, parse_date_key, Draft, Location};

const HELP: &str = "Commands: :date YYYY-MM-DD, :image PATH, :noimage, :loc LAT,LON, :show, :quit";

#[derive(Debug, PartialEq)]
enum EditLine {
    Text(String),
    Date(NaiveDate),
    Image(PathBuf),
    NoImage,
    Location(Location),
    Show,
    Help,
    Quit,
}

fn parse_line(line: &str) -> Result<EditLine, String> {
    let Some(command) = line.strip_prefix(':') else {
        return Ok(EditLine::Text(line.to_string()));
    };
    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command.trim(), ""),
    };

    match name {
        "date" => parse_date_key(arg)
            .map(EditLine::Date)
            .ok_or_else(|| format!("invalid date `{arg}`, expected YYYY-MM-DD")),
        "image" if !arg.is_empty() => Ok(EditLine::Image(PathBuf::from(arg))),
        "image" => Err("usage: :image PATH".into()),
        "noimage" => Ok(EditLine::NoImage),
        "loc" => parse_location(arg)
            .map(EditLine::Location)
            .ok_or_else(|| format!("invalid location `{arg}`, expected LAT,LON")),
        "show" => Ok(EditLine::Show),
        "help" => Ok(EditLine::Help),
        "quit" | "q" => Ok(EditLine::Quit),
        other => Err(format!("unknown command `:{other}`")),
    }
}

fn parse_location(arg: &str) -> Option<Location> {
    let (lat, lon) = arg.split_once(',')?;
    let latitude: f64 = lat.trim().parse().ok()?;
    let longitude: f64 = lon.trim().parse().ok()?;
    ((-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude)).then_some(
        Location {
            latitude,
            longitude,
        },
    )
}

fn status_line(status: EditorStatus) -> Option<&'static str> {
    match (status.save, status.analyzing) {
        (_, true) => Some("[analyzing...]"),
        (SaveStatus::Saving, false) => Some("[saving...]"),
        (SaveStatus::Saved, false) => Some("[saved]"),
        (SaveStatus::Idle, false) => None,
    }
}

fn print_draft(date: NaiveDate, draft: &Draft) {
    println!("--- {} ---", date_key(date));
    if draft.content.is_empty() {
        println!("(empty)");
    } else {
        println!("{}", draft.content);
    }
    if draft.image.is_some() {
        println!("(image attached)");
    }
    if let Some(loc) = draft.location {
        println!("(at {:.5}, {:.5})", loc.latitude, loc.longitude);
    }
}

/// Run an interactive editing session until `:quit` or end of input.
pub async fn edit(config: &AuraConfig, date: Option<&str>) -> Result<()> {
    let date = super::resolve_date(date)?;
    let conn = crate::db::open_database(config.resolved_db_path())?;
    let db = Arc::new(Mutex::new(conn));
    let insight = super::open_insight(config)?;

    let editor = JournalEditor::spawn(db, insight, EditorTimings::from(&config.editor), date)?;

    let mut status = editor.status();
    let printer = tokio::spawn(async move {
        while status.changed().await.is_ok() {
            let current = *status.borrow_and_update();
            if let Some(line) = status_line(current) {
                eprintln!("{line}");
            }
        }
    });

    let mut content = editor.draft().await?.content;
    print_draft(date, &editor.draft().await?);
    eprintln!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let parsed = match parse_line(&line) {
            Ok(parsed) => parsed,
            Err(msg) => {
                eprintln!("{msg}");
                continue;
            }
        };

        match parsed {
            EditLine::Text(text) => {
                if !content.is_empty() {
                    content.push('\n');
                }
                content.push_str(&text);
                editor.set_content(content.clone());
            }
            EditLine::Date(day) => {
                let draft = editor.select_date(day).await?;
                content = draft.content.clone();
                print_draft(day, &draft);
            }
            EditLine::Image(path) => match super::read_image(&path) {
                Ok(image) => editor.set_image(Some(image)),
                Err(e) => eprintln!("{e:#}"),
            },
            EditLine::NoImage => editor.set_image(None),
            EditLine::Location(location) => editor.set_location(Some(location)),
            EditLine::Show => {
                let day = editor.date().await?;
                print_draft(day, &editor.draft().await?);
                let records = editor.records().await?;
                if let Some(analysis) = store::find_record(&records, &date_key(day))
                    .and_then(|r| r.analysis.as_ref())
                {
                    println!(
                        "Reflection: {} {}: {}",
                        analysis.emotion.emoji(),
                        analysis.emotion,
                        analysis.summary
                    );
                }
            }
            EditLine::Help => eprintln!("{HELP}"),
            EditLine::Quit => break,
        }
    }

    editor.shutdown().await?;
    let _ = printer.await;
    Ok(())
}
