//! CLI `calendar` command: a month grid of entries.

use anyhow::{Context, Result};
use chrono::{Datelike, Local, NaiveDate};

use crate::config::AuraConfig;
use crate::journal::calendar::{month_grid, CalendarWeek};
use crate::journal::store;

/// Parse `YYYY-MM`, defaulting to the current month.
fn resolve_month(arg: Option<&str>) -> Result<(i32, u32)> {
    let Some(s) = arg else {
        let today = Local::now().date_naive();
        return Ok((today.year(), today.month()));
    };
    let first = NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
        .with_context(|| format!("invalid month `{s}`, expected YYYY-MM"))?;
    Ok((first.year(), first.month()))
}

fn render_week(week: &CalendarWeek) -> String {
    week.iter()
        .map(|cell| match cell {
            Some(day) if day.has_entry => format!("{:>2}*", day.date.day()),
            Some(day) => format!("{:>2} ", day.date.day()),
            None => "   ".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end()
        .to_string()
}

pub fn calendar(config: &AuraConfig, month: Option<&str>) -> Result<()> {
    let (year, month) = resolve_month(month)?;
    let conn = crate::db::open_database(config.resolved_db_path())?;
    let records = store::load_records(&conn)?;

    let grid = month_grid(year, month, &records)
        .with_context(|| format!("invalid month {year}-{month:02}"))?;

    let title = NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.format("%B %Y").to_string())
        .unwrap_or_default();
    println!("{title:^27}");
    println!("Su  Mo  Tu  We  Th  Fr  Sa");
    for week in &grid {
        println!("{}", render_week(week));
    }

    let marked: Vec<_> = grid
        .iter()
        .flatten()
        .flatten()
        .filter(|d| d.has_entry)
        .collect();
    if !marked.is_empty() {
        println!();
        for day in marked {
            match day.emotion {
                Some(emotion) => println!("  {:>2}  {} {}", day.date.day(), emotion.emoji(), emotion),
                None => println!("  {:>2}  (not analyzed)", day.date.day()),
            }
        }
    }

    Ok(())
}
