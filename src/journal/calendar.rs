//! Month overview of the journal.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::store::find_record;
use super::types::{date_key, Emotion, JournalRecord};

/// One day cell of a [`month_grid`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub has_entry: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotion: Option<Emotion>,
}

/// A week row, Sunday first. `None` pads days outside the month.
pub type CalendarWeek = [Option<CalendarDay>; 7];

/// Build the weeks of `year`-`month` (1-based). Returns `None` for an
/// invalid month.
pub fn month_grid(year: i32, month: u32, records: &[JournalRecord]) -> Option<Vec<CalendarWeek>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let lead = first.weekday().num_days_from_sunday() as usize;

    let mut weeks = Vec::with_capacity(6);
    let mut week: CalendarWeek = Default::default();
    let mut slot = lead;

    for date in first.iter_days().take_while(|d| d.month() == month) {
        let record = find_record(records, &date_key(date));
        week[slot] = Some(CalendarDay {
            date,
            has_entry: record.is_some(),
            emotion: record.and_then(JournalRecord::emotion),
        });
        slot += 1;
        if slot == 7 {
            weeks.push(std::mem::take(&mut week));
            slot = 0;
        }
    }
    if slot > 0 {
        weeks.push(week);
    }

    Some(weeks)
}
