//! Save/analyze reconciliation for one calendar day.
//!
//! A pass is split in two synchronous halves around the only suspension
//! point, the insight call: [`prepare`] decides whether anything is saved and
//! whether the entry needs a fresh analysis, [`apply`] merges the resolved
//! record into the collection. [`reconcile`] runs a complete pass.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::store::{find_record, upsert_record};
use super::types::{date_key, Analysis, Draft, ImageAttachment, JournalRecord, Location};
use crate::insight::{analyze_entry, InsightService};

/// How the draft relates to the stored record of its day.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryChange {
    /// No record for the day yet.
    New,
    /// Content or image differs from the stored record.
    Edited,
    /// Content and image match; the prior analysis is carried over.
    Unchanged(Option<Analysis>),
}

/// The decision half of a pass, taken before any analysis call.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcilePlan {
    pub date_key: String,
    pub content: String,
    pub image: Option<ImageAttachment>,
    pub location: Option<Location>,
    pub change: EntryChange,
}

impl ReconcilePlan {
    pub fn needs_analysis(&self) -> bool {
        !matches!(self.change, EntryChange::Unchanged(_))
    }

    /// Analysis to keep when no call is made.
    pub fn carried_analysis(&self) -> Option<Analysis> {
        match &self.change {
            EntryChange::Unchanged(prior) => prior.clone(),
            _ => None,
        }
    }
}

/// What [`apply`] did to the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordAction {
    Created,
    Updated,
}

impl RecordAction {
    /// Audit log operation name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "create",
            Self::Updated => "update",
        }
    }
}

/// Outcome of a committed pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub record: JournalRecord,
    pub action: RecordAction,
    /// Whether the insight service was called for this pass.
    pub analyzed: bool,
}

/// Decide what a pass over `draft` for `date` has to do.
///
/// Returns `None` for a blank day (whitespace-only content and no image):
/// nothing is created or touched.
pub fn prepare(draft: &Draft, date: NaiveDate, records: &[JournalRecord]) -> Option<ReconcilePlan> {
    if draft.is_blank() {
        return None;
    }

    let key = date_key(date);
    let image_ref = draft.image.as_ref().map(|i| i.preview.as_str());
    let change = match find_record(records, &key) {
        None => EntryChange::New,
        Some(existing)
            if existing.content != draft.content || existing.image.as_deref() != image_ref =>
        {
            EntryChange::Edited
        }
        Some(existing) => EntryChange::Unchanged(existing.analysis.clone()),
    };

    Some(ReconcilePlan {
        date_key: key,
        content: draft.content.clone(),
        image: draft.image.clone(),
        location: draft.location,
        change,
    })
}

/// Build the record for `plan` and merge it into `records`.
///
/// An existing record keeps its position; a new one is inserted newest-first.
pub fn apply(
    plan: ReconcilePlan,
    analysis: Option<Analysis>,
    records: &mut Vec<JournalRecord>,
    now: DateTime<Utc>,
) -> Reconciled {
    let analyzed = plan.needs_analysis();
    let record = JournalRecord {
        id: plan.date_key,
        timestamp: now.to_rfc3339(),
        content: plan.content,
        image: plan.image.map(|i| i.preview),
        location: plan.location,
        analysis,
    };

    let action = if upsert_record(records, record.clone()) {
        RecordAction::Updated
    } else {
        RecordAction::Created
    };

    Reconciled {
        record,
        action,
        analyzed,
    }
}

/// Run one complete pass without any debounce.
pub async fn reconcile(
    draft: &Draft,
    date: NaiveDate,
    records: &mut Vec<JournalRecord>,
    insight: &dyn InsightService,
) -> Option<Reconciled> {
    let plan = prepare(draft, date, records)?;

    let analysis = if plan.needs_analysis() {
        Some(analyze_entry(insight, &plan.content, plan.image.as_ref()).await)
    } else {
        plan.carried_analysis()
    };

    let reconciled = apply(plan, analysis, records, Utc::now());
    tracing::debug!(
        date = %reconciled.record.id,
        action = reconciled.action.as_str(),
        analyzed = reconciled.analyzed,
        "reconciliation pass committed"
    );
    Some(reconciled)
}
