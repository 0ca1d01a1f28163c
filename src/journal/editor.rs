//! Long-lived editing session over the journal.
//!
//! [`JournalEditor`] is a handle to a spawned task that owns the record
//! collection and the working [`Draft`] of the selected day. Edits arrive as
//! commands and are coalesced by two quiescence windows (content, and
//! image/location) before a reconciliation pass runs. While a pass waits on
//! the insight service the task keeps accepting edits; a newer pass or a day
//! switch cancels the outstanding one, in which case nothing is written for
//! it. Progress is published on a `watch` channel as [`EditorStatus`].

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use super::debounce::Debounce;
use super::reconcile::{self, ReconcilePlan, Reconciled};
use super::store;
use super::types::{date_key, Analysis, Draft, ImageAttachment, JournalRecord, Location};
use crate::config::EditorConfig;
use crate::insight::{analyze_entry, InsightService};

/// Quiescence windows and status timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorTimings {
    /// Inactivity after a content edit before a pass runs.
    pub content_quiet: Duration,
    /// Inactivity after an image or location edit before a pass runs.
    pub media_quiet: Duration,
    /// How long `Saved` is shown before reverting to `Idle`.
    pub saved_linger: Duration,
}

impl From<&EditorConfig> for EditorTimings {
    fn from(config: &EditorConfig) -> Self {
        Self {
            content_quiet: Duration::from_millis(config.content_quiet_ms),
            media_quiet: Duration::from_millis(config.media_quiet_ms),
            saved_linger: Duration::from_millis(config.saved_linger_ms),
        }
    }
}

impl Default for EditorTimings {
    fn default() -> Self {
        Self::from(&EditorConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Saved,
}

/// Published editor state. `analyzing` is independent of `save` and is only
/// set while an insight call is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EditorStatus {
    pub save: SaveStatus,
    pub analyzing: bool,
}

enum Command {
    SetContent(String),
    SetImage(Option<ImageAttachment>),
    SetLocation(Option<Location>),
    SelectDate(NaiveDate, oneshot::Sender<Draft>),
    Date(oneshot::Sender<NaiveDate>),
    Draft(oneshot::Sender<Draft>),
    Records(oneshot::Sender<Vec<JournalRecord>>),
    Flush(oneshot::Sender<()>),
}

type AnalysisCall = Pin<Box<dyn Future<Output = Analysis> + Send>>;

struct InFlight {
    plan: ReconcilePlan,
    call: AnalysisCall,
}

/// Handle to a running editing session.
pub struct JournalEditor {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<EditorStatus>,
    task: JoinHandle<()>,
}

impl JournalEditor {
    /// Load the journal and start a session on `date`. Must be called from
    /// within a Tokio runtime.
    pub fn spawn(
        db: Arc<Mutex<Connection>>,
        insight: Arc<dyn InsightService>,
        timings: EditorTimings,
        date: NaiveDate,
    ) -> Result<Self> {
        let records = {
            let conn = db.lock().map_err(|e| anyhow!("db lock poisoned: {e}"))?;
            store::load_records(&conn)?
        };
        let draft = store::find_record(&records, &date_key(date))
            .map(Draft::from_record)
            .unwrap_or_default();

        tracing::info!(date = %date_key(date), records = records.len(), "journal editor started");

        let (commands, rx) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(EditorStatus::default());

        let task = EditorTask {
            db,
            insight,
            date,
            draft,
            records,
            content_quiet: Debounce::new(timings.content_quiet),
            media_quiet: Debounce::new(timings.media_quiet),
            saved_linger: Debounce::new(timings.saved_linger),
            in_flight: None,
            status: status_tx,
            flush_waiters: Vec::new(),
        };
        let task = tokio::spawn(task.run(rx));

        Ok(Self {
            commands,
            status,
            task,
        })
    }

    pub fn set_content(&self, content: impl Into<String>) {
        self.send(Command::SetContent(content.into()));
    }

    pub fn set_image(&self, image: Option<ImageAttachment>) {
        self.send(Command::SetImage(image));
    }

    pub fn set_location(&self, location: Option<Location>) {
        self.send(Command::SetLocation(location));
    }

    /// Switch to another day. Pending edits of the current day are dropped and
    /// an outstanding analysis is cancelled. Returns the new day's draft.
    pub async fn select_date(&self, date: NaiveDate) -> Result<Draft> {
        self.request(|reply| Command::SelectDate(date, reply)).await
    }

    pub async fn date(&self) -> Result<NaiveDate> {
        self.request(Command::Date).await
    }

    pub async fn draft(&self) -> Result<Draft> {
        self.request(Command::Draft).await
    }

    /// Snapshot of the collection, newest first.
    pub async fn records(&self) -> Result<Vec<JournalRecord>> {
        self.request(Command::Records).await
    }

    /// Run any pending pass now and wait until no pass is in flight.
    pub async fn flush(&self) -> Result<()> {
        self.request(Command::Flush).await
    }

    pub fn status(&self) -> watch::Receiver<EditorStatus> {
        self.status.clone()
    }

    /// Flush, then stop the session.
    pub async fn shutdown(self) -> Result<()> {
        self.flush().await?;
        drop(self.commands);
        self.task
            .await
            .map_err(|e| anyhow!("journal editor task failed: {e}"))
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::warn!("journal editor has stopped, edit dropped");
        }
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .map_err(|_| anyhow!("journal editor has stopped"))?;
        response
            .await
            .map_err(|_| anyhow!("journal editor has stopped"))
    }
}

struct EditorTask {
    db: Arc<Mutex<Connection>>,
    insight: Arc<dyn InsightService>,
    date: NaiveDate,
    draft: Draft,
    records: Vec<JournalRecord>,
    content_quiet: Debounce,
    media_quiet: Debounce,
    saved_linger: Debounce,
    in_flight: Option<InFlight>,
    status: watch::Sender<EditorStatus>,
    flush_waiters: Vec<oneshot::Sender<()>>,
}

impl EditorTask {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                () = self.content_quiet.fired() => self.start_pass(),
                () = self.media_quiet.fired() => self.start_pass(),
                analysis = next_analysis(&mut self.in_flight) => self.finish_pass(analysis),
                () = self.saved_linger.fired() => self.set_save(SaveStatus::Idle),
            }
        }
        tracing::debug!("journal editor stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::SetContent(content) => {
                if content != self.draft.content {
                    self.draft.content = content;
                    self.content_quiet.schedule();
                }
            }
            Command::SetImage(image) => {
                if image != self.draft.image {
                    self.draft.image = image;
                    self.media_quiet.schedule();
                }
            }
            Command::SetLocation(location) => {
                if location != self.draft.location {
                    self.draft.location = location;
                    self.media_quiet.schedule();
                }
            }
            Command::SelectDate(date, reply) => {
                self.switch_day(date);
                let _ = reply.send(self.draft.clone());
            }
            Command::Date(reply) => {
                let _ = reply.send(self.date);
            }
            Command::Draft(reply) => {
                let _ = reply.send(self.draft.clone());
            }
            Command::Records(reply) => {
                let _ = reply.send(self.records.clone());
            }
            Command::Flush(reply) => {
                if self.content_quiet.is_pending() || self.media_quiet.is_pending() {
                    self.start_pass();
                }
                if self.in_flight.is_some() {
                    self.flush_waiters.push(reply);
                } else {
                    let _ = reply.send(());
                }
            }
        }
    }

    fn switch_day(&mut self, date: NaiveDate) {
        self.content_quiet.cancel();
        self.media_quiet.cancel();
        if let Some(pass) = self.in_flight.take() {
            tracing::info!(date = %pass.plan.date_key, "day switched during analysis, pass discarded");
            self.set_analyzing(false);
            self.set_save(SaveStatus::Idle);
        }

        self.date = date;
        let key = date_key(date);
        self.draft = store::find_record(&self.records, &key)
            .map(Draft::from_record)
            .unwrap_or_default();
        self.release_flush_waiters();

        tracing::debug!(date = %key, has_entry = !self.draft.is_blank(), "day selected");
    }

    fn start_pass(&mut self) {
        self.content_quiet.cancel();
        self.media_quiet.cancel();

        if let Some(stale) = self.in_flight.take() {
            tracing::debug!(date = %stale.plan.date_key, "newer edits supersede in-flight analysis");
            self.set_analyzing(false);
            self.set_save(SaveStatus::Idle);
        }

        let Some(plan) = reconcile::prepare(&self.draft, self.date, &self.records) else {
            tracing::trace!(date = %date_key(self.date), "blank day, nothing to save");
            self.release_flush_waiters();
            return;
        };

        self.saved_linger.cancel();
        self.set_save(SaveStatus::Saving);

        if plan.needs_analysis() {
            let insight = Arc::clone(&self.insight);
            let text = plan.content.clone();
            let image = plan.image.clone();
            let call: AnalysisCall = Box::pin(async move {
                analyze_entry(insight.as_ref(), &text, image.as_ref()).await
            });
            self.in_flight = Some(InFlight { plan, call });
            self.set_analyzing(true);
        } else {
            let analysis = plan.carried_analysis();
            self.commit(plan, analysis);
        }
    }

    fn finish_pass(&mut self, analysis: Analysis) {
        let Some(pass) = self.in_flight.take() else {
            return;
        };
        self.set_analyzing(false);
        self.commit(pass.plan, Some(analysis));
    }

    fn commit(&mut self, plan: ReconcilePlan, analysis: Option<Analysis>) {
        let reconciled = reconcile::apply(plan, analysis, &mut self.records, Utc::now());
        self.persist(&reconciled);
        self.set_save(SaveStatus::Saved);
        self.saved_linger.schedule();
        self.release_flush_waiters();
    }

    /// Storage failures are logged; the in-memory collection stays authoritative.
    fn persist(&self, reconciled: &Reconciled) {
        let details = serde_json::json!({
            "analyzed": reconciled.analyzed,
            "emotion": reconciled.record.emotion(),
        });
        let result = match self.db.lock() {
            Ok(mut conn) => store::commit_entry(
                &mut conn,
                &self.records,
                reconciled.action.as_str(),
                &reconciled.record.id,
                Some(&details),
            ),
            Err(e) => Err(anyhow!("db lock poisoned: {e}")),
        };

        match result {
            Ok(()) => tracing::info!(
                date = %reconciled.record.id,
                action = reconciled.action.as_str(),
                analyzed = reconciled.analyzed,
                "journal entry saved"
            ),
            Err(e) => tracing::error!(
                date = %reconciled.record.id,
                error = %e,
                "failed to persist journal entries"
            ),
        }
    }

    fn set_save(&self, save: SaveStatus) {
        self.status.send_if_modified(|status| {
            let changed = status.save != save;
            status.save = save;
            changed
        });
    }

    fn set_analyzing(&self, analyzing: bool) {
        self.status.send_if_modified(|status| {
            let changed = status.analyzing != analyzing;
            status.analyzing = analyzing;
            changed
        });
    }

    fn release_flush_waiters(&mut self) {
        for waiter in self.flush_waiters.drain(..) {
            let _ = waiter.send(());
        }
    }
}

/// Resolves with the outstanding pass's analysis; pending when none is in flight.
async fn next_analysis(in_flight: &mut Option<InFlight>) -> Analysis {
    match in_flight {
        Some(pass) => pass.call.as_mut().await,
        None => std::future::pending().await,
    }
}
