#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use aura_journal::db;
use aura_journal::insight::{InsightError, InsightService};
use aura_journal::journal::types::{Analysis, Emotion, ImageAttachment, JournalRecord};
use chrono::NaiveDate;
use rusqlite::Connection;

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::schema::init_schema(&conn).unwrap();
    db::migrations::run_migrations(&mut conn).unwrap();
    conn
}

/// [`test_db`] wrapped for sharing with an editor.
pub fn shared_db() -> Arc<Mutex<Connection>> {
    Arc::new(Mutex::new(test_db()))
}

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}

pub fn analysis(emotion: Emotion, summary: &str) -> Analysis {
    Analysis {
        emotion,
        summary: summary.into(),
        suggestions: vec![
            "Take a short walk.".into(),
            "Write down one good thing.".into(),
            "Call a friend.".into(),
        ],
    }
}

/// A stored record for `2024-06-{d}` with an existing analysis.
pub fn analyzed_record(d: u32, content: &str, emotion: Emotion) -> JournalRecord {
    JournalRecord {
        id: format!("2024-06-{d:02}"),
        timestamp: format!("2024-06-{d:02}T21:00:00+00:00"),
        content: content.into(),
        image: None,
        location: None,
        analysis: Some(analysis(emotion, "Earlier reflection.")),
    }
}

/// Audit log operations in insertion order.
pub fn audit_ops(conn: &Connection) -> Vec<(String, String)> {
    let mut stmt = conn
        .prepare("SELECT operation, entry_id FROM entry_log ORDER BY id")
        .unwrap();
    stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

/// Insight service with a fixed answer, an optional latency, and a record of
/// every text it was asked about.
pub struct ScriptedInsight {
    emotion: Emotion,
    delay: Duration,
    fail: bool,
    calls: AtomicUsize,
    texts: Mutex<Vec<String>>,
    images: Mutex<Vec<Option<String>>>,
}

impl ScriptedInsight {
    pub fn new(emotion: Emotion) -> Arc<Self> {
        Self::build(emotion, Duration::ZERO, false)
    }

    pub fn with_delay(emotion: Emotion, delay: Duration) -> Arc<Self> {
        Self::build(emotion, delay, false)
    }

    /// Always errors, so callers record the fallback analysis.
    pub fn failing() -> Arc<Self> {
        Self::build(Emotion::Neutral, Duration::ZERO, true)
    }

    fn build(emotion: Emotion, delay: Duration, fail: bool) -> Arc<Self> {
        Arc::new(Self {
            emotion,
            delay,
            fail,
            calls: AtomicUsize::new(0),
            texts: Mutex::new(Vec::new()),
            images: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }

    /// Encoded payloads of the images sent with each call.
    pub fn images(&self) -> Vec<Option<String>> {
        self.images.lock().unwrap().clone()
    }
}

#[async_trait]
impl InsightService for ScriptedInsight {
    async fn analyze(
        &self,
        text: &str,
        image: Option<&ImageAttachment>,
    ) -> Result<Analysis, InsightError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts.lock().unwrap().push(text.to_string());
        self.images
            .lock()
            .unwrap()
            .push(image.map(|i| i.encoded_payload.clone()));

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(InsightError::Status {
                status: 503,
                body: "unavailable".into(),
            });
        }
        Ok(analysis(self.emotion, &format!("Reflection on: {text}")))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
