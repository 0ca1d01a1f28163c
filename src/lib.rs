//! Aura: a private, one-entry-per-day journal with AI-assisted reflection.
//!
//! Each calendar day holds at most one [`journal::types::JournalRecord`]. While
//! a day is being written, edits are coalesced and, once the writer pauses, the
//! entry is saved and sent to an insight service that returns its dominant
//! emotion, a short summary and a few suggestions. Unchanged text is never
//! re-analyzed.
//!
//! # Architecture
//!
//! - **Storage**: the whole collection lives as one JSON value in a SQLite
//!   key-value slot, with an audit log of every change
//! - **Insight**: Google Gemini `generateContent` with a JSON response schema,
//!   falling back to a neutral analysis on any failure
//! - **Editing**: a tokio task per session, driven by commands and two
//!   quiescence windows
//!
//! # Modules
//!
//! - [`config`]: configuration loading from TOML files and environment variables
//! - [`db`]: SQLite initialization, schema, migrations, and health checks
//! - [`insight`]: the analysis service seam and its Gemini implementation
//! - [`journal`]: records, reconciliation, the editor session, and overviews

pub mod config;
pub mod db;
pub mod insight;
pub mod journal;
