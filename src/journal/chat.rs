//! Day-keyed conversations with the companion.
//!
//! All conversations live in one JSON object under [`CHAT_HISTORY_KEY`],
//! mapping a date key to that day's messages in order. An incognito session
//! still shows the stored history but never writes back.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use super::store;
use super::types::date_key;
use crate::insight::CompanionService;

/// Fixed key of the chat history slot.
pub const CHAT_HISTORY_KEY: &str = "journal-chat-history";

/// Shown in place of a reply when the companion could not be reached.
pub const FALLBACK_REPLY: &str =
    "I'm sorry, I couldn't respond just now. Please try again in a moment.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Model => "model",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
        }
    }
}

/// Date key to that day's messages.
pub type ChatHistory = BTreeMap<String, Vec<ChatMessage>>;

/// Load every stored conversation. A missing slot is an empty history.
pub fn load_history(conn: &Connection) -> Result<ChatHistory> {
    match store::load_slot(conn, CHAT_HISTORY_KEY)? {
        Some(raw) => serde_json::from_str(&raw).context("failed to parse stored chat history"),
        None => Ok(ChatHistory::new()),
    }
}

pub fn save_history(conn: &Connection, history: &ChatHistory) -> Result<()> {
    let json = serde_json::to_string(history)?;
    store::save_slot(conn, CHAT_HISTORY_KEY, &json)
}

/// The companion's answer to one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub text: String,
    /// True when the companion failed and `text` is [`FALLBACK_REPLY`].
    pub fallback: bool,
}

/// One day's conversation.
#[derive(Debug)]
pub struct ChatSession {
    date: NaiveDate,
    messages: Vec<ChatMessage>,
    incognito: bool,
}

impl ChatSession {
    /// Open the conversation for `date`, starting from whatever is stored.
    pub fn open(conn: &Connection, date: NaiveDate, incognito: bool) -> Result<Self> {
        let messages = load_history(conn)?
            .remove(&date_key(date))
            .unwrap_or_default();
        Ok(Self {
            date,
            messages,
            incognito,
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn is_incognito(&self) -> bool {
        self.incognito
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Send `text` and append the exchange. Blank input sends nothing.
    ///
    /// A failed call returns [`FALLBACK_REPLY`] and leaves the conversation
    /// unchanged, so the message can be sent again.
    pub async fn send(&mut self, companion: &dyn CompanionService, text: &str) -> Option<ChatReply> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        match companion.reply(&self.messages, text).await {
            Ok(answer) => {
                self.messages.push(ChatMessage::user(text));
                self.messages.push(ChatMessage::model(answer.clone()));
                Some(ChatReply {
                    text: answer,
                    fallback: false,
                })
            }
            Err(e) => {
                tracing::error!(error = %e, "companion reply failed");
                Some(ChatReply {
                    text: FALLBACK_REPLY.to_string(),
                    fallback: true,
                })
            }
        }
    }

    /// Store this day's conversation, leaving other days untouched. Does
    /// nothing in incognito mode.
    pub fn save(&self, conn: &Connection) -> Result<()> {
        if self.incognito {
            return Ok(());
        }
        let mut history = load_history(conn)?;
        history.insert(date_key(self.date), self.messages.clone());
        save_history(conn, &history)
    }
}
