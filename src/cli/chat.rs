//! CLI `chat` command: talk with Aura about a day.
//!
//! Each stdin line is one message. The conversation is stored under the
//! selected day after every reply unless the session is incognito.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::AuraConfig;
use crate::journal::chat::{ChatMessage, ChatRole, ChatSession};
use crate::journal::types::date_key;

fn format_message(message: &ChatMessage) -> String {
    match message.role {
        ChatRole::User => format!("You:  {}", message.text),
        ChatRole::Model => format!("Aura: {}", message.text),
    }
}

fn is_quit(line: &str) -> bool {
    matches!(line.trim(), ":quit" | ":q")
}

pub async fn chat(config: &AuraConfig, date: Option<&str>, incognito: bool) -> Result<()> {
    let date = super::resolve_date(date)?;
    let conn = crate::db::open_database(config.resolved_db_path())?;
    let companion = super::open_companion(config)?;
    let mut session = ChatSession::open(&conn, date, incognito)?;

    println!("--- Chat for {} ---", date_key(session.date()));
    if session.is_incognito() {
        println!("(incognito: this conversation will not be saved)");
    }
    for message in session.messages() {
        println!("{}", format_message(message));
    }
    eprintln!("Type a message, or :quit to leave.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if is_quit(&line) {
            break;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner} {msg}")?);
        pb.set_message("Aura is thinking...");
        pb.enable_steady_tick(Duration::from_millis(100));
        let reply = session.send(companion.as_ref(), &line).await;
        pb.finish_and_clear();

        let Some(reply) = reply else {
            continue;
        };
        println!("{}", format_message(&ChatMessage::model(reply.text)));
        if !reply.fallback {
            session.save(&conn)?;
        }
    }

    Ok(())
}
