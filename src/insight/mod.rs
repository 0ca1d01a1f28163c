//! Entry analysis and the chat companion, both backed by an external
//! generative-language service.
//!
//! Provides the [`InsightService`] and [`CompanionService`] traits, a Gemini
//! implementation of both, and [`analyze_entry`], the wrapper the reconciler
//! calls: it never fails and falls back to [`fallback_analysis`] when the
//! service errors or answers with something unusable. Without an API key the
//! factories hand out [`UnconfiguredService`], so entries are still saved.

pub mod gemini;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::config::InsightConfig;
use crate::journal::chat::ChatMessage;
use crate::journal::types::{Analysis, Emotion, ImageAttachment};

/// Failures of a single analysis call.
#[derive(Debug, Error)]
pub enum InsightError {
    #[error("insight request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("insight service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed insight response: {0}")]
    Malformed(String),

    #[error("insight service not configured: {0}")]
    NotConfigured(String),
}

/// Analyzes journal entries.
#[async_trait]
pub trait InsightService: Send + Sync {
    /// Analyze the entry text and optional attached image.
    async fn analyze(
        &self,
        text: &str,
        image: Option<&ImageAttachment>,
    ) -> Result<Analysis, InsightError>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}

/// Conversational companion ("Aura").
#[async_trait]
pub trait CompanionService: Send + Sync {
    /// Answer `message`, given the earlier turns of the day's conversation.
    async fn reply(&self, history: &[ChatMessage], message: &str) -> Result<String, InsightError>;
}

/// Stand-in used when no API key is available. Every call fails with
/// [`InsightError::NotConfigured`].
#[derive(Debug, Clone)]
pub struct UnconfiguredService {
    reason: String,
}

impl UnconfiguredService {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl InsightService for UnconfiguredService {
    async fn analyze(
        &self,
        _text: &str,
        _image: Option<&ImageAttachment>,
    ) -> Result<Analysis, InsightError> {
        Err(InsightError::NotConfigured(self.reason.clone()))
    }

    fn name(&self) -> &str {
        "unconfigured"
    }
}

#[async_trait]
impl CompanionService for UnconfiguredService {
    async fn reply(&self, _history: &[ChatMessage], _message: &str) -> Result<String, InsightError> {
        Err(InsightError::NotConfigured(self.reason.clone()))
    }
}

/// The analysis recorded when the service could not produce one.
pub fn fallback_analysis() -> Analysis {
    Analysis {
        emotion: Emotion::Neutral,
        summary: "Could not analyze the entry due to an error.".into(),
        suggestions: vec![
            "Please try again later.".into(),
            "Check your internet connection.".into(),
            "Ensure the API key is configured correctly.".into(),
        ],
    }
}

/// Analyze an entry, absorbing every failure into [`fallback_analysis`].
pub async fn analyze_entry(
    service: &dyn InsightService,
    text: &str,
    image: Option<&ImageAttachment>,
) -> Analysis {
    match service.analyze(text, image).await {
        Ok(analysis) => {
            tracing::debug!(service = service.name(), emotion = %analysis.emotion, "entry analyzed");
            analysis
        }
        Err(e) => {
            tracing::error!(service = service.name(), error = %e, "entry analysis failed, using neutral fallback");
            fallback_analysis()
        }
    }
}

/// Shape of the JSON object the model is asked to produce. Every field is
/// optional here so missing ones surface as [`InsightError::Malformed`].
#[derive(Debug, Deserialize)]
struct RawAnalysis {
    emotion: Option<String>,
    summary: Option<String>,
    suggestions: Option<Vec<String>>,
}

/// Parse and validate the model's JSON answer.
pub fn parse_analysis(json: &str) -> Result<Analysis, InsightError> {
    let raw: RawAnalysis = serde_json::from_str(json.trim())
        .map_err(|e| InsightError::Malformed(format!("not an analysis object: {e}")))?;

    let emotion = raw
        .emotion
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| InsightError::Malformed("missing emotion".into()))?
        .parse::<Emotion>()
        .map_err(InsightError::Malformed)?;
    let summary = raw
        .summary
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| InsightError::Malformed("missing summary".into()))?;
    let suggestions = raw
        .suggestions
        .ok_or_else(|| InsightError::Malformed("missing suggestions".into()))?;

    Ok(Analysis {
        emotion,
        summary,
        suggestions,
    })
}

/// Build the Gemini client named in config, or `None` when its API key is
/// missing.
fn gemini_client(config: &InsightConfig) -> Result<Option<gemini::GeminiInsightService>> {
    match config.provider.as_str() {
        "gemini" => {
            let Some(api_key) = std::env::var(&config.api_key_env)
                .ok()
                .filter(|k| !k.trim().is_empty())
            else {
                return Ok(None);
            };
            let service = gemini::GeminiInsightService::new(
                api_key,
                config.model.clone(),
                config.base_url.clone(),
                config.timeout(),
            )?;
            Ok(Some(service))
        }
        other => anyhow::bail!("unknown insight provider: {other}. Supported: gemini"),
    }
}

fn unconfigured(config: &InsightConfig) -> UnconfiguredService {
    tracing::warn!(
        env = %config.api_key_env,
        "no API key set, the insight service is unavailable"
    );
    UnconfiguredService::new(format!(
        "set {} to your Gemini API key",
        config.api_key_env
    ))
}

/// Create the insight service named in config.
///
/// Currently only `"gemini"` is supported. The API key is read from the
/// environment variable named by `api_key_env`; when it is unset the returned
/// service fails every call, which [`analyze_entry`] turns into the neutral
/// fallback.
pub fn create_service(config: &InsightConfig) -> Result<Box<dyn InsightService>> {
    Ok(match gemini_client(config)? {
        Some(service) => Box::new(service),
        None => Box::new(unconfigured(config)),
    })
}

/// Create the chat companion named in config. Same provider and key handling
/// as [`create_service`].
pub fn create_companion(config: &InsightConfig) -> Result<Box<dyn CompanionService>> {
    Ok(match gemini_client(config)? {
        Some(service) => Box::new(service),
        None => Box::new(unconfigured(config)),
    })
}
