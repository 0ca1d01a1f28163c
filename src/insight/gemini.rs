//! Gemini `generateContent` client.
//!
//! Sends the entry (and optional inline image) with a JSON response schema
//! and validates the structured answer with [`super::parse_analysis`]. The
//! same endpoint serves the companion, with the conversation so far as
//! `contents` and a fixed system instruction.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{parse_analysis, CompanionService, InsightError, InsightService};
use crate::journal::chat::ChatMessage;
use crate::journal::types::{Analysis, Emotion, ImageAttachment};

const ANALYSIS_PROMPT: &str = "Analyze the following journal entry. Identify the dominant emotion, \
provide a brief summary, and offer three supportive suggestions.";

const COMPANION_INSTRUCTION: &str = "You are a highly empathetic and supportive AI companion. \
Your name is Aura. Your purpose is to listen to the user, understand their feelings, and offer \
kind, insightful, and constructive advice. Avoid being clinical; be warm and conversational. \
Use emojis to convey tone where appropriate. Keep your responses concise but meaningful.";

/// Insight service backed by the Gemini API.
#[derive(Debug, Clone)]
pub struct GeminiInsightService {
    client: reqwest::Client,
    model: String,
    base_url: String,
}

impl GeminiInsightService {
    pub fn new(
        api_key: String,
        model: String,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, InsightError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(&api_key).map_err(|e| {
                InsightError::NotConfigured(format!("invalid API key header value: {e}"))
            })?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// POST `request` and return the text of the first candidate.
    async fn generate<T: Serialize + Sync>(&self, request: &T) -> Result<String, InsightError> {
        let response = self
            .client
            .post(self.endpoint())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        debug!(status = %status, model = %self.model, "generateContent response received");

        let body = response.text().await?;
        if !status.is_success() {
            return Err(InsightError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| InsightError::Malformed(format!("unexpected response body: {e}")))?;
        parsed
            .first_text()
            .map(str::to_string)
            .ok_or_else(|| InsightError::Malformed("response has no text candidate".into()))
    }
}

#[async_trait]
impl InsightService for GeminiInsightService {
    async fn analyze(
        &self,
        text: &str,
        image: Option<&ImageAttachment>,
    ) -> Result<Analysis, InsightError> {
        let request = build_request(text, image);
        let answer = self.generate(&request).await?;
        parse_analysis(&answer)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

#[async_trait]
impl CompanionService for GeminiInsightService {
    async fn reply(&self, history: &[ChatMessage], message: &str) -> Result<String, InsightError> {
        let request = build_chat_request(history, message);
        self.generate(&request).await
    }
}

fn build_request(text: &str, image: Option<&ImageAttachment>) -> GenerateContentRequest {
    let entry = if text.trim().is_empty() {
        "(no text, see the attached image)".to_string()
    } else {
        format!("\"{text}\"")
    };
    let mut prompt = format!("{ANALYSIS_PROMPT}\n\nEntry: {entry}");
    if image.is_some() {
        prompt.push_str("\n\nAn image is attached to this entry; take it into account.");
    }

    let mut parts = vec![Part {
        text: Some(prompt),
        inline_data: None,
    }];
    if let Some(image) = image {
        parts.push(Part {
            text: None,
            inline_data: Some(InlineData {
                mime_type: image.mime_type().to_string(),
                data: image.encoded_payload.clone(),
            }),
        });
    }

    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts,
        }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json",
            response_schema: analysis_schema(),
        },
    }
}

fn text_part(text: &str) -> Part {
    Part {
        text: Some(text.to_string()),
        inline_data: None,
    }
}

fn build_chat_request(history: &[ChatMessage], message: &str) -> ChatRequest {
    let mut contents: Vec<Content> = history
        .iter()
        .map(|m| Content {
            role: m.role.as_str(),
            parts: vec![text_part(&m.text)],
        })
        .collect();
    contents.push(Content {
        role: "user",
        parts: vec![text_part(message)],
    });

    ChatRequest {
        system_instruction: SystemInstruction {
            parts: vec![text_part(COMPANION_INSTRUCTION)],
        },
        contents,
    }
}

fn analysis_schema() -> serde_json::Value {
    let emotions: Vec<&str> = Emotion::ALL.iter().map(|e| e.as_str()).collect();
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "emotion": {
                "type": "STRING",
                "description": "The dominant emotion of the journal entry.",
                "enum": emotions,
            },
            "summary": {
                "type": "STRING",
                "description": "A concise, one-sentence summary of the journal entry.",
            },
            "suggestions": {
                "type": "ARRAY",
                "description": "Three actionable and supportive suggestions based on the entry's content and emotion.",
                "items": { "type": "STRING" },
            },
        },
        "required": ["emotion", "summary", "suggestions"],
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest {
    system_instruction: SystemInstruction,
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    fn first_text(&self) -> Option<&str> {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
            .find_map(|p| p.text.as_deref())
    }
}
