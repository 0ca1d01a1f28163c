//! Journal data model.
//!
//! Defines [`JournalRecord`] (one per calendar day), the closed [`Emotion`] set,
//! the [`Analysis`] produced by the insight service, and the editor's working
//! [`Draft`]. Serialized field names match the stored `journal-entries` JSON.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Format string for record keys (`YYYY-MM-DD`).
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// The storage key for a calendar day.
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

/// Parse a `YYYY-MM-DD` key back into a date.
pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, DATE_KEY_FORMAT).ok()
}

/// Dominant emotion of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Emotion {
    Joy,
    Gratitude,
    Love,
    Optimism,
    Sadness,
    Anger,
    Fear,
    Neutral,
}

impl Emotion {
    pub const ALL: [Emotion; 8] = [
        Self::Joy,
        Self::Gratitude,
        Self::Love,
        Self::Optimism,
        Self::Sadness,
        Self::Anger,
        Self::Fear,
        Self::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Joy => "Joy",
            Self::Gratitude => "Gratitude",
            Self::Love => "Love",
            Self::Optimism => "Optimism",
            Self::Sadness => "Sadness",
            Self::Anger => "Anger",
            Self::Fear => "Fear",
            Self::Neutral => "Neutral",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Joy => "😄",
            Self::Gratitude => "🙏",
            Self::Love => "❤️",
            Self::Optimism => "✨",
            Self::Sadness => "😢",
            Self::Anger => "😠",
            Self::Fear => "😨",
            Self::Neutral => "😐",
        }
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Emotion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown emotion: {s}"))
    }
}

/// Insight produced for an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub emotion: Emotion,
    /// One-sentence summary of the entry.
    pub summary: String,
    /// Supportive, actionable suggestions (normally three).
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// An image attached to the draft.
///
/// `preview` is the data URL persisted in the record; `encoded_payload` is the
/// bare base64 body sent to the insight service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub encoded_payload: String,
    pub preview: String,
}

impl ImageAttachment {
    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Self {
        let encoded_payload = BASE64.encode(bytes);
        let preview = format!("data:{mime_type};base64,{encoded_payload}");
        Self {
            encoded_payload,
            preview,
        }
    }

    /// Recover an attachment from a persisted data URL. Strings without a
    /// `;base64,` marker are treated as the payload itself.
    pub fn from_preview(preview: impl Into<String>) -> Self {
        let preview = preview.into();
        let encoded_payload = match preview.split_once(";base64,") {
            Some((_, payload)) => payload.to_string(),
            None => preview.clone(),
        };
        Self {
            encoded_payload,
            preview,
        }
    }

    /// MIME type declared by the data URL, `image/jpeg` when absent.
    pub fn mime_type(&self) -> &str {
        self.preview
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(';'))
            .map(|(mime, _)| mime)
            .filter(|mime| !mime.is_empty())
            .unwrap_or("image/jpeg")
    }
}

/// A journal record, one per calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalRecord {
    /// Date key (`YYYY-MM-DD`), immutable once created.
    pub id: String,
    /// RFC 3339 instant of the last save.
    pub timestamp: String,
    pub content: String,
    /// Data URL of the attached image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Analysis>,
}

impl JournalRecord {
    pub fn date(&self) -> Option<NaiveDate> {
        parse_date_key(&self.id)
    }

    pub fn emotion(&self) -> Option<Emotion> {
        self.analysis.as_ref().map(|a| a.emotion)
    }
}

/// The editor's working fields for the selected day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft {
    pub content: String,
    pub image: Option<ImageAttachment>,
    pub location: Option<Location>,
}

impl Draft {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_image(mut self, image: ImageAttachment) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Whitespace-only content and no image.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty() && self.image.is_none()
    }

    /// Working fields as stored in `record`.
    pub fn from_record(record: &JournalRecord) -> Self {
        Self {
            content: record.content.clone(),
            image: record.image.clone().map(ImageAttachment::from_preview),
            location: record.location,
        }
    }
}
