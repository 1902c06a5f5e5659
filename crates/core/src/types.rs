// crates/core/src/types.rs
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One turn of the conversation as supplied by the caller. Turns are
/// immutable; the service never stores them past the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// The only two intents the understanding pipeline produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    BookTable,
    Unknown,
}

impl Intent {
    /// Maps a free-form label to a recognized intent. Anything the model
    /// invents collapses to `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label {
            "book_table" => Intent::BookTable,
            _ => Intent::Unknown,
        }
    }
}

/// The four recognized booking slots. Absent slots serialize as omitted
/// keys, never null, and the struct itself rules out unrecognized keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingSlots {
    #[serde(
        rename = "numberOfGuests",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub number_of_guests: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,
}

impl BookingSlots {
    pub fn is_empty(&self) -> bool {
        self.number_of_guests.is_none()
            && self.date.is_none()
            && self.time.is_none()
            && self.cuisine.is_none()
    }
}

/// Result of one interpretation pass. Built fresh per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interpretation {
    pub intent: Intent,
    pub slots: BookingSlots,
}

/// Verdict on a free-text special request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub reason: String,
}

impl ValidationOutcome {
    pub fn accept(reason: impl Into<String>) -> Self {
        Self {
            valid: true,
            reason: reason.into(),
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: reason.into(),
        }
    }
}

/// STT events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub id: uuid::Uuid,
    pub language: String,
    /// Detected-language probability reported by the model, 0 when absent.
    pub language_confidence: f32,
    pub segments: Vec<TranscriptSegment>,
    pub full_text: String,
    pub processing_time: Duration,
}
