//! Conversation message types.
//!
//! A [`Message`] is one turn in the live conversation. Field names are
//! serialized in camelCase, the schema of the persisted collections.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};

/// Structured record extracted from an image-analysis completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAnalysis {
    /// First line of the completion.
    pub description: String,
    /// Up to five distinct lowercase keywords, in first-seen order.
    pub tags: Vec<String>,
    /// Reported confidence, 0-100.
    pub confidence: u8,
}

/// A single turn in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique identifier within the session (millisecond timestamp string).
    pub id: String,
    /// Completion text or user input. Empty only when `image` is present.
    pub text: String,
    /// `true` for outbound (user) turns, `false` for replies.
    pub is_user: bool,
    /// Data URI of the image introduced by this message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Creation instant in Unix milliseconds.
    pub timestamp: i64,
    /// Favorite flag; only meaningful on replies. A stored `false` and an
    /// absent key both read as not favorite.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_favorite: bool,
    /// Present only on replies produced by image analysis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_analysis: Option<ImageAnalysis>,
}

impl Message {
    /// Creates an outbound message.
    pub fn user(id: String, text: impl Into<String>, image: Option<String>, timestamp: i64) -> Self {
        Self {
            id,
            text: text.into(),
            is_user: true,
            image,
            timestamp,
            is_favorite: false,
            image_analysis: None,
        }
    }

    /// Creates a reply message.
    pub fn bot(id: String, text: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id,
            text: text.into(),
            is_user: false,
            image: None,
            timestamp,
            is_favorite: false,
            image_analysis: None,
        }
    }

    /// Attaches an image reference and its analysis to a reply.
    pub fn with_analysis(mut self, image: String, analysis: ImageAnalysis) -> Self {
        self.image = Some(image);
        self.image_analysis = Some(analysis);
        self
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Issues timestamp-derived message ids that never repeat within a session.
///
/// Ids are the current Unix time in milliseconds. When two ids would land in
/// the same millisecond (a user turn immediately followed by its reply), the
/// later one is bumped past the previous id.
#[derive(Debug, Default)]
pub struct MessageIdGenerator {
    last: AtomicI64,
}

impl MessageIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next id for a message created at `now_millis`.
    pub fn next_id(&self, now_millis: i64) -> String {
        let mut previous = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now_millis.max(previous + 1);
            match self.last.compare_exchange_weak(
                previous,
                candidate,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate.to_string(),
                Err(actual) => previous = actual,
            }
        }
    }
}

/// Formats an image payload as a data URI.
pub fn image_data_uri(mime_type: &str, base64: &str) -> String {
    format!("data:{mime_type};base64,{base64}")
}
