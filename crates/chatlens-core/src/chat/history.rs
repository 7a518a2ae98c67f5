//! Chat history snapshots.

use super::message::Message;
use serde::{Deserialize, Serialize};

/// Number of characters of the first message kept in a history title.
pub const TITLE_MAX_CHARS: usize = 30;

/// Marker appended to every history title.
pub const TITLE_ELLIPSIS: &str = "...";

/// A frozen snapshot of a conversation.
///
/// `messages` is an owned copy taken at save time; nothing in the live
/// session aliases it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatHistory {
    pub id: String,
    pub title: String,
    pub last_message: String,
    /// Save instant in Unix milliseconds.
    pub timestamp: i64,
    pub messages: Vec<Message>,
}

impl ChatHistory {
    /// Builds a snapshot of `messages`.
    ///
    /// Returns `None` for an empty conversation, which has nothing to title.
    pub fn snapshot(id: impl Into<String>, messages: &[Message], timestamp: i64) -> Option<Self> {
        let first = messages.first()?;
        let last = messages.last()?;

        Some(Self {
            id: id.into(),
            title: history_title(&first.text),
            last_message: last.text.clone(),
            timestamp,
            messages: messages.to_vec(),
        })
    }
}

/// First 30 characters of `text` followed by `...`.
pub fn history_title(text: &str) -> String {
    let mut title: String = text.chars().take(TITLE_MAX_CHARS).collect();
    title.push_str(TITLE_ELLIPSIS);
    title
}
