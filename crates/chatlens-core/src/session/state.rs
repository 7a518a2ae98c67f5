//! Session state types.

use crate::chat::Message;
use crate::error::ChatError;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

/// Request state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionStatus {
    /// No request in flight.
    #[default]
    Idle,
    /// A completion or image analysis is in flight.
    Sending,
}

/// Pending composer state: the input text and the attached image preview.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub text: String,
    /// Data URI of the attached image.
    pub image: Option<String>,
}

impl Draft {
    /// A draft is sendable when it has non-blank text or an image.
    pub fn is_sendable(&self) -> bool {
        !self.text.trim().is_empty() || self.image.is_some()
    }
}

/// Result of a text send.
#[derive(Debug, Clone)]
pub enum SendOutcome {
    /// Blank input and no attachment; nothing happened.
    Ignored,
    /// Another request is in flight; nothing happened.
    Busy,
    /// The reply was appended after the user message.
    Replied(Message),
    /// The service failed. The user message stays, no reply was appended.
    Failed(ChatError),
    /// The reply arrived after the conversation was replaced and was dropped.
    Discarded,
}

/// Result of an image attachment.
#[derive(Debug, Clone)]
pub enum AttachOutcome {
    /// The picker returned nothing; state is unchanged.
    Cancelled,
    /// The picker itself failed (unreadable or non-image file); state is
    /// unchanged and no alert is raised.
    PickFailed(ChatError),
    /// Another request is in flight; the picker was not opened.
    Busy,
    /// The analysis reply was appended and the viewer opened.
    Analyzed(Message),
    /// The analysis failed and the attachment was discarded.
    Failed(ChatError),
    /// The analysis arrived after the conversation was replaced and was dropped.
    Discarded,
}

/// Application-level "one request in flight" flag.
#[derive(Debug, Default)]
pub(crate) struct InFlight(AtomicBool);

impl InFlight {
    /// Enters `Sending`, or returns `None` if already sending.
    pub(crate) fn try_begin(&self) -> Option<InFlightGuard<'_>> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(&self.0))
    }

    pub(crate) fn status(&self) -> SessionStatus {
        if self.0.load(Ordering::Acquire) {
            SessionStatus::Sending
        } else {
            SessionStatus::Idle
        }
    }
}

/// Returns the session to `Idle` when dropped, on every exit path.
pub(crate) struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_flight_guard_returns_to_idle() {
        let in_flight = InFlight::default();
        {
            let _guard = in_flight.try_begin().unwrap();
            assert_eq!(in_flight.status(), SessionStatus::Sending);
            assert!(in_flight.try_begin().is_none());
        }
        assert_eq!(in_flight.status(), SessionStatus::Idle);
        assert!(in_flight.try_begin().is_some());
    }

    #[test]
    fn test_draft_sendable() {
        assert!(!Draft::default().is_sendable());
        assert!(!Draft { text: "  \n".into(), image: None }.is_sendable());
        assert!(Draft { text: String::new(), image: Some("data:".into()) }.is_sendable());
    }
}
