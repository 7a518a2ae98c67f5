//! Session domain module.
//!
//! # Module Structure
//!
//! - `manager`: The conversation state machine (`ChatSession`)
//! - `state`: Status, draft and operation outcome types
//! - `browser`: Read-only history/favorites projection (`ArchiveBrowser`)
//!
//! # Usage
//!
//! ```ignore
//! use chatlens_core::session::{ChatSession, SendOutcome, AttachOutcome};
//! use chatlens_core::session::{ArchiveBrowser, BrowserTab};
//! ```

mod browser;
mod manager;
mod state;

// Re-export public API
pub use browser::{ArchiveBrowser, BrowserRow, BrowserTab};
pub use manager::ChatSession;
pub use state::{AttachOutcome, Draft, SendOutcome, SessionStatus};
