//! Chat domain module.
//!
//! # Module Structure
//!
//! - `message`: Conversation turns (`Message`, `ImageAnalysis`)
//! - `history`: Frozen conversation snapshots (`ChatHistory`)
//! - `analysis`: Post-processing of image-analysis completions
//! - `store`: Key-value store trait
//! - `archive`: Persistence gateway over the store (`ChatArchive`)
//! - `service`: Generative service, image picker and notifier traits

pub mod analysis;
mod archive;
mod history;
mod message;
mod service;
mod store;

pub use analysis::analyze;
pub use archive::{CHAT_HISTORY_KEY, ChatArchive, FAVORITES_KEY, MAX_HISTORIES};
pub use history::{ChatHistory, TITLE_ELLIPSIS, TITLE_MAX_CHARS, history_title};
pub use message::{ImageAnalysis, Message, MessageIdGenerator, image_data_uri};
pub use service::{
    Alert, DEFAULT_IMAGE_MIME_TYPE, GenerativeService, ImagePicker, Notifier, PickedImage,
};
pub use store::KeyValueStore;
