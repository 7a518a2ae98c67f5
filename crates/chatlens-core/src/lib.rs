//! Domain layer of Chatlens: conversation state, snapshots, favorites and
//! post-processing of image analyses.

pub mod chat;
pub mod config;
pub mod error;
pub mod session;

// Re-export common error type
pub use error::ChatError;
