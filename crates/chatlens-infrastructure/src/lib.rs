//! Infrastructure for Chatlens: key-value stores, paths, configuration and
//! the file-backed image picker.

pub mod config_service;
pub mod file_image_picker;
pub mod paths;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::file_image_picker::FileImagePicker;
pub use crate::paths::ChatlensPaths;
pub use crate::storage::{JsonFileStore, MemoryStore};
