//! Unified path management for chatlens files.
//!
//! ```text
//! ~/.config/chatlens/          # Config directory
//! ├── config.toml              # Application configuration
//! └── secret.json              # API keys
//!
//! ~/.local/share/chatlens/     # Data directory
//! ├── store/                   # Key-value store, one JSON file per key
//! └── logs/                    # Application logs
//!     └── chatlens.log.YYYY-MM-DD
//! ```
//!
//! A base directory override puts both trees under one root, which is how
//! tests and `--data-dir` keep everything out of the user's home.

use chatlens_core::error::{ChatError, Result};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "chatlens";

/// Resolved locations of every chatlens file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatlensPaths {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl ChatlensPaths {
    /// Resolves the platform directories, or `base/config` and `base/data`
    /// when a base is given.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error if the platform directories cannot be
    /// determined (no home directory).
    pub fn resolve(base: Option<&Path>) -> Result<Self> {
        if let Some(base) = base {
            return Ok(Self {
                config_dir: base.join("config"),
                data_dir: base.join("data"),
            });
        }

        let config_root = dirs::config_dir()
            .ok_or_else(|| ChatError::config("Cannot find config directory"))?;
        let data_root =
            dirs::data_dir().ok_or_else(|| ChatError::config("Cannot find data directory"))?;

        Ok(Self {
            config_dir: config_root.join(APP_NAME),
            data_dir: data_root.join(APP_NAME),
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Path to the secrets file.
    ///
    /// # Security Note
    ///
    /// Ensure this file has appropriate permissions (e.g., 600).
    pub fn secret_file(&self) -> PathBuf {
        self.config_dir.join("secret.json")
    }

    pub fn store_dir(&self) -> PathBuf {
        self.data_dir.join("store")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}
