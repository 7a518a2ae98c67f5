//! Configuration and secret loading.
//!
//! `config.toml` holds the application configuration and `secret.json` the
//! API key. Both are optional on disk; the `GEMINI_API_KEY` environment
//! variable takes precedence over the secret file.

use crate::paths::ChatlensPaths;
use chatlens_core::config::{AppConfig, GeminiConfig, SecretConfig};
use chatlens_core::error::{ChatError, Result};
use std::fs;
use std::path::Path;

/// Environment variable overriding the Gemini API key.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Loads configuration files from the resolved chatlens paths.
#[derive(Debug, Clone)]
pub struct ConfigService {
    paths: ChatlensPaths,
}

impl ConfigService {
    pub fn new(paths: ChatlensPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ChatlensPaths {
        &self.paths
    }

    /// Loads `config.toml`, falling back to defaults when it is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_config(&self) -> Result<AppConfig> {
        let path = self.paths.config_file();
        match read_optional(&path)? {
            Some(content) => Ok(toml::from_str(&content)?),
            None => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                Ok(AppConfig::default())
            }
        }
    }

    /// Loads `secret.json`, or an empty secret config when it is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_secrets(&self) -> Result<SecretConfig> {
        match read_optional(&self.paths.secret_file())? {
            Some(content) => Ok(serde_json::from_str(&content)?),
            None => Ok(SecretConfig::default()),
        }
    }

    /// Resolves the Gemini API key from the environment or `secret.json`.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error if neither source provides a non-empty key.
    pub fn gemini_api_key(&self) -> Result<String> {
        let from_env = std::env::var(GEMINI_API_KEY_ENV).ok();
        resolve_api_key(from_env, &self.load_secrets()?)
    }

    /// Writes a `secret.json` template if none exists. Returns whether a file
    /// was created.
    pub fn ensure_secret_file(&self) -> Result<bool> {
        let path = self.paths.secret_file();
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let template = SecretConfig {
            gemini: Some(GeminiConfig {
                api_key: String::new(),
            }),
        };
        fs::write(&path, serde_json::to_string_pretty(&template)?)?;

        // Set file permissions to 600 (user read/write only) on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
        }

        Ok(true)
    }
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Picks the first non-blank key, environment first.
fn resolve_api_key(from_env: Option<String>, secrets: &SecretConfig) -> Result<String> {
    from_env
        .filter(|key| !key.trim().is_empty())
        .or_else(|| {
            secrets
                .gemini
                .as_ref()
                .map(|gemini| gemini.api_key.clone())
                .filter(|key| !key.trim().is_empty())
        })
        .ok_or_else(|| {
            ChatError::config(format!(
                "Gemini API key not set; export {GEMINI_API_KEY_ENV} or fill in secret.json"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn service(temp_dir: &TempDir) -> ConfigService {
        ConfigService::new(ChatlensPaths::resolve(Some(temp_dir.path())).unwrap())
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        assert_eq!(service(&temp_dir).load_config().unwrap(), AppConfig::default());
    }

    #[test]
    fn test_load_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir);
        fs::create_dir_all(service.paths().config_dir()).unwrap();
        fs::write(
            service.paths().config_file(),
            "vision_model = \"gemini-pro-vision\"\n",
        )
        .unwrap();

        let config = service.load_config().unwrap();
        assert_eq!(config.vision_model, "gemini-pro-vision");
        assert_eq!(config.text_model, AppConfig::default().text_model);
    }

    #[test]
    fn test_broken_config_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir);
        fs::create_dir_all(service.paths().config_dir()).unwrap();
        fs::write(service.paths().config_file(), "text_model = [").unwrap();

        assert!(service.load_config().unwrap_err().is_serialization());
    }

    #[test]
    fn test_ensure_secret_file_creates_template_once() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir);

        assert!(service.ensure_secret_file().unwrap());
        assert!(!service.ensure_secret_file().unwrap());

        let secrets = service.load_secrets().unwrap();
        assert_eq!(secrets.gemini.unwrap().api_key, "");
    }

    #[test]
    fn test_resolve_api_key_prefers_environment() {
        let secrets = SecretConfig {
            gemini: Some(GeminiConfig {
                api_key: "from-file".into(),
            }),
        };

        assert_eq!(resolve_api_key(Some("from-env".into()), &secrets).unwrap(), "from-env");
        assert_eq!(resolve_api_key(Some("  ".into()), &secrets).unwrap(), "from-file");
        assert_eq!(resolve_api_key(None, &secrets).unwrap(), "from-file");
    }

    #[test]
    fn test_resolve_api_key_missing() {
        let err = resolve_api_key(None, &SecretConfig::default()).unwrap_err();
        assert!(matches!(err, ChatError::Config(_)));
    }
}
