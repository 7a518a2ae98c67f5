//! Configuration models.
//!
//! `AppConfig` is read from `config.toml`, `SecretConfig` from `secret.json`.
//! Every field has a default so partial files are accepted.

use serde::{Deserialize, Serialize};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Prompt sent alongside every picked image.
pub const DEFAULT_ANALYSIS_PROMPT: &str = "Analyze this image and provide:
1. A detailed description
2. Notable visual elements and objects
3. Striking patterns or features
4. Your confidence in the analysis (as a percentage)";

/// Application configuration.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Model used for text completions.
    pub text_model: String,
    /// Model used for image analysis.
    pub vision_model: String,
    /// Base URL of the `generateContent` REST endpoint.
    pub api_base_url: String,
    /// Fixed prompt for image analysis.
    pub analysis_prompt: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            text_model: DEFAULT_GEMINI_MODEL.to_string(),
            vision_model: DEFAULT_GEMINI_MODEL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            analysis_prompt: DEFAULT_ANALYSIS_PROMPT.to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini: Option<GeminiConfig>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct GeminiConfig {
    pub api_key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str("text_model = \"gemini-pro\"").unwrap();
        assert_eq!(config.text_model, "gemini-pro");
        assert_eq!(config.vision_model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.analysis_prompt, DEFAULT_ANALYSIS_PROMPT);
    }

    #[test]
    fn test_secret_without_gemini_section() {
        let secrets: SecretConfig = serde_json::from_str("{}").unwrap();
        assert!(secrets.gemini.is_none());
    }
}
