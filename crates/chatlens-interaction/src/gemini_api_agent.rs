//! GeminiApiAgent - Direct REST API implementation for Gemini.
//!
//! Calls the `generateContent` endpoint once per request. Text completions
//! and image analyses may use different models.

use async_trait::async_trait;
use chatlens_core::chat::GenerativeService;
use chatlens_core::config::{AppConfig, DEFAULT_API_BASE_URL, DEFAULT_GEMINI_MODEL};
use chatlens_core::error::{ChatError, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

/// Agent implementation that talks to the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiApiAgent {
    client: Client,
    api_key: String,
    base_url: String,
    text_model: String,
    vision_model: String,
}

impl GeminiApiAgent {
    /// Creates a new agent using the default model for both text and images.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_API_BASE_URL.to_string(),
            text_model: DEFAULT_GEMINI_MODEL.to_string(),
            vision_model: DEFAULT_GEMINI_MODEL.to_string(),
        }
    }

    /// Creates an agent configured from `config`.
    pub fn from_config(api_key: impl Into<String>, config: &AppConfig) -> Self {
        Self::new(api_key)
            .with_base_url(&config.api_base_url)
            .with_text_model(&config.text_model)
            .with_vision_model(&config.vision_model)
    }

    /// Overrides the text model after construction.
    pub fn with_text_model(mut self, model: impl Into<String>) -> Self {
        self.text_model = model.into();
        self
    }

    /// Overrides the image-analysis model after construction.
    pub fn with_vision_model(mut self, model: impl Into<String>) -> Self {
        self.vision_model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/{model}:generateContent", self.base_url)
    }

    async fn send_request(&self, model: &str, body: &GenerateContentRequest) -> Result<String> {
        tracing::debug!(model, parts = body.contents[0].parts.len(), "Calling Gemini API");

        let response = self
            .client
            .post(self.endpoint(model))
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|err| ChatError::service(format!("Gemini API request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, &body_text));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| ChatError::service(format!("Failed to parse Gemini response: {err}")))?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl GenerativeService for GeminiApiAgent {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = GenerateContentRequest::user(vec![Part::Text {
            text: prompt.to_string(),
        }]);
        self.send_request(&self.text_model, &request).await
    }

    async fn complete_with_image(
        &self,
        prompt: &str,
        image_base64: &str,
        mime_type: &str,
    ) -> Result<String> {
        let request = GenerateContentRequest::user(vec![
            Part::Text {
                text: prompt.to_string(),
            },
            Part::InlineData {
                inline_data: InlineDataPayload {
                    mime_type: mime_type.to_string(),
                    data: image_base64.to_string(),
                },
            },
        ]);
        self.send_request(&self.vision_model, &request).await
    }
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

impl GenerateContentRequest {
    fn user(parts: Vec<Part>) -> Self {
        Self {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
        }
    }
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataPayload,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataPayload {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

/// Concatenates the text parts of the first candidate.
fn extract_text_response(response: GenerateContentResponse) -> Result<String> {
    let text: String = response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(ChatError::service(
            "Gemini API returned no text in the response candidates",
        ));
    }
    Ok(text)
}

fn map_http_error(status: StatusCode, body: &str) -> ChatError {
    let message = serde_json::from_str::<ErrorWrapper>(body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.to_string());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.to_string());

    ChatError::service(format!("HTTP {}: {message}", status.as_u16()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_request_shape() {
        let request = GenerateContentRequest::user(vec![Part::Text {
            text: "Hello".into(),
        }]);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"contents": [{"role": "user", "parts": [{"text": "Hello"}]}]})
        );
    }

    #[test]
    fn test_image_request_shape() {
        let request = GenerateContentRequest::user(vec![
            Part::Text {
                text: "Describe".into(),
            },
            Part::InlineData {
                inline_data: InlineDataPayload {
                    mime_type: "image/jpeg".into(),
                    data: "AAAA".into(),
                },
            },
        ]);
        assert_eq!(
            serde_json::to_value(&request).unwrap()["contents"][0]["parts"][1],
            json!({"inlineData": {"mimeType": "image/jpeg", "data": "AAAA"}})
        );
    }

    #[test]
    fn test_extract_text_joins_parts_of_first_candidate() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                {"content": {"parts": [{"text": "Hi "}, {"text": "there"}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }))
        .unwrap();

        assert_eq!(extract_text_response(response).unwrap(), "Hi there");
    }

    #[test]
    fn test_extract_text_without_candidates_fails() {
        let response: GenerateContentResponse =
            serde_json::from_value(json!({"candidates": []})).unwrap();
        assert!(extract_text_response(response).unwrap_err().is_service());

        let blocked: GenerateContentResponse =
            serde_json::from_value(json!({"promptFeedback": {"blockReason": "SAFETY"}})).unwrap();
        assert!(extract_text_response(blocked).is_err());
    }

    #[test]
    fn test_map_http_error_reads_error_body() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#;
        let err = map_http_error(StatusCode::BAD_REQUEST, body);
        assert_eq!(
            err.to_string(),
            "Generative service error: HTTP 400: INVALID_ARGUMENT: API key not valid"
        );
    }

    #[test]
    fn test_map_http_error_with_plain_body() {
        let err = map_http_error(StatusCode::BAD_GATEWAY, "upstream down");
        assert!(err.to_string().ends_with("HTTP 502: upstream down"));
    }

    #[test]
    fn test_endpoint_uses_model_and_base_url() {
        let agent = GeminiApiAgent::new("key")
            .with_base_url("http://localhost:8080/v1beta/models/")
            .with_text_model("gemini-pro");
        assert_eq!(
            agent.endpoint(&agent.text_model),
            "http://localhost:8080/v1beta/models/gemini-pro:generateContent"
        );
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_a_service_error() {
        let agent = GeminiApiAgent::new("key").with_base_url("http://127.0.0.1:9");
        let err = agent.complete("Hello").await.unwrap_err();
        assert!(err.is_service());
    }
}
