//! Anthropic (Claude) adapter — the Messages API.
//!
//! The response envelope is a content array of typed blocks; the adapter
//! concatenates the text blocks and returns them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Backend, BackendError, describe_transport_error, extract_error_message};
use crate::types::{BackendId, DEFAULT_TEMPERATURE, PromptRequest};

const API_BASE: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Models this backend recommends, best first.
const SUPPORTED_MODELS: &[&str] = &[
    "claude-sonnet-4-5",
    "claude-haiku-4-5",
    "claude-opus-4-1",
];

// ---------------------------------------------------------------------------
// Wire types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<WireMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// Anthropic API backend.
pub struct AnthropicBackend {
    api_key: Option<String>,
    base_url: String,
    client: reqwest::Client,
}

impl AnthropicBackend {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(api_key, API_BASE.to_string())
    }

    /// Create a backend with a custom base URL (proxies, tests).
    pub fn with_base_url(api_key: Option<String>, base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            api_key: api_key.filter(|k| !k.is_empty()),
            base_url,
            client,
        }
    }

    fn build_body(request: &PromptRequest) -> MessagesRequest {
        MessagesRequest {
            model: request.model.clone(),
            max_tokens: request.max_tokens,
            messages: vec![WireMessage {
                role: "user",
                content: request.prompt.clone(),
            }],
            temperature: request.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        }
    }
}

#[async_trait]
impl Backend for AnthropicBackend {
    fn id(&self) -> BackendId {
        BackendId::Anthropic
    }

    fn display_name(&self) -> &str {
        "Anthropic"
    }

    fn supported_models(&self) -> &[&str] {
        SUPPORTED_MODELS
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn send(&self, request: &PromptRequest) -> Result<String, BackendError> {
        let Some(ref key) = self.api_key else {
            return Err(BackendError::CredentialMissing {
                backend: BackendId::Anthropic,
            });
        };

        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let body = Self::build_body(request);
        debug!(model = %request.model, "Sending Anthropic message");

        let resp = self
            .client
            .post(&url)
            .header("x-api-key", key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::Network {
                backend: BackendId::Anthropic,
                message: describe_transport_error(&e),
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            let message = extract_error_message(&text).unwrap_or(text);
            return Err(BackendError::Api {
                backend: BackendId::Anthropic,
                status,
                message,
            });
        }

        let data: MessagesResponse =
            resp.json().await.map_err(|e| BackendError::MalformedResponse {
                backend: BackendId::Anthropic,
                message: e.to_string(),
            })?;

        let mut text = String::new();
        for block in &data.content {
            if block.block_type == "text"
                && let Some(ref t) = block.text
            {
                text.push_str(t);
            }
        }

        if text.is_empty() {
            return Err(BackendError::MalformedResponse {
                backend: BackendId::Anthropic,
                message: "response contained no text blocks".into(),
            });
        }
        Ok(text)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_is_unconfigured() {
        assert!(!AnthropicBackend::new(None).is_configured());
        assert!(!AnthropicBackend::new(Some(String::new())).is_configured());
        assert!(AnthropicBackend::new(Some("sk-ant".into())).is_configured());
    }

    #[tokio::test]
    async fn unconfigured_send_fails_before_network() {
        let backend =
            AnthropicBackend::with_base_url(None, "http://192.0.2.1:1".into());
        let err = backend
            .send(&PromptRequest::new("hi", "claude-sonnet-4-5"))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::CredentialMissing { .. }));
    }

    #[test]
    fn body_carries_max_tokens_and_single_message() {
        let request = PromptRequest::new("refactor this", "claude-sonnet-4-5");
        let body = AnthropicBackend::build_body(&request);
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["model"], "claude-sonnet-4-5");
        assert_eq!(json["max_tokens"], 1024);
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn response_concatenates_text_blocks_only() {
        let json = r#"{
            "content": [
                {"type": "thinking", "thinking": "hmm"},
                {"type": "text", "text": "fn main() {"},
                {"type": "text", "text": "}"}
            ]
        }"#;
        let data: MessagesResponse = serde_json::from_str(json).unwrap();
        let mut text = String::new();
        for block in &data.content {
            if block.block_type == "text"
                && let Some(ref t) = block.text
            {
                text.push_str(t);
            }
        }
        assert_eq!(text, "fn main() {}");
    }
}
