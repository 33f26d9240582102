//! OpenAI adapter — chat completions over the OpenAI REST API.
//!
//! The response envelope is a choice array of messages; the adapter extracts
//! the best-ranked choice and returns its text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Backend, BackendError, describe_transport_error, extract_error_message};
use crate::types::{BackendId, DEFAULT_TEMPERATURE, PromptRequest};

const API_BASE: &str = "https://api.openai.com/v1";
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Models this backend recommends, best first.
const SUPPORTED_MODELS: &[&str] = &[
    "gpt-4o",
    "gpt-4o-mini",
    "gpt-4.1",
    "gpt-4.1-mini",
    "o3-mini",
];

// ---------------------------------------------------------------------------
// Wire types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// OpenAI API backend.
pub struct OpenAiBackend {
    api_key: Option<String>,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiBackend {
    /// Create a new backend. An empty or absent key yields an unconfigured
    /// backend that still registers (the host offers the credential flow).
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(api_key, API_BASE.to_string())
    }

    /// Create a backend with a custom base URL (proxies, Azure, tests).
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

    fn build_body(request: &PromptRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: request.model.clone(),
            messages: vec![WireMessage {
                role: "user",
                content: request.prompt.clone(),
            }],
            temperature: request.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: request.max_tokens,
            stream: false,
        }
    }
}

#[async_trait]
impl Backend for OpenAiBackend {
    fn id(&self) -> BackendId {
        BackendId::OpenAi
    }

    fn display_name(&self) -> &str {
        "OpenAI"
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
                backend: BackendId::OpenAi,
            });
        };

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = Self::build_body(request);
        debug!(model = %request.model, "Sending OpenAI chat completion");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(key)
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::Network {
                backend: BackendId::OpenAi,
                message: describe_transport_error(&e),
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            let message = extract_error_message(&text).unwrap_or(text);
            return Err(BackendError::Api {
                backend: BackendId::OpenAi,
                status,
                message,
            });
        }

        let data: ChatCompletionResponse =
            resp.json().await.map_err(|e| BackendError::MalformedResponse {
                backend: BackendId::OpenAi,
                message: e.to_string(),
            })?;

        data.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| BackendError::MalformedResponse {
                backend: BackendId::OpenAi,
                message: "response contained no completion choices".into(),
            })
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
        assert!(!OpenAiBackend::new(None).is_configured());
        assert!(!OpenAiBackend::new(Some(String::new())).is_configured());
        assert!(OpenAiBackend::new(Some("sk-test".into())).is_configured());
    }

    #[tokio::test]
    async fn unconfigured_send_fails_before_network() {
        // Unroutable base URL: if the adapter touched the network the test
        // would hang toward the timeout instead of failing instantly.
        let backend =
            OpenAiBackend::with_base_url(None, "http://192.0.2.1:1/v1".into());
        let err = backend
            .send(&PromptRequest::new("hi", "gpt-4o"))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::CredentialMissing { .. }));
    }

    #[test]
    fn body_is_single_turn_user_message() {
        let request = PromptRequest::new("explain lifetimes", "gpt-4o-mini");
        let body = OpenAiBackend::build_body(&request);
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "explain lifetimes");
        assert_eq!(json["max_tokens"], 1024);
    }

    #[test]
    fn temperature_override_is_honored() {
        let mut request = PromptRequest::new("hi", "gpt-4o");
        request.temperature = Some(0.9);
        let body = OpenAiBackend::build_body(&request);
        assert!((body.temperature - 0.9).abs() < f32::EPSILON);

        request.temperature = None;
        let body = OpenAiBackend::build_body(&request);
        assert!((body.temperature - DEFAULT_TEMPERATURE).abs() < f32::EPSILON);
    }

    #[test]
    fn response_extracts_first_choice() {
        let json = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": "first"}},
                {"message": {"role": "assistant", "content": "second"}}
            ]
        }"#;
        let data: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        let content = data.choices.into_iter().next().and_then(|c| c.message.content);
        assert_eq!(content.as_deref(), Some("first"));
    }

    #[test]
    fn supported_models_ranked_best_first() {
        let backend = OpenAiBackend::new(None);
        assert_eq!(backend.supported_models().first(), Some(&"gpt-4o"));
    }
}
