//! Ollama adapter — local model inference via the Ollama REST API.
//!
//! Generation uses `/api/generate` with a flat `{response}` envelope. The
//! adapter is always configured; whether the server is actually running is a
//! send-time concern, because it may start after the host does.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Backend, BackendError, describe_transport_error, extract_error_message};
use crate::types::{BackendId, DEFAULT_TEMPERATURE, PromptRequest};

const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Models this backend recommends, best first.
const SUPPORTED_MODELS: &[&str] = &[
    "qwen2.5-coder:7b",
    "codellama:7b",
    "deepseek-coder:6.7b",
    "starcoder2:3b",
    "llama3.2:3b",
];

// ---------------------------------------------------------------------------
// Wire types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// Self-hosted Ollama backend.
pub struct OllamaBackend {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaBackend {
    /// Create a new backend pointing at the given Ollama server.
    pub fn new(base_url: impl Into<String>) -> Self {
        // Local generation on CPU can be slow; give it a generous ceiling.
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.into(),
            client,
        }
    }

    fn build_body(request: &PromptRequest) -> GenerateRequest {
        GenerateRequest {
            model: request.model.clone(),
            prompt: request.prompt.clone(),
            stream: false,
            options: GenerateOptions {
                temperature: request.temperature.unwrap_or(DEFAULT_TEMPERATURE),
                num_predict: request.max_tokens,
            },
        }
    }
}

#[async_trait]
impl Backend for OllamaBackend {
    fn id(&self) -> BackendId {
        BackendId::Ollama
    }

    fn display_name(&self) -> &str {
        "Ollama (Local)"
    }

    fn supported_models(&self) -> &[&str] {
        SUPPORTED_MODELS
    }

    /// Always true: there is no credential, and the server may come up later.
    fn is_configured(&self) -> bool {
        true
    }

    async fn send(&self, request: &PromptRequest) -> Result<String, BackendError> {
        let url = format!("{}/api/generate", self.base_url.trim_end_matches('/'));
        let body = Self::build_body(request);
        debug!(model = %request.model, "Sending Ollama generate request");

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::Network {
                backend: BackendId::Ollama,
                message: describe_transport_error(&e),
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            let message = extract_error_message(&text).unwrap_or(text);
            return Err(BackendError::Api {
                backend: BackendId::Ollama,
                status,
                message,
            });
        }

        let data: GenerateResponse =
            resp.json().await.map_err(|e| BackendError::MalformedResponse {
                backend: BackendId::Ollama,
                message: e.to_string(),
            })?;

        data.response.ok_or_else(|| BackendError::MalformedResponse {
            backend: BackendId::Ollama,
            message: "response field missing from generate envelope".into(),
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
    fn always_configured() {
        let backend = OllamaBackend::new("http://localhost:11434");
        assert!(backend.is_configured());
    }

    #[test]
    fn body_is_non_streaming_with_options() {
        let request = PromptRequest::new("write a test", "codellama:7b");
        let body = OllamaBackend::build_body(&request);
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["model"], "codellama:7b");
        assert_eq!(json["prompt"], "write a test");
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["num_predict"], 1024);
    }

    #[test]
    fn flat_response_field_is_extracted() {
        let data: GenerateResponse =
            serde_json::from_str(r#"{"model":"codellama:7b","response":"done","done":true}"#)
                .unwrap();
        assert_eq!(data.response.as_deref(), Some("done"));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_network_error() {
        // Port 9 (discard) on loopback: refused, not a hang.
        let backend = OllamaBackend::new("http://127.0.0.1:9");
        let err = backend
            .send(&PromptRequest::new("hi", "codellama:7b"))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Network { .. }));
    }
}
