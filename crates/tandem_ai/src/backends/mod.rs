//! Backend trait and adapters.
//!
//! Each adapter module exposes a struct that implements [`Backend`], hiding
//! that backend's wire format entirely from callers.

pub mod anthropic;
pub mod ollama;
pub mod openai;

use async_trait::async_trait;
use serde::Deserialize;

use crate::types::{BackendId, PromptRequest};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors any backend may return. The message text is what the failure
/// classifier pattern-matches, so adapters keep it human-readable and carry
/// the backend's own error wording where one exists.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("{backend}: API key is not configured")]
    CredentialMissing { backend: BackendId },

    #[error("{backend}: {message}")]
    Network { backend: BackendId, message: String },

    #[error("{backend}: HTTP {status}: {message}")]
    Api {
        backend: BackendId,
        status: u16,
        message: String,
    },

    #[error("{backend}: malformed response: {message}")]
    MalformedResponse { backend: BackendId, message: String },
}

impl BackendError {
    /// The backend that produced this error.
    pub fn backend(&self) -> BackendId {
        match self {
            Self::CredentialMissing { backend }
            | Self::Network { backend, .. }
            | Self::Api { backend, .. }
            | Self::MalformedResponse { backend, .. } => *backend,
        }
    }
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Uniform contract over all text-generation backends (hosted and local).
#[async_trait]
pub trait Backend: Send + Sync {
    /// Stable identity of this backend.
    fn id(&self) -> BackendId;

    /// Human-readable display name.
    fn display_name(&self) -> &str;

    /// Models this backend recommends, best first. This is the backend's own
    /// ranking for display purposes, not a resolution order.
    fn supported_models(&self) -> &[&str];

    /// Whether the backend can be called right now. Credential-bearing
    /// backends require a non-empty key; the self-hosted backend is always
    /// configured (reachability is checked at send time).
    fn is_configured(&self) -> bool;

    /// Send a single-turn prompt and return the best-ranked completion text.
    /// No retries happen at this layer.
    async fn send(&self, request: &PromptRequest) -> Result<String, BackendError>;
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Error envelope shapes the backends use. Hosted APIs nest a message
/// (`{"error":{"message":"..."}}`); the local server uses a flat string
/// (`{"error":"..."}`).
#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorPayload>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorPayload {
    Nested { message: String },
    Flat(String),
}

/// Extract the backend's own error message from a response body, if the body
/// matches a known envelope shape.
pub(crate) fn extract_error_message(body: &str) -> Option<String> {
    let envelope: ErrorEnvelope = serde_json::from_str(body).ok()?;
    match envelope.error? {
        ErrorPayload::Nested { message } => Some(message),
        ErrorPayload::Flat(message) => Some(message),
    }
}

/// Describe a transport-level failure. Connection failures are worded so the
/// classifier can recognize an unreachable server from the message alone.
pub(crate) fn describe_transport_error(e: &reqwest::Error) -> String {
    if e.is_connect() {
        format!("connection refused ({e})")
    } else if e.is_timeout() {
        format!("request timed out ({e})")
    } else {
        e.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_nested_envelope() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        assert_eq!(
            extract_error_message(body).as_deref(),
            Some("Incorrect API key provided")
        );
    }

    #[test]
    fn extract_flat_envelope() {
        let body = r#"{"error":"model 'mistral:7b' not found, try pulling it first"}"#;
        assert_eq!(
            extract_error_message(body).as_deref(),
            Some("model 'mistral:7b' not found, try pulling it first")
        );
    }

    #[test]
    fn extract_rejects_non_envelope_bodies() {
        assert!(extract_error_message("<html>Bad Gateway</html>").is_none());
        assert!(extract_error_message(r#"{"response":"ok"}"#).is_none());
        assert!(extract_error_message("").is_none());
    }

    #[test]
    fn backend_error_reports_owner() {
        let err = BackendError::Api {
            backend: BackendId::OpenAi,
            status: 500,
            message: "boom".into(),
        };
        assert_eq!(err.backend(), BackendId::OpenAi);
        assert!(err.to_string().contains("openai"));
        assert!(err.to_string().contains("boom"));
    }
}
