//! Failure classification with suggested remedies.
//!
//! Backend error payloads are not contractually stable, so classification is
//! deliberately best-effort string matching over the message text, not
//! structured error codes. The classifier only selects a remedy; the host
//! renders and performs it.

use serde::{Deserialize, Serialize};

use crate::backends::BackendError;
use crate::resolver::ResolveError;
use crate::types::BackendId;

const OLLAMA_DOWNLOAD_URL: &str = "https://ollama.com/download";

/// Model suggested when nothing at all is installed locally.
const BOOTSTRAP_MODEL: &str = "qwen2.5-coder:7b";

// ---------------------------------------------------------------------------
// Taxonomy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    CredentialMissing,
    CredentialRejected,
    ServerUnreachable,
    ModelNotFound,
    NoModelAvailable,
    Unclassified,
}

/// What the host should offer the user. Selection only — the classifier
/// never opens pages, runs commands, or prompts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Remedy {
    /// Prompt for (or re-enter) the backend's API key.
    PromptForCredential { backend: BackendId },
    /// Offer to open the local server's download page.
    StartLocalServer { download_url: String },
    /// Offer to run an install command for a specific model.
    InstallModel { command: String },
    /// Offer to pull a first model onto an empty server.
    PullAnyModel { command: String },
    None,
}

/// A raw failure mapped into the taxonomy, ready for the host to render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedFailure {
    pub kind: FailureKind,
    pub message: String,
    pub remedy: Remedy,
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Classify a backend error from the send path.
pub fn classify(error: &BackendError) -> ClassifiedFailure {
    match error {
        BackendError::CredentialMissing { backend } => ClassifiedFailure {
            kind: FailureKind::CredentialMissing,
            message: error.to_string(),
            remedy: Remedy::PromptForCredential { backend: *backend },
        },
        BackendError::Api {
            backend,
            status: 401 | 403,
            ..
        } => ClassifiedFailure {
            kind: FailureKind::CredentialRejected,
            message: error.to_string(),
            remedy: Remedy::PromptForCredential { backend: *backend },
        },
        _ => classify_message(error.backend(), &error.to_string()),
    }
}

/// Classify a resolution failure. `NoModelAvailable` is fatal to the attempt;
/// no send was issued.
pub fn classify_resolve(error: &ResolveError) -> ClassifiedFailure {
    match error {
        ResolveError::NoModelAvailable => ClassifiedFailure {
            kind: FailureKind::NoModelAvailable,
            message: error.to_string(),
            remedy: Remedy::PullAnyModel {
                command: format!("ollama pull {BOOTSTRAP_MODEL}"),
            },
        },
    }
}

fn classify_message(backend: BackendId, message: &str) -> ClassifiedFailure {
    let lower = message.to_lowercase();

    let (kind, remedy) = if lower.contains("econnrefused")
        || lower.contains("connection refused")
        || lower.contains("connection failed")
        || lower.contains("not running")
        || lower.contains("unreachable")
    {
        let remedy = if backend == BackendId::Ollama {
            Remedy::StartLocalServer {
                download_url: OLLAMA_DOWNLOAD_URL.to_string(),
            }
        } else {
            Remedy::None
        };
        (FailureKind::ServerUnreachable, remedy)
    } else if lower.contains("not found") || lower.contains("does not exist") {
        let command = match extract_quoted_model(message) {
            Some(model) => format!("ollama pull {model}"),
            None => "ollama pull <model>".to_string(),
        };
        (FailureKind::ModelNotFound, Remedy::InstallModel { command })
    } else {
        (FailureKind::Unclassified, Remedy::None)
    };

    ClassifiedFailure {
        kind,
        message: message.to_string(),
        remedy,
    }
}

/// Pull a model name out of messages like
/// `model 'codellama:13b' not found, try pulling it first`.
fn extract_quoted_model(message: &str) -> Option<&str> {
    let start = message.find('\'')? + 1;
    let end = message[start..].find('\'')? + start;
    let name = &message[start..end];
    (!name.is_empty()).then_some(name)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
