use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Backend identity
// ---------------------------------------------------------------------------

/// Identifies one compiled-in backend. The set is closed: backends are
/// registered into the [`crate::registry::BackendRegistry`] at startup and
/// never discovered dynamically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendId {
    OpenAi,
    Anthropic,
    Ollama,
}

impl BackendId {
    /// Stable key used in config files and host-facing messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Ollama => "ollama",
        }
    }

    /// Parse a stable key. `"local"` is accepted as an alias for the
    /// self-hosted backend.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "openai" => Some(Self::OpenAi),
            "anthropic" => Some(Self::Anthropic),
            "ollama" | "local" => Some(Self::Ollama),
            _ => None,
        }
    }
}

impl std::fmt::Display for BackendId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Request / Reply
// ---------------------------------------------------------------------------

/// Output ceiling applied when the caller does not override it.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1024;

/// Temperature applied when the caller does not override it. Low, because
/// the primary workload is code.
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// A single-turn prompt for one backend. Callers with multi-turn context
/// flatten it into `prompt` first (see [`flatten_turns`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptRequest {
    pub prompt: String,
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// `None` means the adapter applies [`DEFAULT_TEMPERATURE`].
    #[serde(default)]
    pub temperature: Option<f32>,
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_OUTPUT_TOKENS
}

impl PromptRequest {
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            max_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            temperature: None,
        }
    }
}

/// A substitution the resolver performed, surfaced so the host can offer to
/// install the originally requested model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    pub requested: String,
    pub resolved: String,
}

/// Successful result of the uniform send contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    pub backend: BackendId,
    /// The model that actually served the request.
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substitution: Option<Substitution>,
}

// ---------------------------------------------------------------------------
// Conversation turns (owned by the chat collaborator)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One turn of the surrounding chat. This layer never stores turns; it only
/// consumes them as input to [`flatten_turns`] and annotates replies with
/// the backend/model that produced them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
            backend: None,
            model: None,
        }
    }

    pub fn assistant(text: impl Into<String>, backend: BackendId, model: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            text: text.into(),
            backend: Some(backend),
            model: Some(model.into()),
        }
    }
}

/// Collapse multi-turn history into the single prompt string the send
/// contract takes. The backends themselves stay single-turn.
pub fn flatten_turns(turns: &[ConversationTurn]) -> String {
    let mut out = String::new();
    for turn in turns {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        let label = match turn.role {
            TurnRole::User => "User",
            TurnRole::Assistant => "Assistant",
        };
        out.push_str(label);
        out.push_str(": ");
        out.push_str(&turn.text);
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
