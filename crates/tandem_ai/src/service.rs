//! Assistant service — the uniform send contract over all backends.
//!
//! Holds the registry and the probe, wires the probe→resolve→send sequence
//! for the self-hosted backend, and converts every failure into a
//! [`ClassifiedFailure`] the host can render with a remedy.

use std::sync::Arc;

use tracing::{info, warn};

use tandem_core::TandemConfig;

use crate::backends::anthropic::AnthropicBackend;
use crate::backends::ollama::OllamaBackend;
use crate::backends::openai::OpenAiBackend;
use crate::backends::{Backend, BackendError};
use crate::failure::{self, ClassifiedFailure, FailureKind, Remedy};
use crate::inventory::{ModelInventory, OllamaProbe};
use crate::registry::BackendRegistry;
use crate::resolver;
use crate::types::{BackendId, PromptRequest, Reply, Substitution};

/// The service the host calls for all prompt traffic.
pub struct AssistantService {
    registry: BackendRegistry,
    probe: OllamaProbe,
    config: TandemConfig,
}

impl AssistantService {
    /// Build the service from an explicit configuration value.
    ///
    /// All backends are always registered, in a fixed order that doubles as
    /// the host's display order; whether each is configured is a lookup, not
    /// a registration condition.
    pub fn new(config: TandemConfig) -> Self {
        let mut registry = BackendRegistry::new();
        registry.register(Arc::new(OpenAiBackend::new(config.openai_api_key.clone())));
        registry.register(Arc::new(AnthropicBackend::new(
            config.anthropic_api_key.clone(),
        )));
        registry.register(Arc::new(OllamaBackend::new(config.ollama_url.clone())));

        let probe = OllamaProbe::new(config.ollama_url.clone());
        info!("{} backend(s) registered", registry.len());

        Self {
            registry,
            probe,
            config,
        }
    }

    /// Rebuild after a settings change.
    pub fn update_config(&mut self, config: TandemConfig) {
        *self = Self::new(config);
    }

    /// Access the registry (e.g. to render a backend picker).
    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    /// The configured default backend, falling back to the self-hosted one
    /// when the config holds an unknown key.
    pub fn default_backend(&self) -> BackendId {
        BackendId::parse(&self.config.default_backend).unwrap_or(BackendId::Ollama)
    }

    /// The configured default model.
    pub fn default_model(&self) -> &str {
        &self.config.default_model
    }

    /// Fresh inventory snapshot of the self-hosted server.
    pub async fn inventory(&self) -> ModelInventory {
        self.probe.snapshot().await
    }

    /// The uniform send contract: one prompt in, one completion out.
    ///
    /// Sequence: registry lookup → configured check → (self-hosted only)
    /// probe + resolve → adapter send. Any substitution the resolver made is
    /// reported on the reply so the host can offer to install the original.
    pub async fn send(
        &self,
        backend_id: BackendId,
        prompt: &str,
        model: Option<&str>,
    ) -> Result<Reply, ClassifiedFailure> {
        let Some(backend) = self.registry.get(backend_id) else {
            return Err(ClassifiedFailure {
                kind: FailureKind::Unclassified,
                message: format!("backend {backend_id} is not registered"),
                remedy: Remedy::None,
            });
        };

        if !backend.is_configured() {
            return Err(failure::classify(&BackendError::CredentialMissing {
                backend: backend_id,
            }));
        }

        let requested = match model {
            Some(m) => m.to_string(),
            None => self.default_model_for(backend.as_ref()),
        };

        let (resolved, substitution) = if backend_id == BackendId::Ollama {
            let snapshot = self.probe.snapshot().await;
            let outcome = resolver::resolve(&requested, &snapshot)
                .map_err(|e| failure::classify_resolve(&e))?;
            if outcome.was_substituted {
                info!(
                    requested = %outcome.requested_model,
                    resolved = %outcome.resolved_model,
                    "Requested model unavailable; substituted"
                );
                (
                    outcome.resolved_model.clone(),
                    Some(Substitution {
                        requested: outcome.requested_model,
                        resolved: outcome.resolved_model,
                    }),
                )
            } else {
                (outcome.resolved_model, None)
            }
        } else {
            (requested, None)
        };

        let request = PromptRequest::new(prompt, resolved.clone());
        match backend.send(&request).await {
            Ok(text) => Ok(Reply {
                text,
                backend: backend_id,
                model: resolved,
                substitution,
            }),
            Err(e) => {
                warn!(backend = %backend_id, error = %e, "Send failed");
                Err(failure::classify(&e))
            }
        }
    }

    /// The model to use when the caller names none: the configured default
    /// if it belongs to this backend, otherwise the backend's own top
    /// recommendation.
    fn default_model_for(&self, backend: &dyn Backend) -> String {
        if self.default_backend() == backend.id() {
            return self.config.default_model.clone();
        }
        backend
            .supported_models()
            .first()
            .map(|m| (*m).to_string())
            .unwrap_or_else(|| self.config.default_model.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
