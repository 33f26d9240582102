//! Ordered backend registry.
//!
//! Registration order is fixed at startup and doubles as the display order
//! the host surfaces, so the registry is Vec-backed rather than map-backed.

use std::sync::Arc;

use tracing::warn;

use crate::backends::Backend;
use crate::types::BackendId;

#[derive(Default)]
pub struct BackendRegistry {
    backends: Vec<Arc<dyn Backend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend. A duplicate id replaces the existing entry in
    /// place, keeping its position in the display order.
    pub fn register(&mut self, backend: Arc<dyn Backend>) {
        let id = backend.id();
        if let Some(existing) = self.backends.iter_mut().find(|b| b.id() == id) {
            warn!(%id, "Backend re-registered; replacing in place");
            *existing = backend;
        } else {
            self.backends.push(backend);
        }
    }

    /// Look up a backend by id.
    pub fn get(&self, id: BackendId) -> Option<Arc<dyn Backend>> {
        self.backends.iter().find(|b| b.id() == id).cloned()
    }

    /// All backends, in registration order.
    pub fn all(&self) -> &[Arc<dyn Backend>] {
        &self.backends
    }

    /// The registration-order subsequence of backends that are currently
    /// configured.
    pub fn configured(&self) -> Vec<Arc<dyn Backend>> {
        self.backends
            .iter()
            .filter(|b| b.is_configured())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::backends::BackendError;
    use crate::types::PromptRequest;

    struct StubBackend {
        id: BackendId,
        configured: bool,
        label: &'static str,
    }

    #[async_trait]
    impl Backend for StubBackend {
        fn id(&self) -> BackendId {
            self.id
        }
        fn display_name(&self) -> &str {
            self.label
        }
        fn supported_models(&self) -> &[&str] {
            &[]
        }
        fn is_configured(&self) -> bool {
            self.configured
        }
        async fn send(&self, _request: &PromptRequest) -> Result<String, BackendError> {
            Ok(self.label.to_string())
        }
    }

    fn stub(id: BackendId, configured: bool, label: &'static str) -> Arc<dyn Backend> {
        Arc::new(StubBackend {
            id,
            configured,
            label,
        })
    }

    #[test]
    fn preserves_registration_order() {
        let mut registry = BackendRegistry::new();
        registry.register(stub(BackendId::OpenAi, false, "a"));
        registry.register(stub(BackendId::Anthropic, true, "b"));
        registry.register(stub(BackendId::Ollama, true, "c"));

        let ids: Vec<BackendId> = registry.all().iter().map(|b| b.id()).collect();
        assert_eq!(
            ids,
            vec![BackendId::OpenAi, BackendId::Anthropic, BackendId::Ollama]
        );
    }

    #[test]
    fn get_by_id() {
        let mut registry = BackendRegistry::new();
        registry.register(stub(BackendId::Ollama, true, "local"));

        assert!(registry.get(BackendId::Ollama).is_some());
        assert!(registry.get(BackendId::OpenAi).is_none());
    }

    #[test]
    fn configured_is_an_ordered_subsequence() {
        let mut registry = BackendRegistry::new();
        registry.register(stub(BackendId::OpenAi, false, "a"));
        registry.register(stub(BackendId::Anthropic, true, "b"));
        registry.register(stub(BackendId::Ollama, true, "c"));

        let ids: Vec<BackendId> = registry.configured().iter().map(|b| b.id()).collect();
        assert_eq!(ids, vec![BackendId::Anthropic, BackendId::Ollama]);
    }

    #[test]
    fn duplicate_registration_replaces_in_place() {
        let mut registry = BackendRegistry::new();
        registry.register(stub(BackendId::OpenAi, false, "old"));
        registry.register(stub(BackendId::Ollama, true, "local"));
        registry.register(stub(BackendId::OpenAi, true, "new"));

        assert_eq!(registry.len(), 2);
        let ids: Vec<BackendId> = registry.all().iter().map(|b| b.id()).collect();
        assert_eq!(ids, vec![BackendId::OpenAi, BackendId::Ollama]);
        let replaced = registry.get(BackendId::OpenAi).unwrap();
        assert_eq!(replaced.display_name(), "new");
        assert!(replaced.is_configured());
    }
}
