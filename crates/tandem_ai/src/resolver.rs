//! Model resolution against a live inventory snapshot.
//!
//! Resolution turns a requested model name into one that is provably
//! installed. It is a pure function of its inputs: no probing, no
//! notifications, no side effects. The caller decides what to tell the user
//! about a substitution.

use tracing::debug;

use crate::inventory::ModelInventory;

/// Known-good coding models, walked in order when the requested model is not
/// installed. Encodes preference without coupling the system to any single
/// model's continued existence.
pub const PREFERRED_CODING_MODELS: &[&str] = &[
    "qwen2.5-coder:7b",
    "qwen2.5-coder:1.5b",
    "codellama:7b",
    "deepseek-coder:6.7b",
    "starcoder2:3b",
    "codegemma:7b",
    "llama3.2:3b",
];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ResolveError {
    /// Nothing is installed (or the server was unreachable, which the probe
    /// reports identically). The only failure that aborts before a send.
    #[error("no models are installed on the local server")]
    NoModelAvailable,
}

/// The resolver's answer. `resolved_model` is always a member of the
/// snapshot's installed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionOutcome {
    pub resolved_model: String,
    pub requested_model: String,
    pub was_substituted: bool,
}

/// Resolve `requested` against the snapshot.
///
/// Order: exact match, then the preferred-model walk, then whatever happens
/// to be installed — availability trumps preference. Fails only on an empty
/// inventory.
pub fn resolve(
    requested: &str,
    inventory: &ModelInventory,
) -> Result<ResolutionOutcome, ResolveError> {
    if inventory.installed.contains(requested) {
        return Ok(ResolutionOutcome {
            resolved_model: requested.to_string(),
            requested_model: requested.to_string(),
            was_substituted: false,
        });
    }

    for candidate in PREFERRED_CODING_MODELS {
        if inventory.installed.contains(*candidate) {
            debug!(requested, resolved = candidate, "Substituting preferred model");
            return Ok(ResolutionOutcome {
                resolved_model: (*candidate).to_string(),
                requested_model: requested.to_string(),
                was_substituted: true,
            });
        }
    }

    if let Some(first) = inventory.installed.iter().next() {
        debug!(requested, resolved = %first, "Substituting first installed model");
        return Ok(ResolutionOutcome {
            resolved_model: first.clone(),
            requested_model: requested.to_string(),
            was_substituted: true,
        });
    }

    Err(ResolveError::NoModelAvailable)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn inventory(models: &[&str]) -> ModelInventory {
        ModelInventory {
            installed: models.iter().map(|m| m.to_string()).collect(),
            resident: Vec::new(),
        }
    }

    #[test]
    fn exact_match_is_not_a_substitution() {
        let snapshot = inventory(&["codellama:7b", "llama3.2:3b"]);
        let outcome = resolve("codellama:7b", &snapshot).unwrap();
        assert_eq!(outcome.resolved_model, "codellama:7b");
        assert!(!outcome.was_substituted);
    }

    #[test]
    fn priority_walk_prefers_higher_ranked_model() {
        let snapshot = inventory(&["codellama:7b", "qwen2.5-coder:7b"]);
        let outcome = resolve("nonexistent:1b", &snapshot).unwrap();
        assert_eq!(outcome.resolved_model, "qwen2.5-coder:7b");
        assert!(outcome.was_substituted);
        assert_eq!(outcome.requested_model, "nonexistent:1b");
    }

    #[test]
    fn falls_back_to_whatever_is_installed() {
        // Nothing from the preferred list is present.
        let snapshot = inventory(&["mistral:7b", "gemma2:9b"]);
        let outcome = resolve("nonexistent:1b", &snapshot).unwrap();
        // BTreeSet order: lexicographically first.
        assert_eq!(outcome.resolved_model, "gemma2:9b");
        assert!(outcome.was_substituted);
    }

    #[test]
    fn empty_inventory_fails() {
        let snapshot = inventory(&[]);
        assert_eq!(
            resolve("qwen2.5-coder:7b", &snapshot).unwrap_err(),
            ResolveError::NoModelAvailable
        );
    }

    #[test]
    fn non_empty_inventory_never_fails() {
        let snapshot = inventory(&["anything:1b"]);
        for requested in ["anything:1b", "missing:2b", ""] {
            let outcome = resolve(requested, &snapshot).unwrap();
            assert!(snapshot.installed.contains(&outcome.resolved_model));
        }
    }

    #[test]
    fn resolution_is_idempotent_for_a_snapshot() {
        let snapshot = inventory(&["codellama:7b", "qwen2.5-coder:7b", "llama3.2:3b"]);
        for requested in ["qwen2.5-coder:7b", "missing:1b"] {
            let first = resolve(requested, &snapshot).unwrap();
            let second = resolve(requested, &snapshot).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn substitution_reports_both_names() {
        let snapshot = inventory(&["llama2:latest"]);
        let outcome = resolve("qwen2.5-coder:7b", &snapshot).unwrap();
        assert!(outcome.was_substituted);
        assert_eq!(outcome.requested_model, "qwen2.5-coder:7b");
        assert_eq!(outcome.resolved_model, "llama2:latest");
    }
}
