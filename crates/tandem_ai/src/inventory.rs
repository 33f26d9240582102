//! Liveness & inventory probing for the self-hosted backend.
//!
//! The probe answers two questions per resolution: which models are
//! installed (`/api/tags`) and which are resident in memory (`/api/ps`).
//! Every failure mode — server down, timeout, non-2xx, unparseable body —
//! yields an empty result rather than an error: at this layer "no models"
//! and "server unreachable" are indistinguishable on purpose. The send path
//! surfaces reachability through the failure classifier instead.

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

/// Probe calls must finish inside this ceiling; exceeding it counts as an
/// empty result.
const PROBE_TIMEOUT_SECS: u64 = 5;

// ---------------------------------------------------------------------------
// Wire types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TagsResponse {
    models: Option<Vec<TagEntry>>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
    #[allow(dead_code)]
    size: Option<u64>,
    #[allow(dead_code)]
    modified_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PsResponse {
    models: Option<Vec<PsEntry>>,
}

#[derive(Debug, Deserialize)]
struct PsEntry {
    name: String,
    expires_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Snapshot types
// ---------------------------------------------------------------------------

/// A model currently loaded in server memory, with its eviction deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidentModel {
    pub name: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Point-in-time inventory of the self-hosted server. Built fresh for every
/// resolution (models can be pulled or evicted externally between requests)
/// and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct ModelInventory {
    pub installed: BTreeSet<String>,
    pub resident: Vec<ResidentModel>,
}

impl ModelInventory {
    /// True when nothing is installed (or the server was unreachable).
    pub fn is_empty(&self) -> bool {
        self.installed.is_empty()
    }
}

// ---------------------------------------------------------------------------
// OllamaProbe
// ---------------------------------------------------------------------------

/// Read-only status queries against the self-hosted server.
pub struct OllamaProbe {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaProbe {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(PROBE_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.into(),
            client,
        }
    }

    /// Models installed on the server. Empty on any failure.
    pub async fn installed(&self) -> BTreeSet<String> {
        let url = format!("{}/api/tags", self.base_url.trim_end_matches('/'));
        let resp = match self.client.get(&url).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                debug!("Inventory query returned {}", r.status());
                return BTreeSet::new();
            }
            Err(e) => {
                debug!("Local server not reachable: {e}");
                return BTreeSet::new();
            }
        };

        let data: TagsResponse = match resp.json().await {
            Ok(d) => d,
            Err(e) => {
                debug!("Failed to parse inventory response: {e}");
                return BTreeSet::new();
            }
        };

        data.models
            .unwrap_or_default()
            .into_iter()
            .map(|m| m.name)
            .collect()
    }

    /// Models currently resident in server memory, with expiry. Empty on any
    /// failure.
    pub async fn resident(&self) -> Vec<ResidentModel> {
        let url = format!("{}/api/ps", self.base_url.trim_end_matches('/'));
        let resp = match self.client.get(&url).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                debug!("Resident query returned {}", r.status());
                return Vec::new();
            }
            Err(e) => {
                debug!("Local server not reachable: {e}");
                return Vec::new();
            }
        };

        let data: PsResponse = match resp.json().await {
            Ok(d) => d,
            Err(e) => {
                debug!("Failed to parse resident response: {e}");
                return Vec::new();
            }
        };

        data.models
            .unwrap_or_default()
            .into_iter()
            .map(|m| ResidentModel {
                name: m.name,
                expires_at: m.expires_at,
            })
            .collect()
    }

    /// Fresh snapshot: both queries issued concurrently. The two endpoints
    /// fail independently; a resident-list failure never empties the
    /// installed set.
    pub async fn snapshot(&self) -> ModelInventory {
        let (installed, resident) =
            futures::future::join(self.installed(), self.resident()).await;
        debug!(
            installed = installed.len(),
            resident = resident.len(),
            "Inventory snapshot taken"
        );
        ModelInventory {
            installed,
            resident,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_response_collects_names() {
        let json = r#"{"models":[
            {"name":"codellama:7b","size":3825819519,"modified_at":"2024-05-01T10:00:00Z"},
            {"name":"qwen2.5-coder:7b","size":4431234567,"modified_at":"2024-06-01T10:00:00Z"}
        ]}"#;
        let data: TagsResponse = serde_json::from_str(json).unwrap();
        let names: BTreeSet<String> = data
            .models
            .unwrap_or_default()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert!(names.contains("codellama:7b"));
        assert!(names.contains("qwen2.5-coder:7b"));
    }

    #[test]
    fn tags_response_tolerates_missing_models_field() {
        let data: TagsResponse = serde_json::from_str("{}").unwrap();
        assert!(data.models.is_none());
    }

    #[test]
    fn ps_response_parses_expiry() {
        let json = r#"{"models":[
            {"name":"llama3.2:3b","size":2019393189,"expires_at":"2026-08-06T14:38:31Z"}
        ]}"#;
        let data: PsResponse = serde_json::from_str(json).unwrap();
        let entry = &data.models.unwrap()[0];
        assert_eq!(entry.name, "llama3.2:3b");
        assert!(entry.expires_at.is_some());
    }

    #[tokio::test]
    async fn unreachable_server_yields_empty_snapshot() {
        // Port 9 (discard) on loopback: connection refused, not a hang.
        let probe = OllamaProbe::new("http://127.0.0.1:9");
        let snapshot = probe.snapshot().await;
        assert!(snapshot.is_empty());
        assert!(snapshot.resident.is_empty());
    }

    #[tokio::test]
    async fn probe_calls_are_idempotent() {
        let probe = OllamaProbe::new("http://127.0.0.1:9");
        let first = probe.installed().await;
        let second = probe.installed().await;
        assert_eq!(first, second);
    }

    #[test]
    fn inventory_is_empty_tracks_installed_only() {
        let inventory = ModelInventory {
            installed: BTreeSet::new(),
            resident: vec![ResidentModel {
                name: "ghost:1b".into(),
                expires_at: None,
            }],
        };
        // Resident entries without install records still count as empty.
        assert!(inventory.is_empty());
    }
}
