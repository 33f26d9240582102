//! Hardware-aware model recommendations.
//!
//! A pure tier table over coarse resource constraints. Recommendations are
//! advisory only; nothing here is enforced anywhere else in the crate.

use serde::{Deserialize, Serialize};

use crate::types::BackendId;

/// Coarse resource constraints as stated by the user or detected by the
/// host. Input-only, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareProfile {
    pub memory_gb: u32,
    pub has_accelerator: bool,
}

/// A backend/model pair with the reasoning behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub backend: BackendId,
    pub model: String,
    pub rationale: String,
}

// ---------------------------------------------------------------------------
// Tier table
// ---------------------------------------------------------------------------

struct Tier {
    min_memory_gb: u32,
    needs_accelerator: bool,
    model: &'static str,
    rationale: &'static str,
}

/// Highest tier first. The last entry has no requirements, so every profile
/// lands somewhere.
const TIERS: &[Tier] = &[
    Tier {
        min_memory_gb: 32,
        needs_accelerator: true,
        model: "qwen2.5-coder:32b",
        rationale: "32 GB or more with an accelerator fits the full-size coder model",
    },
    Tier {
        min_memory_gb: 16,
        needs_accelerator: true,
        model: "qwen2.5-coder:14b",
        rationale: "16 GB with an accelerator runs the mid-size coder model well",
    },
    Tier {
        min_memory_gb: 8,
        needs_accelerator: false,
        model: "qwen2.5-coder:7b",
        rationale: "8 GB runs the 7B coder model, on CPU if needed",
    },
    Tier {
        min_memory_gb: 0,
        needs_accelerator: false,
        model: "qwen2.5-coder:1.5b",
        rationale: "constrained memory still handles the 1.5B coder model",
    },
];

const CLOUD_ALTERNATIVE: (&str, &str) = (
    "gpt-4o-mini",
    "hosted option when local memory is the bottleneck",
);

fn tier_index(profile: &HardwareProfile) -> usize {
    TIERS
        .iter()
        .position(|t| {
            profile.memory_gb >= t.min_memory_gb
                && (!t.needs_accelerator || profile.has_accelerator)
        })
        .unwrap_or(TIERS.len() - 1)
}

fn recommendation_for(index: usize) -> Recommendation {
    let tier = &TIERS[index];
    Recommendation {
        backend: BackendId::Ollama,
        model: tier.model.to_string(),
        rationale: tier.rationale.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Recommend one self-hosted model for the profile. Total: the lowest tier
/// is the floor, so this never fails.
pub fn recommend(profile: &HardwareProfile) -> Recommendation {
    recommendation_for(tier_index(profile))
}

/// Recommendations for the adjacent tiers plus one cloud option,
/// de-duplicated against the primary recommendation. Lets the host present
/// choices without recomputing tiers.
pub fn alternatives(profile: &HardwareProfile) -> Vec<Recommendation> {
    let index = tier_index(profile);
    let primary = recommendation_for(index);

    let mut out = Vec::new();
    let adjacent = [
        index.checked_sub(1),
        (index + 1 < TIERS.len()).then_some(index + 1),
    ];
    for i in adjacent.into_iter().flatten() {
        let rec = recommendation_for(i);
        if rec.model != primary.model && !out.contains(&rec) {
            out.push(rec);
        }
    }

    let (model, rationale) = CLOUD_ALTERNATIVE;
    out.push(Recommendation {
        backend: BackendId::OpenAi,
        model: model.to_string(),
        rationale: rationale.to_string(),
    });

    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
