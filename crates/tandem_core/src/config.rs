use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

// ---------------------------------------------------------------------------
// TandemConfig
// ---------------------------------------------------------------------------

/// Application configuration stored at `~/.tandem/config.json`.
///
/// API keys can also come from the environment (`OPENAI_API_KEY`,
/// `ANTHROPIC_API_KEY`); an environment value wins over the file so headless
/// hosts never need to write a key to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TandemConfig {
    // Credentials (one optional bearer credential per hosted backend)
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,

    // Self-hosted backend
    pub ollama_url: String,

    // Defaults the host starts a chat from
    pub default_backend: String,
    pub default_model: String,

    // General
    pub log_level: String,
}

impl Default for TandemConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            anthropic_api_key: None,
            ollama_url: "http://localhost:11434".into(),
            default_backend: "ollama".into(),
            default_model: "qwen2.5-coder:7b".into(),
            log_level: "info".into(),
        }
    }
}

impl TandemConfig {
    /// Returns the base config directory: `~/.tandem/`
    pub fn base_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".tandem"))
    }

    /// Returns the config file path: `~/.tandem/config.json`
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("config.json"))
    }

    /// Returns the logs directory: `~/.tandem/logs/`
    pub fn logs_dir() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("logs"))
    }

    /// Ensures all required directories exist.
    pub fn ensure_dirs() -> Result<()> {
        for dir in [Self::base_dir()?, Self::logs_dir()?] {
            if !dir.exists() {
                std::fs::create_dir_all(&dir)
                    .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
            }
        }
        Ok(())
    }

    /// Loads config from disk, or creates the default file if missing.
    /// Environment credential overrides are applied after loading.
    pub fn load() -> Result<Self> {
        Self::ensure_dirs()?;
        let path = Self::config_path()?;
        let mut config = Self::load_from_path(&path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load config from a specific file path (no environment overrides).
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let config: Self =
                serde_json::from_str(&content).with_context(|| "Failed to parse config.json")?;
            info!("Loaded config from {}", path.display());
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to_path(path)?;
            info!("Created default config at {}", path.display());
            Ok(config)
        }
    }

    /// Saves config to `~/.tandem/config.json`.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to_path(&path)
    }

    /// Save config to a specific file path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Apply environment credential overrides (`OPENAI_API_KEY`,
    /// `ANTHROPIC_API_KEY`). An empty variable is ignored.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    fn apply_overrides_from(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(v) = get("OPENAI_API_KEY")
            && !v.is_empty()
        {
            self.openai_api_key = Some(v);
        }
        if let Some(v) = get("ANTHROPIC_API_KEY")
            && !v.is_empty()
        {
            self.anthropic_api_key = Some(v);
        }
    }

    /// Set or clear the credential for a hosted backend. Empty strings clear.
    ///
    /// Returns an error for backends that do not take a credential.
    pub fn set_credential(&mut self, backend: &str, value: Option<String>) -> Result<()> {
        let value = value.filter(|v| !v.is_empty());
        match backend {
            "openai" => self.openai_api_key = value,
            "anthropic" => self.anthropic_api_key = value,
            other => bail!("Backend '{other}' does not take a credential"),
        }
        Ok(())
    }

    /// Adopt a recommended default backend/model pair.
    ///
    /// This is the only path that rewrites the configured defaults; nothing
    /// in the load path ever does it implicitly. Hosts call this after the
    /// user accepts a hardware recommendation.
    pub fn adopt_recommendation(&mut self, backend: &str, model: &str) {
        info!(backend, model, "Adopting recommended defaults");
        self.default_backend = backend.to_string();
        self.default_model = model.to_string();
    }
}

// ---------------------------------------------------------------------------
// ConfigHandle
// ---------------------------------------------------------------------------

/// Thread-safe config holder for hosts that keep one loaded config around.
///
/// Mutations go through [`ConfigHandle::update`], which persists the new
/// state to the backing file before returning.
pub struct ConfigHandle {
    config: Arc<RwLock<TandemConfig>>,
    path: PathBuf,
}

impl ConfigHandle {
    /// Load (or create) the config at the default location.
    pub fn load() -> Result<Self> {
        TandemConfig::ensure_dirs()?;
        Self::load_from(TandemConfig::config_path()?)
    }

    /// Load (or create) the config at a specific path.
    pub fn load_from(path: PathBuf) -> Result<Self> {
        let mut config = TandemConfig::load_from_path(&path)?;
        config.apply_env_overrides();
        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            path,
        })
    }

    /// Snapshot of the current config.
    pub fn get(&self) -> TandemConfig {
        self.config.read().clone()
    }

    /// Mutate the config and persist it.
    pub fn update(&self, f: impl FnOnce(&mut TandemConfig)) -> Result<()> {
        let mut config = self.config.write();
        f(&mut config);
        config.save_to_path(&self.path)
    }

    /// Set or clear a hosted backend's credential and persist.
    pub fn set_credential(&self, backend: &str, value: Option<String>) -> Result<()> {
        let mut config = self.config.write();
        config.set_credential(backend, value)?;
        config.save_to_path(&self.path)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
