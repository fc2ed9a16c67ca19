use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, SquariumError};

/// Top-level configuration for Squarium.
///
/// Loaded from `~/.squarium/config.toml` by default. Every section falls back
/// to its defaults when absent, so a partial file is always valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SquariumConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

impl SquariumConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SquariumConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration, falling back to defaults if the file is missing
    /// or unparseable.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| SquariumError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Overlay secrets from the environment.
    ///
    /// `PRODUCT_HUNT_API_KEY`, `GEMINI_API_KEY` and `CRON_SECRET` take
    /// priority over values from the config file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("PRODUCT_HUNT_API_KEY") {
            self.source.api_key = Some(key);
        }
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            self.gemini.api_key = Some(key);
        }
        if let Ok(secret) = std::env::var("CRON_SECRET") {
            self.api.cron_secret = Some(secret);
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory for the SQLite database and the generated cron secret.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// API server bind address.
    pub host: String,
    /// API server port.
    pub port: u16,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.squarium/data".to_string(),
            log_level: "info".to_string(),
            host: "127.0.0.1".to_string(),
            port: 3040,
        }
    }
}

/// Ingestion schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// How far back to fetch source items, in days.
    pub lookback_days: u32,
    /// Run ingestion on an interval while serving.
    pub schedule_enabled: bool,
    /// Hours between scheduled runs.
    pub interval_hours: u32,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            lookback_days: 1,
            schedule_enabled: true,
            interval_hours: 24,
        }
    }
}

/// Upstream launch-feed source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub endpoint: String,
    pub posts_per_fetch: u32,
    pub comments_per_post: u32,
    /// Bearer token. Prefer `PRODUCT_HUNT_API_KEY` over storing it here.
    pub api_key: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.producthunt.com/v2/api/graphql".to_string(),
            posts_per_fetch: 50,
            comments_per_post: 100,
            api_key: None,
        }
    }
}

/// Gemini text generation and embedding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub base_url: String,
    /// Model used for extraction and cluster summaries.
    pub model: String,
    pub embedding_model: String,
    /// Dimension of the zero vector used when embedding fails.
    pub embedding_dim: usize,
    pub api_key: Option<String>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-pro".to_string(),
            embedding_model: "embedding-001".to_string(),
            embedding_dim: 768,
            api_key: None,
        }
    }
}

/// HTTP API settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Bearer secret for the ingestion trigger. Generated on first start if unset.
    pub cron_secret: Option<String>,
}
