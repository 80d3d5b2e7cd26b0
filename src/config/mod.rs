//! Configuration management.
//!
//! Settings come from built-in defaults, an optional TOML file and
//! `SCHOLAR_HARVEST_*` environment variables, in increasing priority:
//!
//! ```toml
//! language = "en"
//! page_delay_ms = 2000
//! max_pages = 50
//!
//! [retry]
//! max_attempts = 4
//! initial_delay_ms = 1000
//! ```
//!
//! Nested keys use a double underscore in the environment, e.g.
//! `SCHOLAR_HARVEST_RETRY__MAX_ATTEMPTS=6`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::models::DEFAULT_LANGUAGE;
use crate::sources::HarvestError;

/// Name of the config file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "scholar-harvest.toml";

const ENV_PREFIX: &str = "SCHOLAR_HARVEST";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/98.0.4758.87 Safari/537.36";

/// Harvest configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Scheme and host of the Scholar instance
    pub base_url: String,

    /// Path of the author-search endpoint
    pub search_path: String,

    /// Browser-like User-Agent sent with every request
    pub user_agent: String,

    /// Interface language (`hl`)
    pub language: String,

    /// Stop after this many pages even if more are offered
    pub max_pages: Option<usize>,

    /// Politeness delay between page requests
    pub page_delay_ms: u64,

    pub request_timeout_secs: u64,

    pub retry: RetrySettings,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            base_url: "https://scholar.google.com".to_string(),
            search_path: "/citations".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            max_pages: None,
            page_delay_ms: 0,
            request_timeout_secs: 30,
            retry: RetrySettings::default(),
        }
    }
}

impl HarvestConfig {
    /// Parsed base URL, used to absolutize profile links
    pub fn base(&self) -> Result<Url, HarvestError> {
        Url::parse(&self.base_url)
            .map_err(|e| HarvestError::Config(format!("invalid base_url {}: {}", self.base_url, e)))
    }

    /// Full URL of the author-search endpoint
    pub fn search_url(&self) -> Result<String, HarvestError> {
        self.base()?
            .join(&self.search_path)
            .map(String::from)
            .map_err(|e| {
                HarvestError::Config(format!("invalid search_path {}: {}", self.search_path, e))
            })
    }

    /// Reject settings the harvest loop cannot work with
    pub fn validate(&self) -> Result<(), HarvestError> {
        self.search_url()?;
        let multiplier = self.retry.backoff_multiplier;
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(HarvestError::Config(format!(
                "retry.backoff_multiplier must be a finite number >= 1.0, got {}",
                multiplier
            )));
        }
        if self.max_pages == Some(0) {
            return Err(HarvestError::Config("max_pages must be positive".to_string()));
        }
        Ok(())
    }
}

/// Retry policy for page fetches
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_delay_ms: 1000,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
        }
    }
}

/// Load configuration from an optional file plus environment overrides
pub fn load_config(path: Option<&Path>) -> Result<HarvestConfig, HarvestError> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config: HarvestConfig = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

/// Find a config file in the working directory or the user config dir
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    let user = dirs::config_dir()?.join("scholar-harvest").join("config.toml");
    user.is_file().then_some(user)
}

/// Write `config` as TOML, creating parent directories
pub fn save_config(config: &HarvestConfig, path: &Path) -> Result<(), HarvestError> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| HarvestError::Config(format!("failed to serialize config: {}", e)))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}
