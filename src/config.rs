//! Configuration management for `WeatherBrief`
//!
//! Loads the location and provider settings from `config.json`, the
//! language model credential from the environment, and validates the
//! optional tuning sections.

use crate::{BriefError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Fixed name of the configuration file inside the working directory
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Environment variable holding the language model API key
pub const API_KEY_ENV_VAR: &str = "OPENAI_KEY";

/// Root configuration for a single run
#[derive(Debug, Clone)]
pub struct BriefConfig {
    /// Forecast endpoint of the weather provider
    pub api_url: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Language model API key
    pub api_key: String,
    /// Timezone passed to the weather provider (provider default is GMT)
    pub timezone: Option<String>,
    /// Response cache settings
    pub cache: CacheConfig,
    /// Weather transport retry settings
    pub retry: RetryConfig,
    /// Language model settings
    pub llm: LlmConfig,
}

/// On-disk shape of `config.json`
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    api_url: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    timezone: Option<String>,
    #[serde(default)]
    cache: CacheConfig,
    #[serde(default)]
    retry: RetryConfig,
    #[serde(default)]
    llm: LlmConfig,
}

/// Response cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Cache directory, relative to the working directory unless absolute
    #[serde(default = "default_cache_location")]
    pub location: String,
    /// Time-to-live of cached responses in seconds
    #[serde(default = "default_cache_ttl")]
    pub ttl_seconds: u64,
}

/// Weather transport retry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base backoff delay in milliseconds, doubled per retry
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

/// Language model configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_llm_temperature")]
    pub temperature: f32,
    #[serde(default = "default_llm_timeout")]
    pub timeout_seconds: u64,
}

// Default value functions
fn default_cache_location() -> String {
    ".cache".to_string()
}

fn default_cache_ttl() -> u64 {
    3600
}

fn default_max_retries() -> u32 {
    5
}

fn default_backoff_base_ms() -> u64 {
    200
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-3.5-turbo-instruct".to_string()
}

fn default_llm_max_tokens() -> u32 {
    256
}

fn default_llm_temperature() -> f32 {
    0.7
}

fn default_llm_timeout() -> u64 {
    60
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            location: default_cache_location(),
            ttl_seconds: default_cache_ttl(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            max_tokens: default_llm_max_tokens(),
            temperature: default_llm_temperature(),
            timeout_seconds: default_llm_timeout(),
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    /// Resolve the cache directory against the working directory
    #[must_use]
    pub fn resolve_location(&self, working_dir: &Path) -> PathBuf {
        let location = PathBuf::from(&self.location);
        if location.is_absolute() {
            location
        } else {
            working_dir.join(location)
        }
    }
}

impl BriefConfig {
    /// Load configuration from `dir`, reading the credential from the process environment
    pub fn load(dir: &Path) -> Result<Self> {
        Self::load_with_env(dir, |name| std::env::var(name).ok())
    }

    /// Load configuration from `dir` with an explicit environment lookup
    pub fn load_with_env<F>(dir: &Path, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = dir.join(CONFIG_FILE_NAME);
        let contents = std::fs::read_to_string(&path).map_err(|e| {
            BriefError::config(format!("Failed to read {}: {e}", path.display()))
        })?;

        let file: ConfigFile = serde_json::from_str(&contents).map_err(|e| {
            BriefError::config(format!("Failed to parse {}: {e}", path.display()))
        })?;

        let api_key = env(API_KEY_ENV_VAR)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                BriefError::credential(format!("Environment variable {API_KEY_ENV_VAR} is not set"))
            })?;

        let config = Self {
            api_url: file.api_url,
            latitude: file.latitude,
            longitude: file.longitude,
            api_key,
            timezone: file.timezone,
            cache: file.cache,
            retry: file.retry,
            llm: file.llm,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_urls()?;
        self.validate_numeric_ranges()?;
        Ok(())
    }

    fn validate_urls(&self) -> Result<()> {
        for (name, url) in [("api_url", &self.api_url), ("llm.base_url", &self.llm.base_url)] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(BriefError::config(format!(
                    "{name} must be a valid HTTP or HTTPS URL, got '{url}'"
                )));
            }
        }
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.retry.max_retries > 10 {
            return Err(BriefError::config("retry.max_retries cannot exceed 10"));
        }

        if self.cache.ttl_seconds > 7 * 24 * 60 * 60 {
            return Err(BriefError::config(
                "cache.ttl_seconds cannot exceed 604800 (1 week)",
            ));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(BriefError::config(
                "llm.temperature must be between 0.0 and 2.0",
            ));
        }

        Ok(())
    }
}
