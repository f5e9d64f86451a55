use dotenvy::dotenv;
use serde::Serialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::engine::{EngineConfig, EngineMode};
use crate::extractor::retry::RetryPolicy;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: String, value: String },
}

/// Deployment configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Passed to yt-dlp `--limit-rate` as is (e.g. "500K")
    pub rate_limit: Option<String>,
    pub max_retries: u32,
    pub retry_delay: Duration,
    /// Per engine call
    pub timeout: Duration,
    pub enable_cache: bool,
    pub cache_ttl: Duration,
    pub batch_concurrency: usize,
    pub ytdlp_mode: EngineMode,
    pub ytdlp_path: Option<String>,
    pub ytdlp_python: Option<String>,
    pub proxy: Option<String>,
    pub cookies_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rate_limit: None,
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            timeout: Duration::from_secs(60),
            enable_cache: true,
            cache_ttl: Duration::from_secs(3600),
            batch_concurrency: 5,
            ytdlp_mode: EngineMode::Auto,
            ytdlp_path: None,
            ytdlp_python: None,
            proxy: None,
            cookies_path: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        let _ = dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Missing or blank keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let retry_delay = match get("RETRY_DELAY") {
            Some(raw) => {
                let seconds: f64 = parse("RETRY_DELAY", &raw)?;
                Duration::try_from_secs_f64(seconds).map_err(|_| invalid("RETRY_DELAY", &raw))?
            }
            None => defaults.retry_delay,
        };

        let ytdlp_mode = match get("YTDLP_MODE") {
            Some(raw) => raw.parse().map_err(|_| invalid("YTDLP_MODE", &raw))?,
            None => defaults.ytdlp_mode,
        };

        Ok(Self {
            rate_limit: get("RATE_LIMIT"),
            max_retries: get_parsed(&get, "MAX_RETRIES")?.unwrap_or(defaults.max_retries),
            retry_delay,
            timeout: get_parsed(&get, "TIMEOUT")?
                .map(|s: u64| Duration::from_secs(s.max(1)))
                .unwrap_or(defaults.timeout),
            enable_cache: match get("ENABLE_CACHE") {
                Some(raw) => parse_bool("ENABLE_CACHE", &raw)?,
                None => defaults.enable_cache,
            },
            cache_ttl: get_parsed(&get, "CACHE_TTL")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.cache_ttl),
            batch_concurrency: get_parsed(&get, "BATCH_CONCURRENCY")?
                .map(|n: usize| n.max(1))
                .unwrap_or(defaults.batch_concurrency),
            ytdlp_mode,
            ytdlp_path: get("YTDLP_PATH"),
            ytdlp_python: get("YTDLP_PYTHON"),
            proxy: get("YTDLP_PROXY"),
            cookies_path: get("YTDLP_COOKIES"),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.retry_delay)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_mode(self.ytdlp_mode)
            .with_binary_path(self.ytdlp_path.clone())
            .with_python(self.ytdlp_python.clone())
            .with_proxy(self.proxy.clone())
            .with_cookies_path(self.cookies_path.clone())
            .with_rate_limit(self.rate_limit.clone())
            .with_timeout(self.timeout.as_secs())
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            rate_limit: self.rate_limit.clone(),
            max_retries: self.max_retries,
            retry_delay_seconds: self.retry_delay.as_secs_f64(),
            timeout_seconds: self.timeout.as_secs(),
            cache_enabled: self.enable_cache,
            cache_ttl_seconds: self.cache_ttl.as_secs(),
            batch_concurrency: self.batch_concurrency,
            engine_mode: self.ytdlp_mode,
            proxy_configured: self.proxy.is_some(),
            cookies_configured: self.cookies_path.is_some(),
        }
    }
}

/// Read-only view of the active settings. Secrets are reduced to flags.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigSnapshot {
    pub rate_limit: Option<String>,
    pub max_retries: u32,
    pub retry_delay_seconds: f64,
    pub timeout_seconds: u64,
    pub cache_enabled: bool,
    pub cache_ttl_seconds: u64,
    pub batch_concurrency: usize,
    pub engine_mode: EngineMode,
    pub proxy_configured: bool,
    pub cookies_configured: bool,
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse<T: FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.parse().map_err(|_| invalid(key, raw))
}

fn get_parsed<T, G>(get: &G, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    get(key).map(|raw| parse(key, &raw)).transpose()
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, raw)),
    }
}
