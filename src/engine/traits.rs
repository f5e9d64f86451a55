// ExtractionEngine trait and common types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::EngineError;
use crate::extractor::request::{Parameters, ResourceKind};

/// How the yt-dlp program is launched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineMode {
    /// Python module yt_dlp
    Python,
    /// CLI binary yt-dlp
    Cli,
    /// Python module when importable, binary otherwise
    #[default]
    Auto,
}

impl fmt::Display for EngineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Python => write!(f, "python"),
            Self::Cli => write!(f, "cli"),
            Self::Auto => write!(f, "auto"),
        }
    }
}

impl FromStr for EngineMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "python" => Ok(Self::Python),
            "cli" | "binary" => Ok(Self::Cli),
            "auto" | "" => Ok(Self::Auto),
            other => Err(format!("unknown engine mode '{}'", other)),
        }
    }
}

/// Configuration handed to the engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub mode: EngineMode,
    /// Explicit yt-dlp binary path
    pub binary_path: Option<String>,
    /// Python interpreter for module mode
    pub python: Option<String>,
    /// SOCKS5/HTTP proxy URL
    pub proxy: Option<String>,
    /// Path to cookies.txt file
    pub cookies_path: Option<String>,
    /// Throughput cap passed to `--limit-rate` untouched
    pub rate_limit: Option<String>,
    /// Network socket timeout in seconds
    pub socket_timeout_seconds: u64,
    /// Upper bound for one subprocess run in seconds
    pub process_timeout_seconds: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: EngineMode::Auto,
            binary_path: None,
            python: None,
            proxy: None,
            cookies_path: None,
            rate_limit: None,
            socket_timeout_seconds: 30,
            process_timeout_seconds: 300,
        }
    }
}

impl EngineConfig {
    pub fn with_mode(mut self, mode: EngineMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_binary_path(mut self, path: Option<String>) -> Self {
        self.binary_path = path;
        self
    }

    pub fn with_python(mut self, python: Option<String>) -> Self {
        self.python = python;
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_cookies_path(mut self, path: Option<String>) -> Self {
        self.cookies_path = path;
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: Option<String>) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.socket_timeout_seconds = seconds.max(1);
        self.process_timeout_seconds = seconds.max(1);
        self
    }
}

/// The external extraction engine.
///
/// Implementations return the engine's raw JSON untouched; normalization into
/// domain records happens in the extractor.
#[async_trait]
pub trait ExtractionEngine: Send + Sync {
    /// Name of the engine (for logging)
    fn name(&self) -> &'static str;

    /// Lightweight liveness check returning the engine version
    async fn probe_version(&self) -> Result<String, EngineError>;

    /// Fetch the raw record for one resource
    async fn fetch(
        &self,
        kind: ResourceKind,
        url: &str,
        parameters: &Parameters,
    ) -> Result<serde_json::Value, EngineError>;
}
