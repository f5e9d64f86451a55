// Health and configuration reporting

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use super::cache::CacheStats;
use super::orchestrator::Extractor;
use super::retry::RetryPolicy;
use crate::config::ConfigSnapshot;
use crate::engine::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub engine: &'static str,
    pub engine_available: bool,
    pub engine_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_error: Option<String>,
    pub cache: CacheStats,
    pub config: ConfigSnapshot,
}

/// Read-only view over the extractor and the active configuration
pub struct HealthReporter {
    extractor: Arc<Extractor>,
    config: ConfigSnapshot,
}

impl HealthReporter {
    const PROBE_RETRY_DELAY: Duration = Duration::from_millis(250);

    pub fn new(extractor: Arc<Extractor>, config: ConfigSnapshot) -> Self {
        Self { extractor, config }
    }

    pub fn config(&self) -> ConfigSnapshot {
        let mut snapshot = self.config.clone();
        // Reflect runtime toggles of the cache
        snapshot.cache_enabled = self.extractor.cache().is_enabled();
        snapshot
    }

    /// Probe the engine (one retry at most) and snapshot the cache.
    /// Probe failures only mark the report degraded.
    pub async fn health(&self) -> HealthReport {
        let engine = self.extractor.engine();
        let limit = self.extractor.timeout();

        let probe = RetryPolicy::new(1, Self::PROBE_RETRY_DELAY)
            .run(move || async move {
                match tokio::time::timeout(limit, engine.probe_version()).await {
                    Ok(result) => result,
                    Err(_) => Err(EngineError::Timeout(limit.as_secs())),
                }
            })
            .await;

        let (engine_version, engine_error) = match probe {
            Ok(version) => {
                tracing::debug!(engine = engine.name(), version = %version, "engine probe ok");
                (Some(version), None)
            }
            Err(e) => {
                tracing::warn!(engine = engine.name(), error = %e, "engine probe failed");
                (None, Some(e.to_string()))
            }
        };

        let engine_available = engine_version.is_some();
        HealthReport {
            status: if engine_available {
                HealthStatus::Healthy
            } else {
                HealthStatus::Degraded
            },
            engine: engine.name(),
            engine_available,
            engine_version,
            engine_error,
            cache: self.extractor.cache_stats(),
            config: self.config(),
        }
    }
}
