// Extraction facade: validate, consult the cache, call the engine through the
// retry policy, normalize, store.

use std::sync::Arc;
use std::time::Duration;

use super::cache::{CacheStats, ResponseCache};
use super::errors::ExtractionError;
use super::models::{DomainRecord, EngagementReport};
use super::request::{ExtractionRequest, ResolvedRequest};
use super::retry::RetryPolicy;
use crate::engine::ExtractionEngine;

/// Shared handle to the cache the facade reads and writes
pub type RecordCache = ResponseCache<DomainRecord>;

pub struct Extractor {
    engine: Arc<dyn ExtractionEngine>,
    cache: Arc<RecordCache>,
    retry: RetryPolicy,
    timeout: Duration,
}

impl Extractor {
    pub fn new(
        engine: Arc<dyn ExtractionEngine>,
        cache: Arc<RecordCache>,
        retry: RetryPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            engine,
            cache,
            retry,
            timeout,
        }
    }

    pub fn engine(&self) -> &Arc<dyn ExtractionEngine> {
        &self.engine
    }

    pub fn cache(&self) -> &Arc<RecordCache> {
        &self.cache
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Extract one resource.
    ///
    /// Malformed input fails before the cache or engine is touched. A cache
    /// hit skips the engine entirely. Retryable failures are retried per the
    /// policy; once the budget is spent the result is `ExhaustedRetries`.
    pub async fn extract(&self, request: &ExtractionRequest) -> Result<Arc<DomainRecord>, ExtractionError> {
        let resolved = request.resolve()?;
        let key = resolved.cache_key();

        if let Some(record) = self.cache.get(&key) {
            tracing::debug!(key = %key, "cache hit");
            return Ok(record);
        }
        tracing::debug!(key = %key, "cache miss");

        let record = self.fetch_with_retry(&resolved).await?;
        self.cache.set(key, record.clone());
        Ok(Arc::new(record))
    }

    /// Engagement analysis of a video, served from the cached record when present
    pub async fn engagement(&self, url: &str) -> Result<EngagementReport, ExtractionError> {
        let record = self.extract(&ExtractionRequest::video(url)).await?;
        record
            .as_video()
            .map(|video| video.engagement_report())
            .ok_or_else(|| ExtractionError::InvalidInput(format!("{} is not a video", url)))
    }

    async fn fetch_with_retry(&self, resolved: &ResolvedRequest) -> Result<DomainRecord, ExtractionError> {
        let engine = &self.engine;
        let limit = self.timeout;

        let outcome = self
            .retry
            .run_classified(
                move || async move { fetch_once(engine.as_ref(), resolved, limit).await },
                ExtractionError::is_retryable,
            )
            .await;

        match outcome {
            Ok(record) => Ok(record),
            Err(failure) if failure.exhausted => {
                tracing::warn!(
                    kind = %resolved.kind,
                    identifier = %resolved.identifier,
                    attempts = failure.attempts,
                    reason = failure.error.blocking_reason().map(|r| r.description()),
                    error = %failure.error,
                    "extraction failed after retries"
                );
                Err(ExtractionError::ExhaustedRetries {
                    attempts: failure.attempts,
                    last: Box::new(failure.error),
                })
            }
            Err(failure) => {
                tracing::warn!(
                    kind = %resolved.kind,
                    identifier = %resolved.identifier,
                    error = %failure.error,
                    "extraction failed, not retrying"
                );
                Err(failure.error)
            }
        }
    }
}

/// One engine call bounded by `limit`, normalized on success
async fn fetch_once(
    engine: &dyn ExtractionEngine,
    resolved: &ResolvedRequest,
    limit: Duration,
) -> Result<DomainRecord, ExtractionError> {
    let call = engine.fetch(resolved.kind, &resolved.engine_url, &resolved.parameters);
    let raw = match tokio::time::timeout(limit, call).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(ExtractionError::EngineTimeout {
                seconds: limit.as_secs(),
            })
        }
    };
    Ok(DomainRecord::normalize(resolved, &raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineError;
    use crate::extractor::errors::ErrorKind;
    use crate::testing::MockEngine;
    use serde_json::json;

    const URL: &str = "https://x/watch?v=abc";

    fn video_raw() -> serde_json::Value {
        json!({ "id": "abc", "title": "t", "view_count": 1000, "like_count": 50, "comment_count": 25 })
    }

    fn extractor(engine: Arc<MockEngine>, cache_enabled: bool, retry: RetryPolicy) -> Extractor {
        Extractor::new(
            engine,
            Arc::new(ResponseCache::new(Duration::from_secs(3600), cache_enabled)),
            retry,
            Duration::from_secs(60),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_video_normalized_and_cached_for_ttl() {
        let engine = Arc::new(MockEngine::new().with_response(URL, video_raw()));
        let ex = extractor(engine.clone(), true, RetryPolicy::default());

        let record = ex.extract(&ExtractionRequest::video(URL)).await.unwrap();
        let video = record.as_video().unwrap();
        assert_eq!(video.engagement.like_to_view_ratio, 0.05);
        assert_eq!(video.engagement.comment_to_view_ratio, 0.025);
        assert_eq!(ex.cache_stats().keys, vec!["video:abc".to_string()]);

        // Second call is a hit
        ex.extract(&ExtractionRequest::video(URL)).await.unwrap();
        assert_eq!(engine.call_count(), 1);

        tokio::time::advance(Duration::from_secs(3599)).await;
        assert!(ex.cache().get("video:abc").is_some());
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(ex.cache().get("video:abc").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_cache_calls_engine_every_time() {
        let engine = Arc::new(MockEngine::new().with_response(URL, video_raw()));
        let ex = extractor(engine.clone(), false, RetryPolicy::default());

        ex.extract(&ExtractionRequest::video(URL)).await.unwrap();
        ex.extract(&ExtractionRequest::video(URL)).await.unwrap();
        assert_eq!(engine.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_input_never_reaches_engine() {
        let engine = Arc::new(MockEngine::new());
        let ex = extractor(engine.clone(), true, RetryPolicy::default());

        let err = ex.extract(&ExtractionRequest::video("not a url")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(engine.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_recover_within_budget() {
        let engine = Arc::new(
            MockEngine::new()
                .with_response(URL, video_raw())
                .with_failures(URL, 2, EngineError::from("ERROR: HTTP Error 429: Too Many Requests")),
        );
        let ex = extractor(engine.clone(), true, RetryPolicy::new(2, Duration::from_secs(1)));

        assert!(ex.extract(&ExtractionRequest::video(URL)).await.is_ok());
        assert_eq!(engine.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_budget_reports_attempts() {
        let engine = Arc::new(MockEngine::new().always_failing(URL, EngineError::from("ERROR: HTTP Error 500")));
        let ex = extractor(engine.clone(), true, RetryPolicy::new(2, Duration::from_millis(100)));

        let err = ex.extract(&ExtractionRequest::video(URL)).await.unwrap_err();
        match err {
            ExtractionError::ExhaustedRetries { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(engine.call_count(), 3);
        assert_eq!(ex.cache_stats().size, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_engine_error_not_retried() {
        let engine = Arc::new(
            MockEngine::new().always_failing(URL, EngineError::from("ERROR: [youtube] abc: Private video")),
        );
        let ex = extractor(engine.clone(), true, RetryPolicy::new(3, Duration::from_secs(1)));

        let err = ex.extract(&ExtractionRequest::video(URL)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EngineFailure);
        assert_eq!(engine.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_engine_times_out_and_consumes_attempts() {
        let engine = Arc::new(
            MockEngine::new()
                .with_response(URL, video_raw())
                .with_delay(Duration::from_secs(120)),
        );
        let ex = extractor(engine.clone(), true, RetryPolicy::new(1, Duration::from_secs(1)));

        let err = ex.extract(&ExtractionRequest::video(URL)).await.unwrap_err();
        match err {
            ExtractionError::ExhaustedRetries { attempts, last } => {
                assert_eq!(attempts, 2);
                assert_eq!(last.kind(), ErrorKind::EngineTimeout);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_engagement_uses_cached_video() {
        let engine = Arc::new(MockEngine::new().with_response(URL, video_raw()));
        let ex = extractor(engine.clone(), true, RetryPolicy::default());

        ex.extract(&ExtractionRequest::video(URL)).await.unwrap();
        let report = ex.engagement(URL).await.unwrap();
        assert_eq!(report.like_rate, 5.0);
        assert_eq!(engine.call_count(), 1);
    }
}
