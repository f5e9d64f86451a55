// Scripted engine for tests
//
// MockEngine answers fetches from per-URL scripts, can fail a URL a set
// number of times before succeeding, and records every call so tests can
// assert how often the real engine would have been invoked.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::engine::{EngineError, ExtractionEngine};
use crate::extractor::request::{Parameters, ResourceKind};

#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    pub kind: ResourceKind,
    pub url: String,
    pub parameters: Parameters,
}

struct FailureScript {
    remaining: u32,
    error: EngineError,
}

pub struct MockEngine {
    responses: Mutex<HashMap<String, Value>>,
    failures: Mutex<HashMap<String, FailureScript>>,
    calls: Mutex<Vec<MockCall>>,
    version: Option<String>,
    probe_failures: Mutex<u32>,
    probe_calls: AtomicUsize,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Holds one in-flight slot, released on drop so cancelled fetches count down too
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize, high_water: &AtomicUsize) -> Self {
        let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
        high_water.fetch_max(now, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            version: Some("2025.01.01".to_string()),
            probe_failures: Mutex::new(0),
            probe_calls: AtomicUsize::new(0),
            delay: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Raw record returned for `url`
    pub fn with_response(self, url: impl Into<String>, raw: Value) -> Self {
        lock(&self.responses).insert(url.into(), raw);
        self
    }

    /// Fail the next `times` fetches of `url` with `error`
    pub fn with_failures(self, url: impl Into<String>, times: u32, error: EngineError) -> Self {
        lock(&self.failures).insert(url.into(), FailureScript { remaining: times, error });
        self
    }

    /// Fail every fetch of `url`
    pub fn always_failing(self, url: impl Into<String>, error: EngineError) -> Self {
        self.with_failures(url, u32::MAX, error)
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Every version probe fails
    pub fn without_engine(mut self) -> Self {
        self.version = None;
        self
    }

    /// Fail the first `times` version probes
    pub fn with_probe_failures(self, times: u32) -> Self {
        *lock(&self.probe_failures) = times;
        self
    }

    /// Hold every fetch for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn calls_for(&self, url: &str) -> usize {
        lock(&self.calls).iter().filter(|c| c.url == url).count()
    }

    pub fn probe_count(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }

    /// Highest number of fetches observed running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn scripted(&self, url: &str) -> Result<Value, EngineError> {
        if let Some(script) = lock(&self.failures).get_mut(url) {
            if script.remaining > 0 {
                if script.remaining != u32::MAX {
                    script.remaining -= 1;
                }
                return Err(script.error.clone());
            }
        }

        lock(&self.responses)
            .get(url)
            .cloned()
            .ok_or_else(|| EngineError::Unavailable(format!("no scripted response for {}", url)))
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExtractionEngine for MockEngine {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn probe_version(&self) -> Result<String, EngineError> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        {
            let mut failures = lock(&self.probe_failures);
            if *failures > 0 {
                *failures -= 1;
                return Err(EngineError::Timeout(1));
            }
        }
        self.version
            .clone()
            .ok_or_else(|| EngineError::ToolNotFound("yt-dlp".to_string()))
    }

    async fn fetch(
        &self,
        kind: ResourceKind,
        url: &str,
        parameters: &Parameters,
    ) -> Result<Value, EngineError> {
        lock(&self.calls).push(MockCall {
            kind,
            url: url.to_string(),
            parameters: parameters.clone(),
        });

        let _slot = InFlight::enter(&self.in_flight, &self.max_in_flight);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.scripted(url)
    }
}
