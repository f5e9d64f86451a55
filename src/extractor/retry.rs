// Bounded exponential-backoff retries

use std::future::Future;
use std::time::Duration;

/// Where a retried call stands: how many attempts ran and the next wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    /// Attempts already made
    pub attempt: u32,
    /// Wait before the next attempt
    pub delay: Duration,
}

impl RetryState {
    fn start() -> Self {
        Self {
            attempt: 0,
            delay: Duration::ZERO,
        }
    }

    /// Advance after a failed attempt. `None` once the budget is spent.
    fn advance(&mut self, policy: &RetryPolicy) -> Option<Duration> {
        self.attempt = self.attempt.saturating_add(1);
        if self.attempt > policy.max_retries {
            return None;
        }
        self.delay = policy.delay_for(self.attempt);
        Some(self.delay)
    }
}

/// The last error of a retried call plus how it ended
#[derive(Debug)]
pub struct RetryFailure<E> {
    pub error: E,
    pub attempts: u32,
    /// True when the budget ran out, false when the error was not retryable
    pub exhausted: bool,
}

/// `max_retries + 1` attempts at most, waiting `base_delay * 2^(k-1)` before
/// attempt `k`. No jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Single attempt, no waiting
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Wait preceding attempt `attempt` (1-based retry number)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 2u32.saturating_pow(attempt - 1);
        self.base_delay.saturating_mul(factor)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Retry on any error and hand back the last one unchanged.
    pub async fn run<T, E, F, Fut>(&self, op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run_classified(op, |_| true).await.map_err(|f| f.error)
    }

    /// Retry while `should_retry` accepts the error.
    pub async fn run_classified<T, E, F, Fut, P>(
        &self,
        mut op: F,
        should_retry: P,
    ) -> Result<T, RetryFailure<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
    {
        let mut state = RetryState::start();

        loop {
            let error = match op().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if !should_retry(&error) {
                return Err(RetryFailure {
                    error,
                    attempts: state.attempt + 1,
                    exhausted: false,
                });
            }

            match state.advance(self) {
                Some(delay) => {
                    tracing::debug!(
                        attempt = state.attempt,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "attempt failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    return Err(RetryFailure {
                        error,
                        attempts: state.attempt,
                        exhausted: true,
                    });
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}
