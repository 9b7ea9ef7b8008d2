//! Request pacing for upstream providers: rate quota, timeout and retry backoff.

use std::future::Future;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

use crate::ProviderError;

/// Exponential backoff with optional +/-50% jitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    pub base: Duration,
    pub factor: f64,
    pub max: Duration,
    pub jitter: bool,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(250),
            factor: 2.0,
            max: Duration::from_secs(4),
            jitter: true,
        }
    }
}

impl Backoff {
    /// Delay before retry number `attempt` (0-based).
    pub fn delay(self, attempt: u32) -> Duration {
        let scale = self.factor.powi(attempt as i32);
        let capped = (self.base.as_secs_f64() * scale).min(self.max.as_secs_f64());
        let delay = Duration::from_secs_f64(capped);
        if !self.jitter {
            return delay;
        }

        let half_ms = delay.as_millis() as u64 / 2;
        let offset = fastrand::u64(0..=half_ms * 2);
        Duration::from_millis((delay.as_millis() as u64 + offset).saturating_sub(half_ms))
    }
}

/// Per-provider request policy.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestPolicy {
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub backoff: Backoff,
    pub quota_window: Duration,
    pub quota_limit: u32,
}

impl Default for RequestPolicy {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            max_retries: 2,
            backoff: Backoff::default(),
            quota_window: Duration::from_secs(1),
            quota_limit: 8,
        }
    }
}

impl RequestPolicy {
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Upper bound on one retried call: every attempt timing out plus the
    /// longest jittered backoff between attempts.
    pub fn call_budget(&self) -> Duration {
        let attempts = self.max_retries + 1;
        self.request_timeout * attempts + self.backoff.max.mul_f64(1.5) * self.max_retries
    }

    /// Runs `call` until it succeeds, fails with a non-retryable error, or the
    /// retry budget is spent.
    pub async fn retry<T, F, Fut>(&self, mut call: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(error) if error.retryable() && attempt < self.max_retries => {
                    let delay = self.backoff.delay(attempt);
                    tracing::debug!(attempt, ?delay, error = %error, "retrying upstream call");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Shared rate limiter; concurrent callers wait for budget instead of failing.
#[derive(Clone)]
pub struct RequestThrottle {
    limiter: Arc<DirectRateLimiter>,
}

impl RequestThrottle {
    pub fn new(quota_window: Duration, quota_limit: u32) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::direct(quota_from_window(
                quota_window,
                quota_limit,
            ))),
        }
    }

    pub fn from_policy(policy: &RequestPolicy) -> Self {
        Self::new(policy.quota_window, policy.quota_limit)
    }

    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
    }

    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

fn quota_from_window(quota_window: Duration, quota_limit: u32) -> Quota {
    let burst = NonZeroU32::new(quota_limit.max(1)).unwrap_or(NonZeroU32::MIN);
    let seconds_per_cell = (quota_window.as_secs_f64() / f64::from(burst.get())).max(0.001);

    Quota::with_period(Duration::from_secs_f64(seconds_per_cell))
        .unwrap_or_else(|| Quota::per_second(burst))
        .allow_burst(burst)
}
