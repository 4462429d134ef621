use crate::config::CrawlerConfig;
use crate::crawler::FetchError;
use std::future::Future;
use std::time::Duration;

/// Bounded retry with exponential backoff for one page fetch
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 429 / 403 | cooldown, then backoff `base * 2^attempt`, retry |
/// | HTTP 503, timeout, connect, TLS | backoff `base * 2^attempt`, retry |
/// | Anything else | retry immediately |
/// | Final attempt fails | return the error |
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_retries: u32,
    /// Backoff unit; attempt `n` waits `base_backoff * 2^n`
    pub base_backoff: Duration,
    /// Extra wait before retrying a 429 or 403
    pub cooldown: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff: Duration::from_secs(1),
            cooldown: Duration::from_secs(3),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_backoff: Duration::from_millis(config.retry_base_ms),
            cooldown: Duration::from_millis(config.cooldown_ms),
        }
    }

    /// Exponential backoff for a zero-based attempt number
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.base_backoff.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// How long to wait after `attempt` failed with `error`
    ///
    /// Returns None when `attempt` was the last one allowed.
    pub fn delay_after(&self, attempt: u32, error: &FetchError) -> Option<Duration> {
        if attempt + 1 >= self.attempts() {
            return None;
        }
        if !error.is_transient() {
            return Some(Duration::ZERO);
        }

        let mut delay = self.backoff_for(attempt);
        if error.needs_cooldown() {
            delay += self.cooldown;
        }
        Some(delay)
    }

    fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Runs `op` until it succeeds or the attempt budget is spent
    ///
    /// `op` receives the zero-based attempt number. The error of the final
    /// attempt is returned; earlier errors are only logged.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, FetchError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut attempt = 0;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(error) => match self.delay_after(attempt, &error) {
                    None => return Err(error),
                    Some(delay) => {
                        tracing::debug!(
                            attempt = attempt + 1,
                            max = self.attempts(),
                            delay_ms = delay.as_millis() as u64,
                            "retrying after: {}",
                            error
                        );
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                    }
                },
            }
            attempt += 1;
        }
    }
}
