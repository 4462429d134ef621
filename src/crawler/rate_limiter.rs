//! Per-host request spacing
//!
//! Backends that fetch from the operator's own network share one limiter.
//! Each host gets its own lock and last-request timestamp. The lock guards
//! only the timing decision: it is released once the wait is over, so spaced
//! fetches to the same host may still overlap in flight.

use crate::state::HostState;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Maximum relative jitter applied to a computed wait
const JITTER: f64 = 0.2;

/// Serializes and spaces requests per host
#[derive(Debug)]
pub struct DomainRateLimiter {
    min_delay: Duration,
    hosts: Mutex<HashMap<String, Arc<tokio::sync::Mutex<HostState>>>>,
}

impl DomainRateLimiter {
    /// Creates a limiter enforcing `min_delay` between request starts per host
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            hosts: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the shared state cell for `host`, creating it on first use
    fn host_state(&self, host: &str) -> Arc<tokio::sync::Mutex<HostState>> {
        let mut hosts = self.hosts.lock().unwrap_or_else(|e| e.into_inner());
        hosts
            .entry(host.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(HostState::new())))
            .clone()
    }

    /// Waits until a request to `host` may start, then records it
    ///
    /// If the previous request started less than `min_delay` ago, sleeps for
    /// the remaining time with ±20% jitter. Two requests to the same host
    /// therefore never start less than `0.8 * min_delay` apart.
    ///
    /// # Returns
    ///
    /// How long this call slept
    pub async fn acquire(&self, host: &str) -> Duration {
        let cell = self.host_state(host);
        let mut state = cell.lock().await;

        let mut waited = Duration::ZERO;
        if let Some(remaining) = state.time_until_next_request(self.min_delay, Instant::now()) {
            let factor = 1.0 + rand::random_range(-JITTER..=JITTER);
            waited = remaining.mul_f64(factor.max(0.0));
            tracing::debug!(host, wait_ms = waited.as_millis() as u64, "rate limiting");
            tokio::time::sleep(waited).await;
        }

        state.record_request(Instant::now());
        waited
    }

    /// Number of requests recorded for `host`
    pub async fn request_count(&self, host: &str) -> u32 {
        self.host_state(host).lock().await.request_count
    }
}
