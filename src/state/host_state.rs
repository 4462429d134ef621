use std::time::Duration;
use tokio::time::Instant;

/// Tracks request timing for one host
///
/// Instants come from `tokio::time`, so a paused test runtime controls them.
#[derive(Debug, Clone, Default)]
pub struct HostState {
    /// Number of requests started against this host
    pub request_count: u32,

    /// When the last request to this host was allowed to start
    pub last_request_time: Option<Instant>,
}

impl HostState {
    /// Creates a new HostState with no recorded requests
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that a request was started at `now`
    pub fn record_request(&mut self, now: Instant) {
        self.request_count += 1;
        self.last_request_time = Some(now);
    }

    /// Calculates the time until the next request can be made
    ///
    /// Returns None if a request can be made now, or the remaining wait otherwise.
    pub fn time_until_next_request(&self, min_delay: Duration, now: Instant) -> Option<Duration> {
        let last = self.last_request_time?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < min_delay {
            Some(min_delay - elapsed)
        } else {
            None
        }
    }
}
