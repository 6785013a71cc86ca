//! Global rate limiting: a request counter and a 60-second rolling window,
//! plus an unconditional per-request delay.

use std::time::{Duration, Instant};

/// Tracks requests against a per-minute ceiling and an optional fixed delay.
/// Both `rate_limit` and `delay` default to disabled (0).
pub struct RateLimiter {
    rate_limit: u32,
    delay: Duration,
    request_count: u32,
    window_start: Instant,
}

impl RateLimiter {
    pub fn new(rate_limit: u32, delay_secs: f64) -> Self {
        Self {
            rate_limit,
            delay: Duration::from_secs_f64(delay_secs.max(0.0)),
            request_count: 0,
            window_start: Instant::now(),
        }
    }

    /// Waits out whatever politeness controls are configured, then records
    /// the upcoming request against the window. Call once immediately
    /// before each fetch.
    pub async fn wait(&mut self) {
        if self.rate_limit > 0 {
            let elapsed = self.window_start.elapsed();
            if self.request_count >= self.rate_limit {
                if elapsed < Duration::from_secs(60) {
                    tokio::time::sleep(Duration::from_secs(60) - elapsed).await;
                }
                self.request_count = 0;
                self.window_start = Instant::now();
            }
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.request_count += 1;
    }
}
