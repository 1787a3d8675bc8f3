//! Per-host request rate limiting
//!
//! RubyGems.org allows 10 requests per second per client
//! (https://guides.rubygems.org/rubygems-org-rate-limits/). Each host gets
//! its own schedule; callers reserve the next free slot under the lock and
//! then sleep until it arrives, so concurrent callers for one host are
//! spaced out without holding the lock while sleeping.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Default requests per second per host
pub const DEFAULT_RATE_LIMIT: u32 = 10;

pub struct RateLimiter {
    interval: Duration,
    /// Time of the most recently granted slot per host
    last_request: Mutex<HashMap<String, Instant>>,
}

impl RateLimiter {
    /// Allow `requests_per_second` requests per host
    pub fn new(requests_per_second: u32) -> Self {
        Self {
            interval: Duration::from_secs(1) / requests_per_second.max(1),
            last_request: Mutex::new(HashMap::new()),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until a request to `host` is allowed and record it
    pub async fn wait_for_slot(&self, host: &str) {
        let slot = {
            let mut last_request = self
                .last_request
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let now = Instant::now();
            let slot = match last_request.get(host) {
                Some(last) => (*last + self.interval).max(now),
                None => now,
            };
            last_request.insert(host.to_string(), slot);
            slot
        };

        if slot > Instant::now() {
            debug!(host, wait_ms = (slot - Instant::now()).as_millis() as u64, "rate limited");
            tokio::time::sleep_until(slot).await;
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_RATE_LIMIT)
    }
}
