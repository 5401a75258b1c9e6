//! Minimum-spacing rate limiter for outbound geocoding requests.

use std::time::Duration;

use tokio::time::Instant;

/// Enforces a minimum delay between consecutive calls.
///
/// The delay is measured from the start of one call to the start of the
/// next. The first call never waits.
#[derive(Debug)]
pub struct RateLimiter {
    min_delay: Duration,
    last_call: Option<Instant>,
}

impl RateLimiter {
    /// Creates a limiter that spaces calls by at least `min_delay`.
    #[must_use]
    pub const fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            last_call: None,
        }
    }

    /// The configured minimum spacing.
    #[must_use]
    pub const fn min_delay(&self) -> Duration {
        self.min_delay
    }

    /// Waits until the next call is allowed and records it as started.
    pub async fn acquire(&mut self) {
        if let Some(last) = self.last_call {
            let next = last + self.min_delay;
            if next > Instant::now() {
                log::trace!("Rate limiter sleeping until next slot");
                tokio::time::sleep_until(next).await;
            }
        }
        self.last_call = Some(Instant::now());
    }
}
