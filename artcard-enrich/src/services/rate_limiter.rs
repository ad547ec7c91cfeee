//! Per-service request spacing
//!
//! Each live client owns one limiter that hands out a single permit per
//! period (no bursts), so consecutive calls to the same service are at
//! least `period` apart.

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::time::Duration;

/// Token bucket with capacity 1 refilled once per `period`
pub struct ServiceRateLimiter {
    service: &'static str,
    period: Duration,
    limiter: DefaultDirectRateLimiter,
}

impl ServiceRateLimiter {
    /// A zero period is raised to 1 ms
    pub fn new(service: &'static str, period: Duration) -> Self {
        let period = period.max(Duration::from_millis(1));
        // with_period only fails on a zero duration
        let quota = Quota::with_period(period).unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN));

        Self {
            service,
            period,
            limiter: RateLimiter::direct(quota),
        }
    }

    pub fn from_millis(service: &'static str, period_ms: u64) -> Self {
        Self::new(service, Duration::from_millis(period_ms))
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Wait until the next request to this service is allowed
    pub async fn acquire(&self) {
        if self.limiter.check().is_err() {
            tracing::debug!(service = self.service, "Rate limiting: waiting for permit");
            self.limiter.until_ready().await;
        }
    }
}
