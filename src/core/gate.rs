/*!
 * Call pacing for homeserver requests
 */

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorRateLimiter,
};
use std::future::Future;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Token bucket with a burst of one: consecutive calls through the same gate
/// are at least `spacing` apart, whether they succeeded or not.
#[derive(Clone)]
pub struct CallGate {
    limiter: Option<Arc<GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock>>>,
    spacing: Duration,
}

impl CallGate {
    /// Create a gate; a zero spacing disables pacing
    pub fn new(spacing: Duration) -> Self {
        let limiter = Quota::with_period(spacing)
            .map(|quota| Arc::new(GovernorRateLimiter::direct(quota.allow_burst(NonZeroU32::MIN))));

        Self { limiter, spacing }
    }

    /// Wait for the next slot
    pub async fn ready(&self) {
        if let Some(ref limiter) = self.limiter {
            limiter.until_ready().await;
        }
    }

    /// Run one remote call once a slot is free
    pub async fn paced<F, Fut, T>(&self, call: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.ready().await;
        call().await
    }

    pub fn is_enabled(&self) -> bool {
        self.limiter.is_some()
    }
}

impl std::fmt::Debug for CallGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallGate")
            .field("spacing", &self.spacing)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
