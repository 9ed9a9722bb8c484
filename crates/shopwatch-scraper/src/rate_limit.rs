//! Politeness pacing: a per-host minimum interval between request starts,
//! shared by every site that targets the same host, plus the per-site
//! delay between consecutive page fetches.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;

/// Reserves request start slots per host so that two requests to the same
/// host never start closer together than `min_interval`.
#[derive(Debug)]
pub struct HostLimiter {
    min_interval: Duration,
    next_slot: Mutex<HashMap<String, Instant>>,
}

impl HostLimiter {
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: Mutex::new(HashMap::new()),
        }
    }

    /// Waits until `host` may be requested again and reserves the slot.
    pub async fn acquire(&self, host: &str) {
        if self.min_interval.is_zero() {
            return;
        }
        let wait = {
            let mut slots = self.next_slot.lock().unwrap_or_else(PoisonError::into_inner);
            let key = host.to_ascii_lowercase();
            let now = Instant::now();
            let start = slots.get(&key).map_or(now, |&slot| slot.max(now));
            slots.insert(key, start + self.min_interval);
            start.saturating_duration_since(now)
        };
        if !wait.is_zero() {
            tracing::trace!(host, wait_ms = wait.as_millis(), "waiting for host slot");
            tokio::time::sleep(wait).await;
        }
    }
}

/// Delay between consecutive page fetches of one site: `sleep_ms` plus up
/// to half of it again as jitter.
#[must_use]
pub fn politeness_delay(sleep_ms: u64) -> Duration {
    let jitter = if sleep_ms < 2 {
        0
    } else {
        rand::rng().random_range(0..=sleep_ms / 2)
    };
    Duration::from_millis(sleep_ms + jitter)
}
