//! Retry with linear backoff for page fetches.
//!
//! Every fetch failure except a malformed URL is transient: the attempt is
//! logged as a warning and retried after `backoff_secs * attempt` seconds
//! plus random jitter, until `max_attempts` total attempts have been made.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use shopwatch_core::AppConfig;

use crate::error::ScraperError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Never less than 1.
    pub max_attempts: u32,
    pub backoff_secs: u64,
    pub jitter_ms: u64,
}

impl RetryPolicy {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff_secs: config.retry_backoff_secs,
            jitter_ms: config.retry_jitter_ms,
        }
    }

    /// Delay slept after failed attempt `attempt` (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let base = Duration::from_secs(self.backoff_secs.saturating_mul(u64::from(attempt)));
        let jitter = if self.jitter_ms == 0 {
            0
        } else {
            rand::rng().random_range(0..=self.jitter_ms)
        };
        base + Duration::from_millis(jitter)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            backoff_secs: 2,
            jitter_ms: 500,
        }
    }
}

/// State handed to each attempt of a retried operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    /// 1-based attempt number.
    pub number: u32,
    /// Whether any earlier attempt hit a bot wall.
    pub bot_wall_seen: bool,
}

fn is_retriable(err: &ScraperError) -> bool {
    !matches!(err, ScraperError::InvalidUrl { .. })
}

/// Runs `operation` until it succeeds, fails with a non-retriable error, or
/// `policy.max_attempts` attempts are spent. The last error is returned.
///
/// No delay follows the final attempt.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    url: &str,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut(Attempt) -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = Attempt {
        number: 1,
        bot_wall_seen: false,
    };

    loop {
        let err = match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        tracing::warn!(
            url,
            attempt = attempt.number,
            max_attempts,
            error = %err,
            "fetch attempt failed"
        );
        if !is_retriable(&err) || attempt.number >= max_attempts {
            return Err(err);
        }

        attempt.bot_wall_seen |= matches!(err, ScraperError::BotWall { .. });
        tokio::time::sleep(policy.delay_after(attempt.number)).await;
        attempt.number += 1;
    }
}
