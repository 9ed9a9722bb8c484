//! Page fetching with retry, bot-wall detection and user-agent rotation.

mod agents;
mod bot_wall;
mod transport;

use std::time::Duration;

use chrono::{DateTime, Utc};
use shopwatch_core::{AppConfig, FetchBackendKind};
use url::Url;

use crate::error::ScraperError;
use crate::rate_limit::HostLimiter;
use crate::retry::{retry_with_backoff, Attempt, RetryPolicy};

pub use agents::{DESKTOP_USER_AGENTS, MOBILE_USER_AGENT};
pub use bot_wall::looks_like_bot_wall;

use agents::UserAgentRotation;
use transport::Transport;

/// Construction parameters for [`PageClient`].
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub request_timeout_secs: u64,
    pub retry: RetryPolicy,
    /// 1-based attempt from which the mobile user-agent is sent, once a bot
    /// wall has been seen and the site allows it.
    pub mobile_ua_after_attempt: u32,
    pub backend: FetchBackendKind,
    pub host_min_interval: Duration,
}

impl ClientSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            request_timeout_secs: config.request_timeout_secs,
            retry: RetryPolicy::from_config(config),
            mobile_ua_after_attempt: config.mobile_ua_after_attempt,
            backend: config.fetch_backend,
            host_min_interval: Duration::from_millis(config.host_min_interval_ms),
        }
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: 45,
            retry: RetryPolicy::default(),
            mobile_ua_after_attempt: 2,
            backend: FetchBackendKind::Auto,
            host_min_interval: Duration::from_secs(1),
        }
    }
}

/// Per-site request options.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    pub mobile_ua_fallback: bool,
}

/// Outcome of fetching one listing page. `html` is `None` when every
/// attempt failed; the failure has already been logged.
#[derive(Debug, Clone)]
pub struct PageFetchResult {
    pub url: Url,
    pub html: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

/// Fetches listing pages.
///
/// A 200 response with a non-empty body that does not look like a bot wall
/// is the only success. Everything else is retried per the [`RetryPolicy`].
#[derive(Debug)]
pub struct PageClient {
    transport: Transport,
    retry: RetryPolicy,
    mobile_ua_after_attempt: u32,
    agents: UserAgentRotation,
    limiter: HostLimiter,
}

impl PageClient {
    /// Builds a client, resolving the transport backend once.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the reqwest client cannot be built.
    pub async fn new(settings: ClientSettings) -> Result<Self, ScraperError> {
        let transport = Transport::resolve(settings.backend, settings.request_timeout_secs).await?;
        tracing::debug!(backend = transport.name(), "fetch transport selected");
        Ok(Self {
            transport,
            retry: settings.retry,
            mobile_ua_after_attempt: settings.mobile_ua_after_attempt.max(1),
            agents: UserAgentRotation::default(),
            limiter: HostLimiter::new(settings.host_min_interval),
        })
    }

    /// # Errors
    ///
    /// See [`PageClient::new`].
    pub async fn from_config(config: &AppConfig) -> Result<Self, ScraperError> {
        Self::new(ClientSettings::from_config(config)).await
    }

    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.transport.name()
    }

    /// Fetches `url` and returns its HTML.
    ///
    /// # Errors
    ///
    /// Returns the last attempt's error once retries are exhausted, or
    /// [`ScraperError::InvalidUrl`] immediately for a URL without a host.
    pub async fn fetch(&self, url: &Url, options: FetchOptions) -> Result<String, ScraperError> {
        let host = url.host_str().ok_or_else(|| ScraperError::InvalidUrl {
            url: url.to_string(),
            reason: "URL has no host".to_owned(),
        })?;

        retry_with_backoff(&self.retry, url.as_str(), |attempt| async move {
            self.limiter.acquire(host).await;
            let user_agent = self.user_agent_for(attempt, options);
            let response = self.transport.get(url.as_str(), user_agent).await?;

            if response.status != 200 {
                return Err(ScraperError::UnexpectedStatus {
                    status: response.status,
                    url: url.to_string(),
                });
            }
            if response.body.trim().is_empty() {
                return Err(ScraperError::EmptyBody {
                    url: url.to_string(),
                });
            }
            if looks_like_bot_wall(&response.body) {
                return Err(ScraperError::BotWall {
                    url: url.to_string(),
                });
            }
            Ok(response.body)
        })
        .await
    }

    /// Fetches `url`, folding failure into `html: None`.
    pub async fn fetch_page(&self, url: &Url, options: FetchOptions) -> PageFetchResult {
        let html = match self.fetch(url, options).await {
            Ok(html) => Some(html),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "giving up on page");
                None
            }
        };
        PageFetchResult {
            url: url.clone(),
            html,
            fetched_at: Utc::now(),
        }
    }

    fn user_agent_for(&self, attempt: Attempt, options: FetchOptions) -> &'static str {
        if options.mobile_ua_fallback
            && attempt.bot_wall_seen
            && attempt.number >= self.mobile_ua_after_attempt
        {
            tracing::debug!(attempt = attempt.number, "switching to mobile user-agent");
            MOBILE_USER_AGENT
        } else {
            self.agents.next_desktop()
        }
    }
}
