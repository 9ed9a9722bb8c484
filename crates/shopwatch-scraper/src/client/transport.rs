//! HTTP transport strategies. One is chosen at startup and used for every
//! request of the run.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL};
use shopwatch_core::FetchBackendKind;

use crate::error::ScraperError;

pub(crate) const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
pub(crate) const ACCEPT_LANGUAGE_VALUE: &str = "en-US,en;q=0.9,ar;q=0.8";
pub(crate) const CACHE_CONTROL_VALUE: &str = "no-cache";

const CONNECT_TIMEOUT_SECS: u64 = 10;
const MAX_BODY_BYTES: &str = "10485760";
/// Separates the body from the status code `curl -w` appends.
const STATUS_TRAILER: &str = "\n__shopwatch_status__:";

/// Status and body of one GET.
#[derive(Debug)]
pub(crate) struct RawResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug)]
pub(crate) enum Transport {
    Reqwest(reqwest::Client),
    /// `curl` subprocess; its TLS fingerprint passes some bot walls that
    /// reject rustls.
    Curl { timeout_secs: u64 },
}

impl Transport {
    /// Resolves the configured backend. `Auto` probes for a working `curl`
    /// once and otherwise uses reqwest.
    pub(crate) async fn resolve(
        kind: FetchBackendKind,
        timeout_secs: u64,
    ) -> Result<Self, ScraperError> {
        match kind {
            FetchBackendKind::Reqwest => Self::reqwest(timeout_secs),
            FetchBackendKind::Curl => Ok(Self::Curl { timeout_secs }),
            FetchBackendKind::Auto => {
                if curl_available().await {
                    Ok(Self::Curl { timeout_secs })
                } else {
                    tracing::info!("curl not available; using reqwest transport");
                    Self::reqwest(timeout_secs)
                }
            }
        }
    }

    pub(crate) fn reqwest(timeout_secs: u64) -> Result<Self, ScraperError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL_VALUE));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS.min(timeout_secs.max(1))))
            .default_headers(headers)
            .build()?;
        Ok(Self::Reqwest(client))
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Reqwest(_) => "reqwest",
            Self::Curl { .. } => "curl",
        }
    }

    pub(crate) async fn get(&self, url: &str, user_agent: &str) -> Result<RawResponse, ScraperError> {
        match self {
            Self::Reqwest(client) => {
                let response = client
                    .get(url)
                    .header(reqwest::header::USER_AGENT, user_agent)
                    .send()
                    .await?;
                let status = response.status().as_u16();
                let body = response.text().await?;
                Ok(RawResponse { status, body })
            }
            Self::Curl { timeout_secs } => curl_get(url, user_agent, *timeout_secs).await,
        }
    }
}

async fn curl_available() -> bool {
    tokio::process::Command::new("curl")
        .arg("--version")
        .output()
        .await
        .is_ok_and(|output| output.status.success())
}

async fn curl_get(url: &str, user_agent: &str, timeout_secs: u64) -> Result<RawResponse, ScraperError> {
    let output = tokio::process::Command::new("curl")
        .arg("-sS")
        .arg("-L")
        .arg("--compressed")
        .arg("--proto")
        .arg("=https,http")
        .arg("--max-filesize")
        .arg(MAX_BODY_BYTES)
        .arg("--max-time")
        .arg(timeout_secs.to_string())
        .arg("--user-agent")
        .arg(user_agent)
        .arg("-H")
        .arg(format!("Accept: {ACCEPT_HTML}"))
        .arg("-H")
        .arg(format!("Accept-Language: {ACCEPT_LANGUAGE_VALUE}"))
        .arg("-H")
        .arg(format!("Cache-Control: {CACHE_CONTROL_VALUE}"))
        .arg("-w")
        .arg(format!("{STATUS_TRAILER}%{{http_code}}"))
        .arg(url)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| ScraperError::Transport {
            url: url.to_owned(),
            reason: format!("failed to spawn curl: {e}"),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ScraperError::Transport {
            url: url.to_owned(),
            reason: format!("curl exited with {}: {}", output.status, stderr.trim()),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    split_status_trailer(&stdout).ok_or_else(|| ScraperError::Transport {
        url: url.to_owned(),
        reason: "curl output is missing the status trailer".to_owned(),
    })
}

fn split_status_trailer(stdout: &str) -> Option<RawResponse> {
    let (body, status) = stdout.rsplit_once(STATUS_TRAILER)?;
    let status = status.trim().parse::<u16>().ok()?;
    Some(RawResponse {
        status,
        body: body.to_owned(),
    })
}
