//! User-agent strings sent with page requests.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Desktop browser strings, rotated round-robin across requests.
pub const DESKTOP_USER_AGENTS: [&str; 4] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
];

/// Sent once a bot wall has been seen and the retry threshold is reached.
pub const MOBILE_USER_AGENT: &str =
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1";

#[derive(Debug, Default)]
pub(crate) struct UserAgentRotation {
    next: AtomicUsize,
}

impl UserAgentRotation {
    pub(crate) fn next_desktop(&self) -> &'static str {
        let index = self.next.fetch_add(1, Ordering::Relaxed);
        DESKTOP_USER_AGENTS[index % DESKTOP_USER_AGENTS.len()]
    }
}
