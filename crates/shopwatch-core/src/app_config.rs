use std::path::PathBuf;

/// Which HTTP transport the fetch layer should use. Resolved once at
/// startup; `Auto` probes for a usable `curl` binary and otherwise uses
/// `reqwest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchBackendKind {
    Auto,
    Reqwest,
    Curl,
}

impl std::fmt::Display for FetchBackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchBackendKind::Auto => write!(f, "auto"),
            FetchBackendKind::Reqwest => write!(f, "reqwest"),
            FetchBackendKind::Curl => write!(f, "curl"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub sites_path: PathBuf,
    pub out_dir: PathBuf,
    pub log_level: String,
    pub request_timeout_secs: u64,
    /// Total attempts per page, including the first one.
    pub max_attempts: u32,
    /// Linear backoff base: the wait after attempt `n` is `retry_backoff_secs * n`.
    pub retry_backoff_secs: u64,
    pub retry_jitter_ms: u64,
    /// 1-based attempt number from which a mobile user-agent replaces the
    /// desktop one once a bot wall has been seen.
    pub mobile_ua_after_attempt: u32,
    pub max_concurrent_sites: usize,
    pub host_min_interval_ms: u64,
    /// `None` disables the run-level timeout.
    pub run_timeout_secs: Option<u64>,
    pub fetch_backend: FetchBackendKind,
}

impl AppConfig {
    #[must_use]
    pub fn history_path(&self) -> PathBuf {
        self.out_dir.join("products_history.csv")
    }

    #[must_use]
    pub fn snapshot_path(&self) -> PathBuf {
        self.out_dir.join("current_snapshot.csv")
    }
}
