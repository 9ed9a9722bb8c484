use crate::app_config::{AppConfig, FetchBackendKind};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env
/// vars. Never fails: a variable that cannot be parsed keeps its default
/// and is returned in the issue list so the caller can log it.
#[must_use]
pub fn load_app_config() -> (AppConfig, Vec<ConfigError>) {
    dotenvy::dotenv().ok();
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable is optional. The legacy `SITES_CSV_PATH` and `OUT_DIR`
/// names are honoured when the prefixed variable is absent.
fn build_app_config<F>(lookup: F) -> (AppConfig, Vec<ConfigError>)
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let mut issues = Vec::new();

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let with_legacy = |var: &str, legacy: &str, default: &str| -> String {
        lookup(var)
            .or_else(|_| lookup(legacy))
            .unwrap_or_else(|_| default.to_string())
    };

    let sites_path = PathBuf::from(with_legacy(
        "SHOPWATCH_SITES_PATH",
        "SITES_CSV_PATH",
        "Sites_Catalog.csv",
    ));
    let out_dir = PathBuf::from(with_legacy("SHOPWATCH_OUT_DIR", "OUT_DIR", "out"));
    let log_level = or_default("SHOPWATCH_LOG_LEVEL", "info");

    let request_timeout_secs =
        parse_or_default(&lookup, "SHOPWATCH_REQUEST_TIMEOUT_SECS", 45u64, &mut issues);
    let max_attempts = parse_or_default(&lookup, "SHOPWATCH_MAX_ATTEMPTS", 4u32, &mut issues).max(1);
    let retry_backoff_secs =
        parse_or_default(&lookup, "SHOPWATCH_RETRY_BACKOFF_SECS", 2u64, &mut issues);
    let retry_jitter_ms = parse_or_default(&lookup, "SHOPWATCH_RETRY_JITTER_MS", 500u64, &mut issues);
    let mobile_ua_after_attempt =
        parse_or_default(&lookup, "SHOPWATCH_MOBILE_UA_AFTER_ATTEMPT", 2u32, &mut issues).max(1);
    let max_concurrent_sites =
        parse_or_default(&lookup, "SHOPWATCH_MAX_CONCURRENT_SITES", 4usize, &mut issues).max(1);
    let host_min_interval_ms =
        parse_or_default(&lookup, "SHOPWATCH_HOST_MIN_INTERVAL_MS", 1000u64, &mut issues);
    let run_timeout_secs =
        match parse_or_default(&lookup, "SHOPWATCH_RUN_TIMEOUT_SECS", 0u64, &mut issues) {
            0 => None,
            secs => Some(secs),
        };
    let fetch_backend = parse_fetch_backend(&or_default("SHOPWATCH_FETCH_BACKEND", "auto"))
        .unwrap_or_else(|e| {
            issues.push(e);
            FetchBackendKind::Auto
        });

    let config = AppConfig {
        sites_path,
        out_dir,
        log_level,
        request_timeout_secs,
        max_attempts,
        retry_backoff_secs,
        retry_jitter_ms,
        mobile_ua_after_attempt,
        max_concurrent_sites,
        host_min_interval_ms,
        run_timeout_secs,
        fetch_backend,
    };
    (config, issues)
}

/// Parses `var` if set; an unparseable value is recorded in `issues` and
/// replaced by `default`.
fn parse_or_default<F, T>(lookup: &F, var: &str, default: T, issues: &mut Vec<ConfigError>) -> T
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let Ok(raw) = lookup(var) else {
        return default;
    };
    raw.trim().parse::<T>().unwrap_or_else(|e| {
        issues.push(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        });
        default
    })
}

/// Parse a string into a `FetchBackendKind` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything other than `auto`,
/// `reqwest` or `curl` (case-insensitive).
fn parse_fetch_backend(s: &str) -> Result<FetchBackendKind, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "auto" | "" => Ok(FetchBackendKind::Auto),
        "reqwest" => Ok(FetchBackendKind::Reqwest),
        "curl" => Ok(FetchBackendKind::Curl),
        other => Err(ConfigError::InvalidEnvVar {
            var: "SHOPWATCH_FETCH_BACKEND".to_string(),
            reason: format!("unknown backend '{other}'; expected auto, reqwest or curl"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
