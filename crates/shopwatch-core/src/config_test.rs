use std::collections::HashMap;
use std::env::VarError;
use std::path::PathBuf;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

fn build_clean(map: &HashMap<&str, &str>) -> AppConfig {
    let (config, issues) = build_app_config(lookup_from_map(map));
    assert!(issues.is_empty(), "unexpected config issues: {issues:?}");
    config
}

#[test]
fn parse_fetch_backend_known_values() {
    assert_eq!(parse_fetch_backend("auto").unwrap(), FetchBackendKind::Auto);
    assert_eq!(
        parse_fetch_backend("Reqwest").unwrap(),
        FetchBackendKind::Reqwest
    );
    assert_eq!(parse_fetch_backend("CURL").unwrap(), FetchBackendKind::Curl);
}

#[test]
fn parse_fetch_backend_unknown_is_error() {
    let err = parse_fetch_backend("hyper").unwrap_err();
    assert!(
        matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "SHOPWATCH_FETCH_BACKEND"),
        "expected InvalidEnvVar, got: {err:?}"
    );
}

#[test]
fn build_app_config_uses_defaults_when_env_is_empty() {
    let map: HashMap<&str, &str> = HashMap::new();
    let config = build_clean(&map);

    assert_eq!(config.sites_path, PathBuf::from("Sites_Catalog.csv"));
    assert_eq!(config.out_dir, PathBuf::from("out"));
    assert_eq!(config.log_level, "info");
    assert_eq!(config.request_timeout_secs, 45);
    assert_eq!(config.max_attempts, 4);
    assert_eq!(config.retry_backoff_secs, 2);
    assert_eq!(config.retry_jitter_ms, 500);
    assert_eq!(config.mobile_ua_after_attempt, 2);
    assert_eq!(config.max_concurrent_sites, 4);
    assert_eq!(config.host_min_interval_ms, 1000);
    assert!(config.run_timeout_secs.is_none());
    assert_eq!(config.fetch_backend, FetchBackendKind::Auto);
}

#[test]
fn build_app_config_honours_legacy_path_variables() {
    let mut map: HashMap<&str, &str> = HashMap::new();
    map.insert("SITES_CSV_PATH", "catalog/sites.csv");
    map.insert("OUT_DIR", "/tmp/shopwatch-out");
    let config = build_clean(&map);

    assert_eq!(config.sites_path, PathBuf::from("catalog/sites.csv"));
    assert_eq!(config.out_dir, PathBuf::from("/tmp/shopwatch-out"));
}

#[test]
fn build_app_config_prefixed_variable_wins_over_legacy() {
    let mut map: HashMap<&str, &str> = HashMap::new();
    map.insert("SITES_CSV_PATH", "legacy.csv");
    map.insert("SHOPWATCH_SITES_PATH", "sites.yaml");
    let config = build_clean(&map);

    assert_eq!(config.sites_path, PathBuf::from("sites.yaml"));
}

#[test]
fn build_app_config_zero_attempts_is_clamped_to_one() {
    let mut map: HashMap<&str, &str> = HashMap::new();
    map.insert("SHOPWATCH_MAX_ATTEMPTS", "0");
    map.insert("SHOPWATCH_MAX_CONCURRENT_SITES", "0");
    let config = build_clean(&map);

    assert_eq!(config.max_attempts, 1);
    assert_eq!(config.max_concurrent_sites, 1);
}

#[test]
fn build_app_config_run_timeout_is_optional() {
    let mut map: HashMap<&str, &str> = HashMap::new();
    map.insert("SHOPWATCH_RUN_TIMEOUT_SECS", "900");
    let config = build_clean(&map);

    assert_eq!(config.run_timeout_secs, Some(900));
}

#[test]
fn build_app_config_non_numeric_value_keeps_default_and_reports_it() {
    let mut map: HashMap<&str, &str> = HashMap::new();
    map.insert("SHOPWATCH_REQUEST_TIMEOUT_SECS", "soon");
    map.insert("SHOPWATCH_MAX_ATTEMPTS", "abc");
    map.insert("SHOPWATCH_OUT_DIR", "data");
    let (config, issues) = build_app_config(lookup_from_map(&map));

    assert_eq!(config.request_timeout_secs, 45);
    assert_eq!(config.max_attempts, 4);
    assert_eq!(config.out_dir, PathBuf::from("data"));
    let vars: Vec<&str> = issues
        .iter()
        .filter_map(|issue| match issue {
            ConfigError::InvalidEnvVar { var, .. } => Some(var.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(
        vars,
        ["SHOPWATCH_REQUEST_TIMEOUT_SECS", "SHOPWATCH_MAX_ATTEMPTS"]
    );
}

#[test]
fn build_app_config_unknown_backend_falls_back_to_auto() {
    let mut map: HashMap<&str, &str> = HashMap::new();
    map.insert("SHOPWATCH_FETCH_BACKEND", "hyper");
    let (config, issues) = build_app_config(lookup_from_map(&map));

    assert_eq!(config.fetch_backend, FetchBackendKind::Auto);
    assert_eq!(issues.len(), 1);
}

#[test]
fn history_and_snapshot_paths_live_in_out_dir() {
    let mut map: HashMap<&str, &str> = HashMap::new();
    map.insert("SHOPWATCH_OUT_DIR", "data");
    let config = build_clean(&map);

    assert_eq!(
        config.history_path(),
        PathBuf::from("data/products_history.csv")
    );
    assert_eq!(
        config.snapshot_path(),
        PathBuf::from("data/current_snapshot.csv")
    );
}
