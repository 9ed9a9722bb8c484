//! The `snapshot` and `check` commands.

use std::process::ExitCode;

use shopwatch_core::{AppConfig, ConfigError};
use shopwatch_store::HistoryStore;

/// Rebuilds the snapshot from history alone. Failures are logged, never
/// propagated; a missing history yields a header-only pair of files.
pub(crate) fn rebuild_snapshot(config: &AppConfig) {
    let history = HistoryStore::new(config.history_path());
    if let Err(e) = history.append(&[]) {
        tracing::error!(error = %e, "failed to initialise history file");
    }
    match shopwatch_store::rebuild_snapshot(&history, &config.snapshot_path()) {
        Ok(rows) => tracing::info!(
            path = %config.snapshot_path().display(),
            snapshot_rows = rows,
            "snapshot rebuilt"
        ),
        Err(e) => tracing::error!(error = %e, "failed to rebuild snapshot"),
    }
}

/// Validates the environment settings and the catalog, printing one line
/// per invalid setting and per accepted and rejected row. Fails when
/// anything was invalid.
///
/// # Errors
///
/// Returns an error if the catalog file cannot be read or parsed at all.
pub(crate) fn check_catalog(
    config: &AppConfig,
    config_issues: &[ConfigError],
) -> anyhow::Result<ExitCode> {
    for issue in config_issues {
        println!("setting   {issue}");
    }
    let catalog = shopwatch_core::load_sites(&config.sites_path)?;

    for site in &catalog.sites {
        println!(
            "ok        {:<30} {:<6} {}",
            site.name,
            site.pagination.mode_name(),
            site.url
        );
    }
    for rejected in &catalog.rejected {
        println!(
            "rejected  row {:<4} {:<25} {}",
            rejected.row, rejected.site_name, rejected.reason
        );
    }
    println!(
        "{} accepted, {} rejected, {} disabled",
        catalog.sites.len(),
        catalog.rejected.len(),
        catalog.disabled
    );

    Ok(if catalog.rejected.is_empty() && config_issues.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
