//! The `run` command: scrape all sites in a bounded worker pool, then
//! append to history and rebuild the snapshot.
//!
//! Nothing here fails the process. A missing catalog, an unbuildable HTTP
//! client, a run timeout or a panicking site task all end up as log lines,
//! and the output files are still written with whatever was collected.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::Ordering;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use futures::FutureExt;
use shopwatch_core::{AppConfig, Pagination, ProductRecord, SiteConfig};
use shopwatch_scraper::{page_plan, PageClient, ProfileRegistry};
use shopwatch_store::{rebuild_snapshot, HistoryStore};
use tokio::sync::mpsc;

use crate::site::{scrape_site, RunTally, SiteContext};

/// Totals reported at the end of a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct RunSummary {
    pub sites: usize,
    pub pages_fetched: usize,
    pub pages_failed: usize,
    pub pages_without_cards: usize,
    pub records: usize,
    pub snapshot_rows: usize,
    pub timed_out: bool,
}

pub(crate) async fn run_scrape(
    config: &AppConfig,
    site_filter: Option<&str>,
    dry_run: bool,
) -> RunSummary {
    let sites = load_catalog(config, site_filter);

    if dry_run {
        print_plan(&sites);
        return RunSummary {
            sites: sites.len(),
            ..RunSummary::default()
        };
    }

    let (records, mut summary) = scrape_all(config, &sites).await;
    summary.sites = sites.len();
    summary.records = records.len();
    summary.snapshot_rows = flush(config, &records);

    tracing::info!(
        sites = summary.sites,
        pages_fetched = summary.pages_fetched,
        pages_failed = summary.pages_failed,
        pages_without_cards = summary.pages_without_cards,
        records = summary.records,
        snapshot_rows = summary.snapshot_rows,
        timed_out = summary.timed_out,
        "run complete"
    );
    summary
}

fn load_catalog(config: &AppConfig, site_filter: Option<&str>) -> Vec<SiteConfig> {
    let catalog = match shopwatch_core::load_sites(&config.sites_path) {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::error!(error = %e, "cannot load site catalog; writing outputs without scraping");
            return Vec::new();
        }
    };
    if !catalog.rejected.is_empty() {
        tracing::warn!(
            rejected = catalog.rejected.len(),
            "some catalog rows were rejected; run `shopwatch check` for details"
        );
    }

    match site_filter {
        None => catalog.sites,
        Some(name) => {
            let selected: Vec<SiteConfig> = catalog
                .sites
                .into_iter()
                .filter(|s| s.name.eq_ignore_ascii_case(name))
                .collect();
            if selected.is_empty() {
                tracing::warn!(site = name, "no enabled site with this name in the catalog");
            }
            selected
        }
    }
}

fn print_plan(sites: &[SiteConfig]) {
    println!("dry-run: {} site(s)", sites.len());
    for site in sites {
        let plan = page_plan(site);
        println!(
            "{} [{}, up to {} page(s)]",
            site.name,
            site.pagination.mode_name(),
            site.pagination.max_pages()
        );
        for url in plan {
            println!("  {url}");
        }
        if matches!(site.pagination, Pagination::Link { .. }) {
            println!("  (further pages follow each page's next link)");
        }
    }
}

async fn scrape_all(config: &AppConfig, sites: &[SiteConfig]) -> (Vec<ProductRecord>, RunSummary) {
    let mut summary = RunSummary::default();
    if sites.is_empty() {
        return (Vec::new(), summary);
    }

    let client = match PageClient::from_config(config).await {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "cannot build HTTP client; writing outputs without scraping");
            return (Vec::new(), summary);
        }
    };
    tracing::info!(
        backend = client.backend_name(),
        sites = sites.len(),
        max_concurrent = config.max_concurrent_sites,
        "starting run"
    );

    let registry = ProfileRegistry::builtin();
    let tally = RunTally::default();
    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<ProductRecord>>();

    let workers = stream::iter(sites)
        .map(|site| {
            let ctx = SiteContext {
                client: &client,
                registry: &registry,
                out_dir: &config.out_dir,
                tally: &tally,
                records: tx.clone(),
            };
            async move {
                if AssertUnwindSafe(scrape_site(ctx, site))
                    .catch_unwind()
                    .await
                    .is_err()
                {
                    tracing::error!(site = %site.name, "site task panicked; its remaining pages are skipped");
                }
            }
        })
        .buffer_unordered(config.max_concurrent_sites.max(1))
        .collect::<Vec<()>>();

    match config.run_timeout_secs {
        Some(secs) => {
            if tokio::time::timeout(Duration::from_secs(secs), workers)
                .await
                .is_err()
            {
                tracing::warn!(timeout_secs = secs, "run timeout reached; keeping records collected so far");
                summary.timed_out = true;
            }
        }
        None => {
            workers.await;
        }
    }
    drop(tx);

    let mut records = Vec::new();
    while let Ok(batch) = rx.try_recv() {
        records.extend(batch);
    }

    summary.pages_fetched = tally.pages_fetched.load(Ordering::Relaxed);
    summary.pages_failed = tally.pages_failed.load(Ordering::Relaxed);
    summary.pages_without_cards = tally.pages_without_cards.load(Ordering::Relaxed);
    (records, summary)
}

/// Appends `records` and rebuilds the snapshot. Returns the snapshot size,
/// or 0 after logging when the files cannot be written.
fn flush(config: &AppConfig, records: &[ProductRecord]) -> usize {
    let history = HistoryStore::new(config.history_path());
    if let Err(e) = history.append(records) {
        tracing::error!(error = %e, "failed to append history");
    }
    match rebuild_snapshot(&history, &config.snapshot_path()) {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!(error = %e, "failed to rebuild snapshot");
            0
        }
    }
}

#[cfg(test)]
#[path = "run_test.rs"]
mod tests;
