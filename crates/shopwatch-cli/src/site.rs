//! Scraping one site: walk its pages in order, extract records, keep a
//! debug dump of pages where nothing matched.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use scraper::Html;
use shopwatch_core::{ProductRecord, SiteConfig};
use shopwatch_scraper::{
    extract_records, politeness_delay, FetchOptions, PageClient, PageExtraction, Paginator,
    ProfileRegistry,
};
use tokio::sync::mpsc::UnboundedSender;
use url::Url;

/// Counters shared by every site task of a run. They survive a run timeout,
/// unlike the task results themselves.
#[derive(Debug, Default)]
pub(crate) struct RunTally {
    pub pages_fetched: AtomicUsize,
    pub pages_failed: AtomicUsize,
    pub pages_without_cards: AtomicUsize,
}

impl RunTally {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Everything a site task borrows from the run.
pub(crate) struct SiteContext<'a> {
    pub client: &'a PageClient,
    pub registry: &'a ProfileRegistry,
    pub out_dir: &'a Path,
    pub tally: &'a RunTally,
    /// Receives each page's records as soon as they are extracted.
    pub records: UnboundedSender<Vec<ProductRecord>>,
}

/// Scrapes every page of `site`. Never fails: fetch failures end link
/// pagination early and are counted, everything else is logged.
pub(crate) async fn scrape_site(ctx: SiteContext<'_>, site: &SiteConfig) {
    let options = FetchOptions {
        mobile_ua_fallback: site.mobile_ua_fallback,
    };
    let mut paginator = Paginator::new(site);
    let mut site_records = 0usize;

    tracing::info!(
        site = %site.name,
        url = %site.url,
        paging = site.pagination.mode_name(),
        "scraping site"
    );

    while let Some(url) = paginator.next_url() {
        if paginator.page_number() > 1 {
            tokio::time::sleep(politeness_delay(site.sleep_ms)).await;
        }

        let page = ctx.client.fetch_page(&url, options).await;
        let Some(html) = page.html else {
            RunTally::bump(&ctx.tally.pages_failed);
            tracing::warn!(site = %site.name, url = %url, "page skipped after failed fetch");
            paginator.halt();
            continue;
        };
        RunTally::bump(&ctx.tally.pages_fetched);

        let extraction = extract_page(&html, &url, site, ctx.registry, page.fetched_at, &mut paginator);
        if extraction.no_cards() {
            RunTally::bump(&ctx.tally.pages_without_cards);
            keep_debug_html(ctx.out_dir, site, &url, &html);
        }

        tracing::info!(
            site = %site.name,
            url = %url,
            page = paginator.page_number(),
            profile = extraction.profile,
            cards = extraction.cards_found,
            records = extraction.records.len(),
            "page extracted"
        );
        site_records += extraction.records.len();
        if !extraction.records.is_empty() {
            // The receiver lives until the run flushes.
            let _ = ctx.records.send(extraction.records);
        }
    }

    tracing::info!(site = %site.name, records = site_records, "site done");
}

/// Parses `html` once for both pagination and extraction. The parsed
/// document is not `Send` and must not live across an await point.
fn extract_page(
    html: &str,
    url: &Url,
    site: &SiteConfig,
    registry: &ProfileRegistry,
    fetched_at: DateTime<Utc>,
    paginator: &mut Paginator,
) -> PageExtraction {
    let document = Html::parse_document(html);
    paginator.observe_page(url, &document);
    extract_records(&document, url, site, registry, fetched_at, paginator.page_number())
}

fn keep_debug_html(out_dir: &Path, site: &SiteConfig, url: &Url, html: &str) {
    match shopwatch_store::write_diagnostic_html(out_dir, &site.name, html) {
        Ok(path) => tracing::warn!(
            site = %site.name,
            url = %url,
            path = %path.display(),
            "no product cards matched; page saved for selector debugging"
        ),
        Err(e) => tracing::warn!(
            site = %site.name,
            url = %url,
            error = %e,
            "no product cards matched; failed to save page"
        ),
    }
}
