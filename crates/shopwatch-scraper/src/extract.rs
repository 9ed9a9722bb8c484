//! Turns one fetched listing page into product records.

use chrono::{DateTime, Utc};
use regex::Regex;
use scraper::Html;
use shopwatch_core::{ProductRecord, SiteConfig, StockStatus};
use url::Url;

use crate::profiles::{FieldRole, ProfileRegistry};
use crate::resolve::{resolve_cards, FieldResolver};
use crate::text::{normalize_whitespace, parse_price};

/// Records from one page plus what was needed to find them.
#[derive(Debug, Clone)]
pub struct PageExtraction {
    pub records: Vec<ProductRecord>,
    /// `"explicit"`, a profile name, or `"none"` when no card matched.
    pub profile: &'static str,
    pub cards_found: usize,
    /// Cards with neither a name nor a product URL.
    pub dropped: usize,
}

impl PageExtraction {
    #[must_use]
    pub fn no_cards(&self) -> bool {
        self.cards_found == 0
    }
}

/// Extracts every usable product card on `page`.
///
/// All records share `fetched_at` and carry `profile=<name>; page=<n>` in
/// their notes.
#[must_use]
pub fn extract_records(
    page: &Html,
    page_url: &Url,
    site: &SiteConfig,
    registry: &ProfileRegistry,
    fetched_at: DateTime<Utc>,
    page_number: u32,
) -> PageExtraction {
    let found = resolve_cards(
        page,
        site.selectors.list.as_ref(),
        site.platform_hint.as_deref(),
        registry,
    );
    let resolver = FieldResolver::new(page, page_url, registry, found.profile);
    let notes = format!("profile={}; page={page_number}", found.matched_by);
    let selectors = &site.selectors;

    let mut records = Vec::with_capacity(found.cards.len());
    let mut dropped = 0;
    for &card in &found.cards {
        let name = resolver.resolve(card, FieldRole::Name, selectors.name.as_ref());
        let product_url = resolver.resolve(card, FieldRole::Link, selectors.product_url.as_ref());
        if name.is_none() && product_url.is_none() {
            dropped += 1;
            continue;
        }

        let raw_price = resolver
            .resolve(card, FieldRole::Price, selectors.price.as_ref())
            .unwrap_or_default();
        let status_text = resolver
            .resolve(card, FieldRole::Status, selectors.status.as_ref())
            .unwrap_or_default();
        let sku = resolver
            .resolve(card, FieldRole::Sku, selectors.sku.as_ref())
            .unwrap_or_default();

        let price = parse_price(&raw_price, &site.currency_pattern);
        let status = classify_status(&status_text, &price.raw_text, &site.soldout_pattern);

        records.push(ProductRecord {
            timestamp: fetched_at,
            site_name: site.name.clone(),
            product_name: name.unwrap_or_default(),
            sku,
            product_url: product_url.unwrap_or_default(),
            status,
            price_value: price.value,
            currency: price.currency,
            raw_price_text: price.raw_text,
            source_url: page_url.to_string(),
            notes: notes.clone(),
        });
    }

    if dropped > 0 {
        tracing::debug!(
            site = %site.name,
            url = %page_url,
            dropped,
            "dropped cards without name or link"
        );
    }

    PageExtraction {
        records,
        profile: found.matched_by,
        cards_found: found.cards.len(),
        dropped,
    }
}

/// Sold-out text wins; otherwise any price text means available.
#[must_use]
pub fn classify_status(status_text: &str, raw_price: &str, soldout: &Regex) -> StockStatus {
    if !status_text.is_empty() && soldout.is_match(status_text) {
        StockStatus::SoldOut
    } else if !normalize_whitespace(raw_price).is_empty() {
        StockStatus::Available
    } else {
        StockStatus::Unknown
    }
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
