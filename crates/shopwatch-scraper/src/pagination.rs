//! Page URL enumeration for one site.
//!
//! A [`Paginator`] is a small state machine driven by the caller:
//!
//! ```text
//! while let Some(url) = paginator.next_url() {
//!     fetch url
//!       ok   -> paginator.observe_page(&url, &html)   (link mode reads "next")
//!       fail -> paginator.halt()                      (link mode stops early)
//! }
//! ```
//!
//! `none` yields the base URL once. `param` rewrites one query parameter
//! for `start_page .. start_page + max_pages` without looking at content.
//! `link` follows the page's "next" link until `max_pages` is reached, no
//! link is found, or the link points at a URL already visited.

use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::Html;
use shopwatch_core::{FieldSelector, Pagination, SiteConfig};
use url::Url;

use crate::profiles::FieldRole;
use crate::resolve::select_value;

const DEFAULT_NEXT_SELECTORS: [&str; 10] = [
    "link[rel=next]@href",
    "a[rel=next]@href",
    ".pagination a.next@href",
    "a.next@href",
    "li.next a@href",
    ".next a@href",
    "a[aria-label=Next]@href",
    ".pagination__next@href",
    "a.action.next@href",
    ".woocommerce-pagination a.next@href",
];

static DEFAULT_NEXT: LazyLock<Vec<FieldSelector>> = LazyLock::new(|| {
    DEFAULT_NEXT_SELECTORS
        .iter()
        .filter_map(|spec| FieldSelector::parse(spec).ok())
        .collect()
});

#[derive(Debug)]
pub struct Paginator {
    pagination: Pagination,
    base: Url,
    issued: u32,
    /// Link mode: the next URL found on the last observed page.
    pending: Option<Url>,
    visited: HashSet<String>,
    halted: bool,
}

impl Paginator {
    #[must_use]
    pub fn new(site: &SiteConfig) -> Self {
        Self::from_parts(site.url.clone(), site.pagination.clone())
    }

    #[must_use]
    pub fn from_parts(base: Url, pagination: Pagination) -> Self {
        Self {
            pagination,
            base,
            issued: 0,
            pending: None,
            visited: HashSet::new(),
            halted: false,
        }
    }

    /// 1-based ordinal of the URL most recently returned by
    /// [`next_url`](Self::next_url); 0 before the first call.
    #[must_use]
    pub fn page_number(&self) -> u32 {
        self.issued
    }

    /// Returns the next page URL, or `None` once the sequence is finished.
    pub fn next_url(&mut self) -> Option<Url> {
        if self.halted || self.issued >= self.pagination.max_pages().max(1) {
            return None;
        }
        let next = match &self.pagination {
            Pagination::Single => (self.issued == 0).then(|| self.base.clone()),
            Pagination::Param {
                page_param,
                start_page,
                ..
            } => Some(with_page_param(
                &self.base,
                page_param,
                start_page.saturating_add(self.issued),
            )),
            Pagination::Link { .. } => {
                if self.issued == 0 {
                    Some(self.base.clone())
                } else {
                    self.pending.take()
                }
            }
        };

        let Some(url) = next else {
            self.halted = true;
            return None;
        };
        if !self.visited.insert(url.as_str().to_owned()) {
            tracing::debug!(url = %url, "next page already visited; stopping");
            self.halted = true;
            return None;
        }
        self.issued += 1;
        Some(url)
    }

    /// Link mode: records the "next" link found on `page`. Other modes
    /// ignore page content.
    pub fn observe_page(&mut self, page_url: &Url, page: &Html) {
        if let Pagination::Link { next_selector, .. } = &self.pagination {
            self.pending = find_next_link(page, page_url, next_selector.as_ref());
            if self.pending.is_none() {
                tracing::debug!(url = %page_url, "no next link; last page");
            }
        }
    }

    /// Stops the sequence after a fetch failure. Only link mode depends on
    /// page content, so `param` keeps going.
    pub fn halt(&mut self) {
        if matches!(self.pagination, Pagination::Link { .. }) {
            self.halted = true;
        }
    }
}

/// URLs known before fetching anything: every `param` page, or just the
/// base URL for the other modes.
#[must_use]
pub fn page_plan(site: &SiteConfig) -> Vec<Url> {
    let mut paginator = Paginator::new(site);
    std::iter::from_fn(|| paginator.next_url()).collect()
}

/// `base` with `param` set to `page`, replacing any existing value.
#[must_use]
pub fn with_page_param(base: &Url, param: &str, page: u32) -> Url {
    let kept: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(key, _)| key != param)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    let mut url = base.clone();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(param, &page.to_string());
    url
}

fn find_next_link(page: &Html, page_url: &Url, explicit: Option<&FieldSelector>) -> Option<Url> {
    let root = page.root_element();
    explicit
        .into_iter()
        .chain(DEFAULT_NEXT.iter())
        .find_map(|selector| select_value(root, selector, FieldRole::Link, page_url))
        .and_then(|href| Url::parse(&href).ok())
        .filter(|url| matches!(url.scheme(), "http" | "https"))
}

#[cfg(test)]
#[path = "pagination_test.rs"]
mod tests;
