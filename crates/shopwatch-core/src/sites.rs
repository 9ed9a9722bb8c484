//! Site catalog: one row per storefront category page to watch.
//!
//! Rows come from a CSV table (the historical format) or a YAML file with
//! the same keys. Each row is validated into a [`SiteConfig`]; rows that
//! fail validation are reported in [`SiteCatalog::rejected`] and skipped
//! rather than coerced.

use std::collections::HashSet;
use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use url::Url;

use crate::selector::FieldSelector;
use crate::ConfigError;

pub const DEFAULT_SOLDOUT_PATTERN: &str = "out of stock|sold out|غير متوفر|نفد|غير متاح";
pub const DEFAULT_CURRENCY_PATTERN: &str = r"EGP|\bL\.?E\b|ج\.م|جنيه";
pub const DEFAULT_PAGE_PARAM: &str = "page";
pub const DEFAULT_SLEEP_MS: u64 = 1000;
const DEFAULT_MAX_PAGES: u32 = 5;

/// How the listing for one site is split across pages.
#[derive(Debug, Clone)]
pub enum Pagination {
    /// Only the configured URL.
    Single,
    /// `start_page ..= start_page + max_pages - 1` via a query parameter.
    Param {
        page_param: String,
        start_page: u32,
        max_pages: u32,
    },
    /// Follow a "next" link from each fetched page.
    Link {
        next_selector: Option<FieldSelector>,
        max_pages: u32,
    },
}

impl Pagination {
    #[must_use]
    pub fn mode_name(&self) -> &'static str {
        match self {
            Pagination::Single => "none",
            Pagination::Param { .. } => "param",
            Pagination::Link { .. } => "link",
        }
    }

    #[must_use]
    pub fn max_pages(&self) -> u32 {
        match self {
            Pagination::Single => 1,
            Pagination::Param { max_pages, .. } | Pagination::Link { max_pages, .. } => *max_pages,
        }
    }
}

/// Explicit per-site selectors. Every field is optional; unset roles fall
/// back to the platform profiles.
#[derive(Debug, Clone, Default)]
pub struct SiteSelectors {
    pub list: Option<FieldSelector>,
    pub name: Option<FieldSelector>,
    pub price: Option<FieldSelector>,
    pub status: Option<FieldSelector>,
    pub sku: Option<FieldSelector>,
    pub product_url: Option<FieldSelector>,
}

#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub name: String,
    pub url: Url,
    pub selectors: SiteSelectors,
    /// Case-insensitive.
    pub currency_pattern: Regex,
    /// Case-insensitive.
    pub soldout_pattern: Regex,
    pub pagination: Pagination,
    pub sleep_ms: u64,
    pub mobile_ua_fallback: bool,
    pub platform_hint: Option<String>,
}

impl SiteConfig {
    /// Builds a single-page site with all defaults; explicit fields can be
    /// set on the returned value.
    ///
    /// # Errors
    ///
    /// Returns a message when `url` is not an absolute http(s) URL.
    pub fn with_defaults(name: &str, url: &str) -> Result<Self, String> {
        Ok(Self {
            name: name.to_owned(),
            url: parse_site_url(url)?,
            selectors: SiteSelectors::default(),
            currency_pattern: compile_pattern("currency_hint", DEFAULT_CURRENCY_PATTERN)?,
            soldout_pattern: compile_pattern("status_soldout_text", DEFAULT_SOLDOUT_PATTERN)?,
            pagination: Pagination::Single,
            sleep_ms: DEFAULT_SLEEP_MS,
            mobile_ua_fallback: true,
            platform_hint: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedSite {
    /// 1-based position among the data rows.
    pub row: usize,
    pub site_name: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct SiteCatalog {
    pub sites: Vec<SiteConfig>,
    pub rejected: Vec<RejectedSite>,
    pub disabled: usize,
}

/// A cell that may arrive as text, number or boolean depending on the
/// source format.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Cell {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    fn into_text(self) -> String {
        match self {
            Cell::Bool(b) => b.to_string(),
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) => f.to_string(),
            Cell::Text(s) => s,
        }
    }
}

/// Raw catalog row before validation.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SiteRow {
    site_name: Option<Cell>,
    url: Option<Cell>,
    category_url: Option<Cell>,
    list_selector: Option<Cell>,
    name_selector: Option<Cell>,
    price_selector: Option<Cell>,
    status_selector: Option<Cell>,
    sku_selector: Option<Cell>,
    product_url_selector: Option<Cell>,
    product_link_selector: Option<Cell>,
    price_attribute: Option<Cell>,
    currency_hint: Option<Cell>,
    status_soldout_text: Option<Cell>,
    paging_mode: Option<Cell>,
    page_param: Option<Cell>,
    start_page: Option<Cell>,
    max_pages: Option<Cell>,
    next_page_selector: Option<Cell>,
    sleep_ms: Option<Cell>,
    mobile_ua_fallback: Option<Cell>,
    platform_hint: Option<Cell>,
    enabled: Option<Cell>,
}

#[derive(Debug, Deserialize)]
struct SitesFile {
    #[serde(default)]
    sites: Vec<SiteRow>,
}

/// Load and validate the site catalog from a `.csv`, `.yaml` or `.yml` file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read or is not parseable as a
/// whole. Individual invalid rows are reported in [`SiteCatalog::rejected`].
pub fn load_sites(path: &Path) -> Result<SiteCatalog, ConfigError> {
    let display = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CatalogIo {
        path: display.clone(),
        source: e,
    })?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("csv") => parse_sites_csv(&content).map_err(|e| ConfigError::CatalogCsv {
            path: display,
            source: e,
        }),
        Some("yaml" | "yml") => {
            parse_sites_yaml(&content).map_err(|e| ConfigError::CatalogYaml {
                path: display,
                source: e,
            })
        }
        _ => Err(ConfigError::UnsupportedCatalogFormat { path: display }),
    }
}

/// Parses a CSV catalog. A header row is required; unknown columns are
/// ignored and a leading UTF-8 BOM is tolerated.
///
/// # Errors
///
/// Returns `csv::Error` only when the header row itself cannot be read.
pub fn parse_sites_csv(content: &str) -> Result<SiteCatalog, csv::Error> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    reader.headers()?;

    let rows = reader
        .deserialize::<SiteRow>()
        .map(|row| row.map_err(|e| e.to_string()));
    Ok(validate_rows(rows))
}

/// Parses a YAML catalog of the form `sites: [ {site_name: ..., url: ...}, ... ]`.
///
/// # Errors
///
/// Returns `serde_yaml::Error` when the document is not valid YAML or a row
/// has the wrong shape.
pub fn parse_sites_yaml(content: &str) -> Result<SiteCatalog, serde_yaml::Error> {
    let file: SitesFile = serde_yaml::from_str(content)?;
    Ok(validate_rows(file.sites.into_iter().map(Ok)))
}

fn validate_rows<I>(rows: I) -> SiteCatalog
where
    I: Iterator<Item = Result<SiteRow, String>>,
{
    let mut catalog = SiteCatalog::default();
    let mut seen_names = HashSet::new();

    for (idx, row) in rows.enumerate() {
        let row_number = idx + 1;
        let row = match row {
            Ok(row) => row,
            Err(reason) => {
                tracing::warn!(row = row_number, %reason, "skipping unreadable catalog row");
                catalog.rejected.push(RejectedSite {
                    row: row_number,
                    site_name: String::new(),
                    reason,
                });
                continue;
            }
        };

        let site_name = text(row.site_name.clone()).unwrap_or_default();
        match row.into_site() {
            Ok(None) => {
                tracing::debug!(site = %site_name, "site disabled in catalog");
                catalog.disabled += 1;
            }
            Ok(Some(site)) => {
                if seen_names.insert(site.name.to_lowercase()) {
                    catalog.sites.push(site);
                } else {
                    let reason = format!("duplicate site name '{}'", site.name);
                    tracing::warn!(row = row_number, site = %site_name, %reason, "rejecting catalog row");
                    catalog.rejected.push(RejectedSite {
                        row: row_number,
                        site_name,
                        reason,
                    });
                }
            }
            Err(reason) => {
                tracing::warn!(row = row_number, site = %site_name, %reason, "rejecting catalog row");
                catalog.rejected.push(RejectedSite {
                    row: row_number,
                    site_name,
                    reason,
                });
            }
        }
    }

    catalog
}

impl SiteRow {
    /// Validates the row. `Ok(None)` means the row is disabled.
    fn into_site(self) -> Result<Option<SiteConfig>, String> {
        if !parse_bool("enabled", text(self.enabled), true)? {
            return Ok(None);
        }

        let name = text(self.site_name).ok_or("site_name is required")?;
        let url = text(self.url)
            .or_else(|| text(self.category_url))
            .ok_or("url (or category_url) is required")?;
        let url = parse_site_url(&url)?;

        let price = match (
            selector("price_selector", text(self.price_selector))?,
            text(self.price_attribute),
        ) {
            (Some(sel), Some(attr)) => Some(sel.with_attribute(&attr)),
            (sel, None) => sel,
            (None, Some(_)) => {
                return Err("price_attribute requires price_selector".to_owned());
            }
        };

        let selectors = SiteSelectors {
            list: selector("list_selector", text(self.list_selector))?,
            name: selector("name_selector", text(self.name_selector))?,
            price,
            status: selector("status_selector", text(self.status_selector))?,
            sku: selector("sku_selector", text(self.sku_selector))?,
            product_url: selector(
                "product_url_selector",
                text(self.product_url_selector).or_else(|| text(self.product_link_selector)),
            )?,
        };

        let currency_pattern = compile_pattern(
            "currency_hint",
            &text(self.currency_hint).unwrap_or_else(|| DEFAULT_CURRENCY_PATTERN.to_owned()),
        )?;
        let soldout_pattern = compile_pattern(
            "status_soldout_text",
            &text(self.status_soldout_text).unwrap_or_else(|| DEFAULT_SOLDOUT_PATTERN.to_owned()),
        )?;

        let max_pages = text(self.max_pages)
            .map(|raw| parse_count("max_pages", &raw))
            .transpose()?;
        if max_pages == Some(0) {
            return Err("max_pages must be at least 1".to_owned());
        }

        let mode = text(self.paging_mode)
            .unwrap_or_else(|| "none".to_owned())
            .to_ascii_lowercase();
        let pagination = match mode.as_str() {
            "none" | "single" => Pagination::Single,
            "param" | "query" => Pagination::Param {
                page_param: text(self.page_param).unwrap_or_else(|| DEFAULT_PAGE_PARAM.to_owned()),
                start_page: text(self.start_page)
                    .map(|raw| parse_count("start_page", &raw))
                    .transpose()?
                    .unwrap_or(1),
                max_pages: max_pages.unwrap_or(DEFAULT_MAX_PAGES),
            },
            "link" | "next" => Pagination::Link {
                next_selector: selector("next_page_selector", text(self.next_page_selector))?,
                max_pages: max_pages.unwrap_or(DEFAULT_MAX_PAGES),
            },
            other => {
                return Err(format!(
                    "unknown paging_mode '{other}'; expected none, param or link"
                ))
            }
        };

        let sleep_ms = text(self.sleep_ms)
            .map(|raw| parse_count("sleep_ms", &raw).map(u64::from))
            .transpose()?
            .unwrap_or(DEFAULT_SLEEP_MS);

        Ok(Some(SiteConfig {
            name,
            url,
            selectors,
            currency_pattern,
            soldout_pattern,
            pagination,
            sleep_ms,
            mobile_ua_fallback: parse_bool("mobile_ua_fallback", text(self.mobile_ua_fallback), true)?,
            platform_hint: text(self.platform_hint).map(|s| s.to_ascii_lowercase()),
        }))
    }
}

/// Trimmed cell text; blank cells and pandas' `nan` count as unset.
fn text(cell: Option<Cell>) -> Option<String> {
    let value = cell?.into_text();
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

fn selector(column: &str, spec: Option<String>) -> Result<Option<FieldSelector>, String> {
    spec.map(|s| FieldSelector::parse(&s).map_err(|e| format!("{column}: {e}")))
        .transpose()
}

fn compile_pattern(column: &str, pattern: &str) -> Result<Regex, String> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| format!("{column}: invalid pattern: {e}"))
}

fn parse_site_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw.trim()).map_err(|e| format!("url '{raw}' is not valid: {e}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("url '{raw}' must use http or https"));
    }
    Ok(url)
}

/// Accepts `"3"` and the float-formatted `"3.0"` that spreadsheet exports produce.
fn parse_count(column: &str, raw: &str) -> Result<u32, String> {
    if let Ok(n) = raw.parse::<u32>() {
        return Ok(n);
    }
    match raw.parse::<f64>() {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Ok(f) if f.fract() == 0.0 && f >= 0.0 && f <= f64::from(u32::MAX) => Ok(f as u32),
        _ => Err(format!("{column}: '{raw}' is not a non-negative integer")),
    }
}

fn parse_bool(column: &str, raw: Option<String>, default: bool) -> Result<bool, String> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Ok(true),
        "false" | "no" | "n" | "0" => Ok(false),
        _ => Err(format!("{column}: '{raw}' is not a boolean")),
    }
}

#[cfg(test)]
#[path = "sites_test.rs"]
mod tests;
