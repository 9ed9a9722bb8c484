use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Column order of the history and snapshot files.
pub const HISTORY_COLUMNS: [&str; 11] = [
    "timestamp_iso",
    "site_name",
    "product_name",
    "sku",
    "product_url",
    "status",
    "price_value",
    "currency",
    "raw_price_text",
    "source_url",
    "notes",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockStatus {
    Available,
    #[serde(rename = "Sold Out", alias = "SoldOut")]
    SoldOut,
    Unknown,
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockStatus::Available => write!(f, "Available"),
            StockStatus::SoldOut => write!(f, "Sold Out"),
            StockStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

/// One product observation from one listing page. Field order matches
/// [`HISTORY_COLUMNS`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(rename = "timestamp_iso")]
    pub timestamp: DateTime<Utc>,
    pub site_name: String,
    pub product_name: String,
    #[serde(default)]
    pub sku: String,
    /// Absolute URL, or empty when the card carried no link.
    #[serde(default)]
    pub product_url: String,
    pub status: StockStatus,
    pub price_value: Option<f64>,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub raw_price_text: String,
    /// Listing page the record was extracted from.
    pub source_url: String,
    #[serde(default)]
    pub notes: String,
}

impl ProductRecord {
    /// Snapshot key: one current row per `(site_name, product_url)`.
    #[must_use]
    pub fn key(&self) -> (&str, &str) {
        (&self.site_name, &self.product_url)
    }
}
