pub mod app_config;
pub mod config;
pub mod error;
pub mod records;
pub mod selector;
pub mod sites;

pub use app_config::{AppConfig, FetchBackendKind};
pub use config::load_app_config;
pub use error::ConfigError;
pub use records::{ProductRecord, StockStatus, HISTORY_COLUMNS};
pub use selector::{FieldSelector, SelectorError};
pub use sites::{load_sites, Pagination, RejectedSite, SiteCatalog, SiteConfig, SiteSelectors};
