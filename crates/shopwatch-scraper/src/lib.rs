pub mod client;
pub mod error;
pub mod extract;
pub mod pagination;
pub mod profiles;
pub mod rate_limit;
pub mod resolve;
pub mod retry;
pub mod text;

pub use client::{ClientSettings, FetchOptions, PageClient, PageFetchResult};
pub use error::ScraperError;
pub use extract::{classify_status, extract_records, PageExtraction};
pub use pagination::{page_plan, Paginator};
pub use profiles::{FieldRole, ProfileRegistry, SelectorProfile};
pub use rate_limit::{politeness_delay, HostLimiter};
pub use resolve::{resolve_cards, CardMatch, FieldResolver};
pub use retry::RetryPolicy;
pub use text::{normalize_whitespace, parse_price, ParsedPrice};
