use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("bot wall detected at {url}")]
    BotWall { url: String },

    #[error("empty response body from {url}")]
    EmptyBody { url: String },

    #[error("transport failure for {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}
