//! Error types for the quote sources.

use thiserror::Error;

/// Failure of a whole primary batch call. Never partial.
#[derive(Error, Debug)]
pub enum QuoteError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("provider returned HTTP {status}")]
    Status { status: u16 },

    #[error("could not decode provider response: {0}")]
    Decode(String),

    #[error("provider error: {code} - {description}")]
    Provider { code: String, description: String },

    #[error("timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("could not establish provider session: {0}")]
    Auth(String),
}

/// Failure of one scraped page. Absorbed into empty fields at the adapter boundary.
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("page returned HTTP {status}")]
    Status { status: u16 },
}
