//! Page fetching and visible-text extraction for company research.

pub mod extractor;
pub mod fetcher;

use async_trait::async_trait;
use thiserror::Error;

pub use extractor::extract_visible_text;
pub use fetcher::HttpContentFetcher;

/// Upper bound on extracted text per page, keeps the generation prompt small.
pub const DEFAULT_MAX_PAGE_CHARS: usize = 4000;

#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("unsupported url: {0}")]
    UnsupportedUrl(String),

    #[error("timed out fetching {0}")]
    Timeout(String),

    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("request to {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("no readable text in {0}")]
    NoContent(String),
}

#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetches `url` and returns its visible text, already bounded in length.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}
