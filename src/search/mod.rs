//! Web search used for company research and domain-scoped dataset lookups.

pub mod google;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use google::GoogleSearch;

/// A single organic search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search provider {provider} is not configured")]
    NotConfigured { provider: &'static str },

    #[error("search request failed: {0}")]
    Transport(String),

    #[error("search timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("search API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("could not decode search response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Returns up to `num_results` hits in the provider's relevance order.
    async fn search(&self, query: &str, num_results: usize)
    -> Result<Vec<SearchHit>, SearchError>;

    fn name(&self) -> &'static str;
}
