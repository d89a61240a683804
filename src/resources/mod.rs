//! External resource lookups used to enrich each proposed use case.
//!
//! Every finder degrades instead of failing: a lookup error is logged,
//! counted and turned into an empty list so that one unavailable provider
//! never costs the caller a use case.

pub mod datasets;
pub mod papers;
pub mod repositories;

use std::fmt;

use async_trait::async_trait;
use opentelemetry::KeyValue;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pipeline::keywords::KeywordExtractor;
use crate::search::SearchError;
use crate::telemetry::metrics::RESOURCE_LOOKUP_DEGRADED;

pub use datasets::DatasetFinder;
pub use papers::PaperFinder;
pub use repositories::RepositoryFinder;

pub const MAX_RESOURCES_PER_KIND: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceRecord {
    Dataset { title: String, url: String },
    Repository { name: String, url: String, stars: u64 },
    Paper { title: String, url: String },
}

impl ResourceRecord {
    pub fn url(&self) -> &str {
        match self {
            ResourceRecord::Dataset { url, .. }
            | ResourceRecord::Repository { url, .. }
            | ResourceRecord::Paper { url, .. } => url,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Dataset,
    Repository,
    Paper,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Dataset => "dataset",
            ResourceKind::Repository => "repository",
            ResourceKind::Paper => "paper",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("lookup timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("lookup request failed: {0}")]
    Transport(String),

    #[error("lookup API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("could not decode lookup response: {0}")]
    Decode(String),
}

impl LookupError {
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            LookupError::Timeout { timeout_ms }
        } else if err.is_decode() {
            LookupError::Decode(err.to_string())
        } else {
            LookupError::Transport(err.to_string())
        }
    }
}

#[async_trait]
pub trait ResourceFinder: Send + Sync {
    fn kind(&self) -> ResourceKind;

    /// Keyword narrowing to apply to the raw use-case query before lookup.
    /// `None` means the finder takes the query verbatim.
    fn keywords(&self) -> Option<&KeywordExtractor> {
        None
    }

    async fn lookup(&self, query: &str) -> Result<Vec<ResourceRecord>, LookupError>;

    /// Infallible lookup: at most [`MAX_RESOURCES_PER_KIND`] records in the
    /// provider's ranking order, or an empty list when nothing matched or the
    /// provider could not be reached.
    async fn find(&self, query: &str) -> Vec<ResourceRecord> {
        let kind = self.kind();
        match self.lookup(query).await {
            Ok(mut records) => {
                records.truncate(MAX_RESOURCES_PER_KIND);
                if records.is_empty() {
                    tracing::info!(resource.kind = %kind, query, "No matching resources found");
                } else {
                    let urls: Vec<&str> = records.iter().map(ResourceRecord::url).collect();
                    tracing::debug!(
                        resource.kind = %kind,
                        query,
                        count = records.len(),
                        urls = ?urls,
                        "Resources found"
                    );
                }
                records
            }
            Err(err) => {
                tracing::warn!(
                    resource.kind = %kind,
                    query,
                    error = %err,
                    "Resource lookup failed, continuing without it"
                );
                RESOURCE_LOOKUP_DEGRADED.add(1, &[KeyValue::new("resource.kind", kind.as_str())]);
                Vec::new()
            }
        }
    }
}
