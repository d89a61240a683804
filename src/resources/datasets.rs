use std::sync::Arc;

use async_trait::async_trait;

use super::{LookupError, MAX_RESOURCES_PER_KIND, ResourceFinder, ResourceKind, ResourceRecord};
use crate::search::WebSearch;

/// Finds datasets by running a domain-scoped web search.
pub struct DatasetFinder {
    search: Arc<dyn WebSearch>,
    site_filter: String,
}

impl DatasetFinder {
    /// `site_filter` is prepended to every query, e.g. `site:kaggle.com/datasets`.
    pub fn new(search: Arc<dyn WebSearch>, site_filter: impl Into<String>) -> Self {
        Self {
            search,
            site_filter: site_filter.into(),
        }
    }

    fn scoped_query(&self, query: &str) -> String {
        if self.site_filter.is_empty() {
            query.to_string()
        } else {
            format!("{} {}", self.site_filter, query)
        }
    }
}

#[async_trait]
impl ResourceFinder for DatasetFinder {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Dataset
    }

    async fn lookup(&self, query: &str) -> Result<Vec<ResourceRecord>, LookupError> {
        let hits = self
            .search
            .search(&self.scoped_query(query), MAX_RESOURCES_PER_KIND)
            .await?;

        Ok(hits
            .into_iter()
            .map(|hit| ResourceRecord::Dataset {
                title: hit
                    .title
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| "N/A".to_string()),
                url: hit.url,
            })
            .collect())
    }
}
