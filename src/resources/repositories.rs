use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;

use super::{LookupError, MAX_RESOURCES_PER_KIND, ResourceFinder, ResourceKind, ResourceRecord};
use crate::pipeline::keywords::{KeywordExtractor, Separator};

/// GitHub refuses API requests that carry no User-Agent.
const USER_AGENT: &str = concat!("ai-usecase-researcher/", env!("CARGO_PKG_VERSION"));

/// Searches GitHub repositories, most-starred first.
///
/// A personal access token only raises the rate limit; without one the
/// finder still works against the anonymous quota.
pub struct RepositoryFinder {
    client: Client,
    api_url: String,
    token: Option<String>,
    keywords: KeywordExtractor,
    timeout: Duration,
}

impl RepositoryFinder {
    pub fn new(api_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, LookupError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        if token.is_none() {
            tracing::info!("No GitHub token configured, repository search uses the anonymous rate limit");
        }

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
            keywords: KeywordExtractor::new(Separator::Space),
            timeout,
        })
    }

    fn headers(&self) -> Result<HeaderMap, LookupError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github.v3+json"),
        );
        if let Some(token) = &self.token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("token {token}"))
                    .map_err(|e| LookupError::Transport(format!("invalid GitHub token header: {e}")))?,
            );
        }
        Ok(headers)
    }
}

#[derive(Debug, Deserialize)]
struct SearchRepositoriesResponse {
    #[serde(default)]
    items: Vec<RepositoryItem>,
}

#[derive(Debug, Deserialize)]
struct RepositoryItem {
    full_name: String,
    html_url: String,
    #[serde(default)]
    stargazers_count: u64,
}

#[async_trait]
impl ResourceFinder for RepositoryFinder {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Repository
    }

    fn keywords(&self) -> Option<&KeywordExtractor> {
        Some(&self.keywords)
    }

    async fn lookup(&self, query: &str) -> Result<Vec<ResourceRecord>, LookupError> {
        let timeout_ms = self.timeout.as_millis() as u64;
        let per_page = MAX_RESOURCES_PER_KIND.to_string();

        let response = self
            .client
            .get(format!("{}/search/repositories", self.api_url))
            .headers(self.headers()?)
            .query(&[
                ("q", query),
                ("sort", "stars"),
                ("order", "desc"),
                ("per_page", per_page.as_str()),
            ])
            .send()
            .await
            .map_err(|e| LookupError::from_reqwest(e, timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LookupError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let data: SearchRepositoriesResponse = response
            .json()
            .await
            .map_err(|e| LookupError::from_reqwest(e, timeout_ms))?;

        Ok(data
            .items
            .into_iter()
            .map(|item| ResourceRecord::Repository {
                name: item.full_name,
                url: item.html_url,
                stars: item.stargazers_count,
            })
            .collect())
    }
}
