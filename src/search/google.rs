use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{SearchError, SearchHit, WebSearch};

/// The Custom Search JSON API caps `num` at 10.
const MAX_RESULTS_PER_REQUEST: usize = 10;

/// Google Programmable Search (Custom Search JSON API).
pub struct GoogleSearch {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    engine_id: Option<String>,
    timeout: Duration,
}

impl GoogleSearch {
    pub fn new(
        endpoint: &str,
        api_key: Option<String>,
        engine_id: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key,
            engine_id,
            timeout,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CustomSearchResponse {
    #[serde(default)]
    items: Vec<CustomSearchItem>,
}

#[derive(Debug, Deserialize)]
struct CustomSearchItem {
    link: Option<String>,
    title: Option<String>,
}

#[async_trait]
impl WebSearch for GoogleSearch {
    async fn search(
        &self,
        query: &str,
        num_results: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let (Some(api_key), Some(engine_id)) = (&self.api_key, &self.engine_id) else {
            return Err(SearchError::NotConfigured { provider: "google" });
        };

        let num = num_results.clamp(1, MAX_RESULTS_PER_REQUEST).to_string();

        tracing::debug!(query, num_results, "Running web search");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", api_key.as_str()),
                ("cx", engine_id.as_str()),
                ("q", query),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::Timeout {
                        timeout_ms: self.timeout.as_millis() as u64,
                    }
                } else {
                    SearchError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SearchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let data: CustomSearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Decode(e.to_string()))?;

        Ok(data
            .items
            .into_iter()
            .filter_map(|item| {
                let url = item.link.filter(|l| !l.is_empty())?;
                Some(SearchHit {
                    url,
                    title: item.title,
                })
            })
            .take(num_results)
            .collect())
    }

    fn name(&self) -> &'static str {
        "google"
    }
}
