use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::extractor::extract_visible_text;
use super::{ContentSource, FetchError};

/// Many company sites reject requests without a browser-like client identity.
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Bytes of HTML read per page; anything past this is dropped unread.
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

pub struct HttpContentFetcher {
    client: Client,
    max_chars: usize,
    max_body_bytes: usize,
}

impl HttpContentFetcher {
    pub fn new(timeout: Duration, max_chars: usize) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(BROWSER_USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| FetchError::Http {
                url: String::new(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            max_chars,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        })
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

fn request_error(url: &str, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(url.to_string())
    } else {
        FetchError::Http {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

fn is_fetchable(url: &str) -> bool {
    Url::parse(url)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

#[async_trait]
impl ContentSource for HttpContentFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        if !is_fetchable(url) {
            return Err(FetchError::UnsupportedUrl(url.to_string()));
        }

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| request_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| request_error(url, e))? {
            let room = self.max_body_bytes - body.len();
            if chunk.len() >= room {
                body.extend_from_slice(&chunk[..room]);
                tracing::debug!(url, max_body_bytes = self.max_body_bytes, "Page body truncated");
                break;
            }
            body.extend_from_slice(&chunk);
        }

        let text = extract_visible_text(&String::from_utf8_lossy(&body), self.max_chars);
        if text.is_empty() {
            return Err(FetchError::NoContent(url.to_string()));
        }

        tracing::debug!(url, chars = text.chars().count(), "Fetched page text");

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(max_chars: usize) -> HttpContentFetcher {
        HttpContentFetcher::new(Duration::from_millis(500), max_chars).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_returns_visible_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/about"))
            .and(header_exists("user-agent"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<html><body><nav>Menu</nav><p>Acme builds widgets.</p></body></html>",
            ))
            .mount(&server)
            .await;

        let text = fetcher(4000)
            .fetch(&format!("{}/about", server.uri()))
            .await
            .unwrap();

        assert_eq!(text, "Acme builds widgets.");
    }

    #[tokio::test]
    async fn test_fetch_stops_reading_at_body_limit() {
        let server = MockServer::start().await;
        let html = format!(
            "<html><body><p>Acme builds widgets.</p>{}<p>Unreachable tail</p></body></html>",
            "<!-- padding -->".repeat(1000)
        );
        Mock::given(method("GET"))
            .and(path("/huge"))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(&server)
            .await;

        let text = fetcher(4000)
            .with_max_body_bytes(1024)
            .fetch(&format!("{}/huge", server.uri()))
            .await
            .unwrap();

        assert_eq!(text, "Acme builds widgets.");
    }

    #[tokio::test]
    async fn test_fetch_caps_large_pages() {
        let server = MockServer::start().await;
        let body = format!("<p>{}</p>", "lorem ipsum ".repeat(2000));
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let text = fetcher(4000).fetch(&server.uri()).await.unwrap();
        assert!(text.chars().count() <= 4000);
    }

    #[tokio::test]
    async fn test_fetch_rejects_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = fetcher(4000).fetch(&server.uri()).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_fetch_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<p>late</p>")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let err = fetcher(4000).fetch(&server.uri()).await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_fetch_rejects_non_http_urls() {
        let err = fetcher(4000).fetch("ftp://example.com/file").await.unwrap_err();
        assert!(matches!(err, FetchError::UnsupportedUrl(_)));
    }
}
