use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;

use super::{LookupError, MAX_RESOURCES_PER_KIND, ResourceFinder, ResourceKind, ResourceRecord};
use crate::pipeline::keywords::{KeywordExtractor, Separator};

static FEED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<feed\b").expect("valid regex"));

static ENTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<entry\b[^>]*>(.*?)</entry>").expect("valid regex"));

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<title\b[^>]*>(.*?)</title>").expect("valid regex"));

static ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<id\b[^>]*>(.*?)</id>").expect("valid regex"));

static NUMERIC_ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(?:[xX]([0-9a-fA-F]+)|([0-9]+));").expect("valid regex"));

/// Searches the arXiv preprint archive across all indexed fields.
pub struct PaperFinder {
    client: Client,
    api_url: String,
    keywords: KeywordExtractor,
    timeout: Duration,
}

impl PaperFinder {
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self, LookupError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            api_url: api_url.to_string(),
            // A lenient any-keyword match; long AND queries rarely hit on arXiv.
            keywords: KeywordExtractor::new(Separator::Or),
            timeout,
        })
    }
}

/// Prefixes every term with `all:` so each keyword is matched against title,
/// abstract, authors and comments. Boolean operators pass through.
fn field_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(|term| match term {
            "OR" | "AND" | "ANDNOT" => term.to_string(),
            _ => format!("all:{term}"),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decodes numeric references first so that `&amp;#233;` stays literal.
fn decode_entities(text: &str) -> String {
    let numeric = NUMERIC_ENTITY_RE.replace_all(text, |caps: &regex::Captures| {
        let code = match (caps.get(1), caps.get(2)) {
            (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
            (None, Some(dec)) => dec.as_str().parse().ok(),
            (None, None) => None,
        };
        code.and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });

    numeric
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn clean_field(raw: &str) -> String {
    decode_entities(&raw.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Pulls `(title, id)` pairs out of an arXiv Atom feed in feed order.
fn parse_feed(body: &str) -> Result<Vec<ResourceRecord>, LookupError> {
    if !FEED_RE.is_match(body) {
        return Err(LookupError::Decode("response is not an Atom feed".to_string()));
    }

    Ok(ENTRY_RE
        .captures_iter(body)
        .filter_map(|entry| {
            let entry = entry.get(1)?.as_str();
            let title = clean_field(TITLE_RE.captures(entry)?.get(1)?.as_str());
            let url = clean_field(ID_RE.captures(entry)?.get(1)?.as_str());
            if title.is_empty() || url.is_empty() {
                return None;
            }
            Some(ResourceRecord::Paper { title, url })
        })
        .collect())
}

#[async_trait]
impl ResourceFinder for PaperFinder {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Paper
    }

    fn keywords(&self) -> Option<&KeywordExtractor> {
        Some(&self.keywords)
    }

    async fn lookup(&self, query: &str) -> Result<Vec<ResourceRecord>, LookupError> {
        let timeout_ms = self.timeout.as_millis() as u64;
        let search_query = field_query(query);
        let max_results = MAX_RESOURCES_PER_KIND.to_string();

        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("search_query", search_query.as_str()),
                ("start", "0"),
                ("max_results", max_results.as_str()),
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

        let body = response
            .text()
            .await
            .map_err(|e| LookupError::from_reqwest(e, timeout_ms))?;

        parse_feed(&body)
    }
}
