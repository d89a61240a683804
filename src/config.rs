use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;

use crate::content::DEFAULT_MAX_PAGE_CHARS;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub environment: String,
    pub llm_provider: String,
    pub llm_model: String,
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub openai_api_key: Option<String>,
    pub ollama_base_url: String,
    pub google_api_key: Option<String>,
    pub google_cse_id: Option<String>,
    pub google_search_url: String,
    pub github_api_key: Option<String>,
    pub github_api_url: String,
    pub arxiv_api_url: String,
    pub dataset_site_filter: String,
    pub search_result_count: usize,
    pub page_fetch_timeout: Duration,
    pub lookup_timeout: Duration,
    pub generation_timeout: Duration,
    pub page_max_chars: usize,
    pub profile_max_chars: usize,
    pub fanout_limit: usize,
    pub otel_service_name: String,
    pub otel_exporter_endpoint: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            port: parse_var("APP_PORT", 8080)?,
            environment: var_or("APP_ENVIRONMENT", "development"),
            llm_provider: var_or("LLM_PROVIDER", "gemini"),
            llm_model: var_or("LLM_MODEL", "gemini-2.5-flash"),
            gemini_api_key: optional_var("GEMINI_API_KEY"),
            gemini_base_url: var_or(
                "GEMINI_BASE_URL",
                "https://generativelanguage.googleapis.com/v1beta",
            ),
            openai_api_key: optional_var("OPENAI_API_KEY"),
            ollama_base_url: var_or("OLLAMA_BASE_URL", "http://localhost:11434"),
            google_api_key: optional_var("GOOGLE_API_KEY"),
            google_cse_id: optional_var("GOOGLE_CSE_ID"),
            google_search_url: var_or(
                "GOOGLE_SEARCH_URL",
                "https://www.googleapis.com/customsearch/v1",
            ),
            github_api_key: optional_var("GITHUB_API_KEY"),
            github_api_url: var_or("GITHUB_API_URL", "https://api.github.com"),
            arxiv_api_url: var_or("ARXIV_API_URL", "http://export.arxiv.org/api/query"),
            dataset_site_filter: var_or("DATASET_SITE_FILTER", "site:kaggle.com/datasets"),
            search_result_count: parse_var("SEARCH_RESULT_COUNT", 3)?,
            page_fetch_timeout: Duration::from_secs(parse_var("PAGE_FETCH_TIMEOUT_SECS", 10)?),
            lookup_timeout: Duration::from_secs(parse_var("LOOKUP_TIMEOUT_SECS", 15)?),
            generation_timeout: Duration::from_secs(parse_var("GENERATION_TIMEOUT_SECS", 90)?),
            page_max_chars: parse_var("PAGE_MAX_CHARS", DEFAULT_MAX_PAGE_CHARS)?,
            profile_max_chars: parse_var("PROFILE_MAX_CHARS", 12_000)?,
            fanout_limit: parse_var("FANOUT_LIMIT", 3)?,
            otel_service_name: var_or("OTEL_SERVICE_NAME", "ai-usecase-researcher"),
            otel_exporter_endpoint: var_or("OTEL_EXPORTER_OTLP_ENDPOINT", "http://localhost:4317"),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Unset and blank values both count as absent.
fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} must be a number, got {raw:?}")),
        Err(_) => Ok(default),
    }
}
