pub mod client;
pub mod gemini;
pub mod openai;

use std::sync::Arc;

pub use client::LlmClient;

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub model: String,
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Ask the provider to constrain output to a single JSON object.
    pub json_output: bool,
    pub stage: String,
}

#[derive(Debug, Clone)]
pub struct GenerateResponse {
    pub content: String,
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub finish_reason: String,
}

#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    async fn generate(&self, req: &GenerateRequest) -> anyhow::Result<GenerateResponse>;
    fn name(&self) -> &str;
}

pub const SUPPORTED_PROVIDERS: &[&str] = &["gemini", "google", "openai", "ollama"];

/// Builds the provider selected by `LLM_PROVIDER`.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn Provider>> {
    let provider: Arc<dyn Provider> = match config.llm_provider.trim().to_ascii_lowercase().as_str() {
        "gemini" => Arc::new(gemini::GeminiProvider::new(
            &config.gemini_base_url,
            config.gemini_api_key.as_deref().unwrap_or(""),
        )),
        "google" => Arc::new(openai::OpenAIProvider::new_google(
            config.gemini_api_key.as_deref().unwrap_or(""),
        )),
        "openai" => Arc::new(openai::OpenAIProvider::new(
            config.openai_api_key.as_deref().unwrap_or(""),
        )),
        "ollama" => Arc::new(openai::OpenAIProvider::new_ollama(&config.ollama_base_url)),
        other => anyhow::bail!(
            "unsupported LLM_PROVIDER {other:?}, expected one of {}",
            SUPPORTED_PROVIDERS.join(", ")
        ),
    };
    Ok(provider)
}
