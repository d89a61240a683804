use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::llm::{GenerateRequest, LlmClient};

pub const MAX_USE_CASES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UseCase {
    pub heading: String,
    pub description: String,
    pub implementation_steps: Vec<String>,
}

/// Validated model output: an overview plus between one and five use cases,
/// each with a non-empty heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedUseCases {
    pub overview: String,
    pub use_cases: Vec<UseCase>,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    Transport(String),

    #[error("model returned malformed JSON: {0}")]
    MalformedJson(String),

    #[error("model returned an unexpected format: {0}")]
    ShapeMismatch(String),
}

#[async_trait]
pub trait UseCaseSource: Send + Sync {
    async fn generate(
        &self,
        company_name: &str,
        company_info: &str,
    ) -> Result<GeneratedUseCases, GenerationError>;
}

pub struct UseCaseGenerator {
    llm_client: Arc<LlmClient>,
    model: String,
}

impl UseCaseGenerator {
    pub fn new(llm_client: Arc<LlmClient>, model: impl Into<String>) -> Self {
        Self {
            llm_client,
            model: model.into(),
        }
    }

    #[tracing::instrument(
        name = "pipeline_stage generate",
        skip(self, company_info),
        fields(
            pipeline.stage = "generate",
            company.name = %company_name,
            generate.use_cases,
        )
    )]
    pub async fn generate_use_cases(
        &self,
        company_name: &str,
        company_info: &str,
    ) -> Result<GeneratedUseCases, GenerationError> {
        let request = GenerateRequest {
            model: self.model.clone(),
            system: "You are an AI strategy consultant writing for a technical audience. \
                You answer with a single JSON object and nothing else."
                .to_string(),
            prompt: build_prompt(company_name, company_info),
            temperature: 0.4,
            max_tokens: 8192,
            json_output: true,
            stage: "generate".to_string(),
        };

        let resp = self
            .llm_client
            .generate(&request)
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let generated = parse_use_cases(&resp.content)?;

        tracing::Span::current().record("generate.use_cases", generated.use_cases.len());

        Ok(generated)
    }
}

#[async_trait]
impl UseCaseSource for UseCaseGenerator {
    async fn generate(
        &self,
        company_name: &str,
        company_info: &str,
    ) -> Result<GeneratedUseCases, GenerationError> {
        self.generate_use_cases(company_name, company_info).await
    }
}

fn build_prompt(company_name: &str, company_info: &str) -> String {
    format!(
        "Based on the information about {company_name}, generate a report for a technical audience.\n\
        Company information: \"{company_info}\"\n\n\
        The report must contain:\n\
        1. A brief, one-paragraph overview of the company's business model.\n\
        2. A list of {MAX_USE_CASES} AI/ML use cases. For each use case provide:\n\
           - a 'heading',\n\
           - a 'description',\n\
           - a list of 'implementation_steps' as a technical guide.\n\n\
        Return ONLY one JSON object in exactly this format, with no text before or after it:\n\
        {{\n  \"overview\": \"...\",\n  \"use_cases\": [\n    \
        {{\"heading\": \"...\", \"description\": \"...\", \"implementation_steps\": [\"Step 1: ...\", \"Step 2: ...\"]}}\n  ]\n}}"
    )
}

/// Strips a markdown code fence (or surrounding prose) from a completion so
/// that only the JSON payload remains. Only the outermost fence pair is
/// removed; backticks inside JSON strings are left alone.
pub(crate) fn extract_json(content: &str) -> String {
    if let Some(open) = content.find("```")
        && let Some(close) = content.rfind("```")
        && open < close
    {
        let inner = &content[open + 3..close];
        // drop the info string on the opening fence line, e.g. `json`
        let inner = match inner.find('\n') {
            Some(newline) if !inner[..newline].contains('{') => &inner[newline + 1..],
            _ => inner.trim_start_matches("json"),
        };
        let inner = inner.trim();
        if inner.starts_with('{') {
            return inner.to_string();
        }
    }
    if let Some(start) = content.find('{')
        && let Some(end) = content.rfind('}')
        && start < end
    {
        return content[start..=end].to_string();
    }
    content.trim().to_string()
}

#[derive(Deserialize)]
struct RawEnvelope {
    overview: Option<String>,
    use_cases: Option<Vec<RawUseCase>>,
}

#[derive(Deserialize)]
struct RawUseCase {
    heading: Option<String>,
    description: Option<String>,
    implementation_steps: Option<Vec<String>>,
}

pub(crate) fn parse_use_cases(content: &str) -> Result<GeneratedUseCases, GenerationError> {
    let json_str = extract_json(content);

    let value: serde_json::Value = serde_json::from_str(&json_str).map_err(|e| {
        let preview: String = content.chars().take(200).collect();
        GenerationError::MalformedJson(format!("{e}; response starts with {preview:?}"))
    })?;

    if !value.is_object() {
        return Err(GenerationError::ShapeMismatch(
            "expected a JSON object at the top level".into(),
        ));
    }

    let raw: RawEnvelope = serde_json::from_value(value)
        .map_err(|e| GenerationError::ShapeMismatch(e.to_string()))?;

    let overview = raw
        .overview
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .ok_or_else(|| GenerationError::ShapeMismatch("missing 'overview'".into()))?;

    let raw_cases = raw
        .use_cases
        .ok_or_else(|| GenerationError::ShapeMismatch("missing 'use_cases'".into()))?;

    let use_cases: Vec<UseCase> = raw_cases
        .into_iter()
        .filter_map(|case| {
            let heading = case.heading.unwrap_or_default().trim().to_string();
            if heading.is_empty() {
                tracing::warn!("Dropping generated use case without a heading");
                return None;
            }
            Some(UseCase {
                heading,
                description: case.description.unwrap_or_default().trim().to_string(),
                implementation_steps: case
                    .implementation_steps
                    .unwrap_or_default()
                    .into_iter()
                    .map(|step| step.replace("**", "").trim().to_string())
                    .filter(|step| !step.is_empty())
                    .collect(),
            })
        })
        .take(MAX_USE_CASES)
        .collect();

    if use_cases.is_empty() {
        return Err(GenerationError::ShapeMismatch(
            "'use_cases' contains no use case with a heading".into(),
        ));
    }

    Ok(GeneratedUseCases {
        overview,
        use_cases,
    })
}
