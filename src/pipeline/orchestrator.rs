use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use opentelemetry::trace::TraceContextExt;
use thiserror::Error;
use tracing::Instrument;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::config::Config;
use crate::content::extractor::truncate_chars;
use crate::content::{ContentSource, FetchError, HttpContentFetcher};
use crate::llm::{self, LlmClient};
use crate::resources::{DatasetFinder, PaperFinder, RepositoryFinder, ResourceFinder, ResourceRecord};
use crate::search::{GoogleSearch, SearchError, SearchHit, WebSearch};
use crate::telemetry::metrics::{CONTENT_FETCH_FAILURES, REPORT_GENERATION_DURATION, REPORT_USE_CASES};

use super::format::{self, EnrichedUseCase, FormatParams, Report};
use super::generate::{GenerationError, MAX_USE_CASES, UseCase, UseCaseGenerator, UseCaseSource};

/// Failures that end a report request. Anything not listed here (a single
/// unreachable page, an unavailable resource provider) only degrades the
/// report.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Error during web search: {0}")]
    SearchUnavailable(#[source] SearchError),

    #[error("{0}")]
    NoCompanyInfoFound(String),

    #[error("Could not generate use cases: {0}")]
    GenerationFailed(#[from] GenerationError),
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub search_result_count: usize,
    pub profile_max_chars: usize,
    pub fanout_limit: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            search_result_count: 3,
            profile_max_chars: 12_000,
            fanout_limit: 3,
        }
    }
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        Self {
            search_result_count: config.search_result_count.max(1),
            profile_max_chars: config.profile_max_chars,
            fanout_limit: config.fanout_limit.max(1),
        }
    }
}

#[derive(Clone)]
pub struct ResourceFinders {
    pub datasets: Arc<dyn ResourceFinder>,
    pub repositories: Arc<dyn ResourceFinder>,
    pub papers: Arc<dyn ResourceFinder>,
}

pub struct ReportOrchestrator {
    search: Arc<dyn WebSearch>,
    content: Arc<dyn ContentSource>,
    generator: Arc<dyn UseCaseSource>,
    finders: ResourceFinders,
    settings: PipelineSettings,
}

impl ReportOrchestrator {
    pub fn new(
        search: Arc<dyn WebSearch>,
        content: Arc<dyn ContentSource>,
        generator: Arc<dyn UseCaseSource>,
        finders: ResourceFinders,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            search,
            content,
            generator,
            finders,
            settings,
        }
    }

    /// Wires the production collaborators from configuration.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let search: Arc<dyn WebSearch> = Arc::new(GoogleSearch::new(
            &config.google_search_url,
            config.google_api_key.clone(),
            config.google_cse_id.clone(),
            config.lookup_timeout,
        )?);

        let content = Arc::new(HttpContentFetcher::new(
            config.page_fetch_timeout,
            config.page_max_chars,
        )?);

        let llm_client = Arc::new(LlmClient::new(
            llm::provider_from_config(config)?,
            config.generation_timeout,
        ));
        let generator = Arc::new(UseCaseGenerator::new(llm_client, config.llm_model.clone()));

        let finders = ResourceFinders {
            datasets: Arc::new(DatasetFinder::new(
                search.clone(),
                config.dataset_site_filter.clone(),
            )),
            repositories: Arc::new(RepositoryFinder::new(
                &config.github_api_url,
                config.github_api_key.clone(),
                config.lookup_timeout,
            )?),
            papers: Arc::new(PaperFinder::new(
                &config.arxiv_api_url,
                config.lookup_timeout,
            )?),
        };

        Ok(Self::new(
            search,
            content,
            generator,
            finders,
            PipelineSettings::from(config),
        ))
    }

    #[tracing::instrument(
        name = "pipeline report",
        skip(self),
        fields(
            report.id,
            report.use_cases_count,
            report.duration_ms,
        )
    )]
    pub async fn run(&self, company_name: &str) -> Result<Report, PipelineError> {
        let company_name = company_name.trim();
        if company_name.is_empty() {
            return Err(PipelineError::InvalidInput(
                "company name must not be empty".into(),
            ));
        }

        let start = Instant::now();

        let span = tracing::Span::current();
        let context = span.context();
        let otel_span = context.span();
        let span_context = otel_span.span_context();
        let trace_id = if span_context.is_valid() {
            span_context.trace_id().to_string()
        } else {
            String::new()
        };

        // Stage 1: find pages about the company
        let hits = self.search_company(company_name).await?;

        // Stage 2: fetch and condense them into a profile
        let profile = self.build_profile(&hits).await?;

        // Stage 3: propose use cases
        let generated = self.generator.generate(company_name, &profile).await?;

        // Stage 4: attach datasets, repositories and papers
        let use_cases = self.enrich(company_name, generated.use_cases).await;

        // Stage 5: assemble
        let duration = start.elapsed();
        let report = format::format_report(FormatParams {
            company_name: company_name.to_string(),
            overview: generated.overview,
            use_cases,
            duration,
            trace_id,
        });

        REPORT_GENERATION_DURATION.record(duration.as_secs_f64(), &[]);
        REPORT_USE_CASES.record(report.use_cases.len() as f64, &[]);

        span.record("report.id", tracing::field::display(report.id));
        span.record("report.use_cases_count", report.use_cases.len());
        span.record("report.duration_ms", report.generation_duration_ms);

        Ok(report)
    }

    #[tracing::instrument(
        name = "pipeline_stage search",
        skip(self),
        fields(pipeline.stage = "search", search.hits)
    )]
    async fn search_company(&self, company_name: &str) -> Result<Vec<SearchHit>, PipelineError> {
        let query = format!("about {company_name} business model and products");

        let hits = self
            .search
            .search(&query, self.settings.search_result_count)
            .await
            .map_err(PipelineError::SearchUnavailable)?;

        tracing::Span::current().record("search.hits", hits.len());

        if hits.is_empty() {
            return Err(PipelineError::NoCompanyInfoFound(
                "Could not find any information about the company. Please try a different name."
                    .into(),
            ));
        }

        Ok(hits)
    }

    #[tracing::instrument(
        name = "pipeline_stage extract",
        skip(self, hits),
        fields(
            pipeline.stage = "extract",
            extract.pages_requested = hits.len(),
            extract.pages_fetched,
            extract.profile_chars,
        )
    )]
    async fn build_profile(&self, hits: &[SearchHit]) -> Result<String, PipelineError> {
        let fetches: Vec<_> = hits
            .iter()
            .map(|hit| fetch_page(Arc::clone(&self.content), hit.url.clone()))
            .collect();
        let pages: Vec<_> = stream::iter(fetches)
            .buffered(self.settings.fanout_limit)
            .collect()
            .await;

        let mut profile = String::new();
        let mut fetched = 0usize;
        for (url, result) in pages {
            match result {
                Ok(text) if !text.trim().is_empty() => {
                    if !profile.is_empty() {
                        profile.push(' ');
                    }
                    profile.push_str(text.trim());
                    fetched += 1;
                }
                Ok(_) => {
                    tracing::warn!(url = %url, "Skipping page without readable text");
                    CONTENT_FETCH_FAILURES.add(1, &[]);
                }
                Err(err) => {
                    tracing::warn!(url = %url, error = %err, "Skipping page that could not be fetched");
                    CONTENT_FETCH_FAILURES.add(1, &[]);
                }
            }
        }

        let profile = truncate_chars(&profile, self.settings.profile_max_chars);

        let span = tracing::Span::current();
        span.record("extract.pages_fetched", fetched);
        span.record("extract.profile_chars", profile.chars().count());

        if profile.is_empty() {
            return Err(PipelineError::NoCompanyInfoFound(
                "Could not parse content from any of the found websites. They may be blocking scrapers."
                    .into(),
            ));
        }

        Ok(profile)
    }

    #[tracing::instrument(
        name = "pipeline_stage enrich",
        skip(self, use_cases),
        fields(pipeline.stage = "enrich", enrich.use_cases = use_cases.len())
    )]
    async fn enrich(&self, company_name: &str, use_cases: Vec<UseCase>) -> Vec<EnrichedUseCase> {
        let lookups: Vec<_> = use_cases
            .into_iter()
            .take(MAX_USE_CASES)
            .map(|use_case| {
                let query = format!("{company_name} {}", use_case.heading);
                enrich_use_case(self.finders.clone(), query, use_case)
            })
            .collect();

        stream::iter(lookups)
            .buffered(self.settings.fanout_limit)
            .collect()
            .await
    }
}

// Fan-out futures own their inputs; borrowed ones make `run` non-`Send`.
async fn fetch_page(
    content: Arc<dyn ContentSource>,
    url: String,
) -> (String, Result<String, FetchError>) {
    let result = content.fetch(&url).await;
    (url, result)
}

async fn enrich_use_case(
    finders: ResourceFinders,
    query: String,
    use_case: UseCase,
) -> EnrichedUseCase {
    let span = tracing::info_span!("enrich use_case", use_case.heading = %use_case.heading);

    let (datasets, repos, papers) = async {
        tokio::join!(
            find_resources(finders.datasets.as_ref(), &query),
            find_resources(finders.repositories.as_ref(), &query),
            find_resources(finders.papers.as_ref(), &query),
        )
    }
    .instrument(span)
    .await;

    EnrichedUseCase {
        use_case,
        datasets,
        repos,
        papers,
    }
}

async fn find_resources(finder: &dyn ResourceFinder, raw_query: &str) -> Vec<ResourceRecord> {
    let query = match finder.keywords() {
        Some(extractor) => extractor.extract(raw_query),
        None => raw_query.to_string(),
    };
    finder.find(&query).await
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::llm::{GenerateRequest, GenerateResponse, Provider};
    use crate::pipeline::keywords::{KeywordExtractor, Separator};
    use crate::resources::{LookupError, ResourceKind};

    const ACME_JSON: &str = r#"{"overview":"Acme builds widgets.","use_cases":[{"heading":"Demand Forecasting","description":"...","implementation_steps":["Step 1","Step 2"]}]}"#;

    struct MockSearch {
        hits: Vec<SearchHit>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl MockSearch {
        fn returning(urls: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                hits: urls
                    .iter()
                    .map(|url| SearchHit {
                        url: url.to_string(),
                        title: None,
                    })
                    .collect(),
                fail: false,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                hits: Vec::new(),
                fail: true,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl WebSearch for MockSearch {
        async fn search(
            &self,
            _query: &str,
            _num_results: usize,
        ) -> Result<Vec<SearchHit>, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(SearchError::Api {
                    status: 429,
                    message: "quota exceeded".to_string(),
                })
            } else {
                Ok(self.hits.clone())
            }
        }

        fn name(&self) -> &'static str {
            "mock"
        }
    }

    struct MockContent {
        pages: HashMap<String, Result<String, FetchError>>,
        calls: AtomicUsize,
    }

    impl MockContent {
        fn with(pages: Vec<(&str, Result<&str, FetchError>)>) -> Arc<Self> {
            Arc::new(Self {
                pages: pages
                    .into_iter()
                    .map(|(url, page)| (url.to_string(), page.map(str::to_string)))
                    .collect(),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ContentSource for MockContent {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.pages
                .get(url)
                .cloned()
                .unwrap_or_else(|| {
                    Err(FetchError::Status {
                        status: 404,
                        url: url.to_string(),
                    })
                })
        }
    }

    struct CannedProvider {
        content: String,
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Provider for CannedProvider {
        async fn generate(&self, req: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(req.prompt.clone());
            Ok(GenerateResponse {
                content: self.content.clone(),
                model: req.model.clone(),
                input_tokens: 100,
                output_tokens: 200,
                finish_reason: "stop".to_string(),
            })
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    struct MockFinder {
        kind: ResourceKind,
        keywords: Option<KeywordExtractor>,
        fail: bool,
        queries: Mutex<Vec<String>>,
    }

    impl MockFinder {
        fn new(kind: ResourceKind, keywords: Option<KeywordExtractor>) -> Arc<Self> {
            Arc::new(Self {
                kind,
                keywords,
                fail: false,
                queries: Mutex::new(Vec::new()),
            })
        }

        fn failing(kind: ResourceKind) -> Arc<Self> {
            Arc::new(Self {
                kind,
                keywords: None,
                fail: true,
                queries: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.queries.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ResourceFinder for MockFinder {
        fn kind(&self) -> ResourceKind {
            self.kind
        }

        fn keywords(&self) -> Option<&KeywordExtractor> {
            self.keywords.as_ref()
        }

        async fn lookup(&self, query: &str) -> Result<Vec<ResourceRecord>, LookupError> {
            self.queries.lock().unwrap().push(query.to_string());
            if self.fail {
                return Err(LookupError::Transport("connection refused".to_string()));
            }
            let url = format!("https://{}.test/{}", self.kind, query.replace(' ', "-"));
            Ok(vec![match self.kind {
                ResourceKind::Dataset => ResourceRecord::Dataset {
                    title: format!("{query} data"),
                    url,
                },
                ResourceKind::Repository => ResourceRecord::Repository {
                    name: "acme/widgets".to_string(),
                    url,
                    stars: 7,
                },
                ResourceKind::Paper => ResourceRecord::Paper {
                    title: format!("On {query}"),
                    url,
                },
            }])
        }
    }

    struct Harness {
        search: Arc<MockSearch>,
        content: Arc<MockContent>,
        provider: Arc<CannedProvider>,
        datasets: Arc<MockFinder>,
        repositories: Arc<MockFinder>,
        papers: Arc<MockFinder>,
        orchestrator: ReportOrchestrator,
    }

    fn harness_with(
        search: Arc<MockSearch>,
        content: Arc<MockContent>,
        model_output: &str,
        repositories: Arc<MockFinder>,
        settings: PipelineSettings,
    ) -> Harness {
        let provider = Arc::new(CannedProvider {
            content: model_output.to_string(),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        });
        let llm_client = Arc::new(LlmClient::new(provider.clone(), Duration::from_secs(5)));
        let generator = Arc::new(UseCaseGenerator::new(llm_client, "test-model"));

        let datasets = MockFinder::new(ResourceKind::Dataset, None);
        let papers = MockFinder::new(
            ResourceKind::Paper,
            Some(KeywordExtractor::new(Separator::Or)),
        );

        let orchestrator = ReportOrchestrator::new(
            search.clone(),
            content.clone(),
            generator,
            ResourceFinders {
                datasets: datasets.clone(),
                repositories: repositories.clone(),
                papers: papers.clone(),
            },
            settings,
        );

        Harness {
            search,
            content,
            provider,
            datasets,
            repositories,
            papers,
            orchestrator,
        }
    }

    fn harness(search: Arc<MockSearch>, content: Arc<MockContent>, model_output: &str) -> Harness {
        harness_with(
            search,
            content,
            model_output,
            MockFinder::new(ResourceKind::Repository, None),
            PipelineSettings::default(),
        )
    }

    fn acme_content() -> Arc<MockContent> {
        MockContent::with(vec![("https://acme.test/about", Ok("Acme builds widgets."))])
    }

    #[tokio::test]
    async fn test_end_to_end_single_use_case() {
        let h = harness(
            MockSearch::returning(&["https://acme.test/about"]),
            acme_content(),
            ACME_JSON,
        );

        let report = h.orchestrator.run("Acme").await.unwrap();

        assert_eq!(report.company_name, "Acme");
        assert_eq!(report.overview, "Acme builds widgets.");
        assert_eq!(report.filename(), "Acme_AI_ML_Report.pdf");
        assert_eq!(report.use_cases.len(), 1);

        let use_case = &report.use_cases[0];
        assert_eq!(use_case.use_case.heading, "Demand Forecasting");
        assert_eq!(use_case.use_case.implementation_steps, vec!["Step 1", "Step 2"]);
        assert_eq!(use_case.datasets.len(), 1);
        assert_eq!(use_case.repos.len(), 1);
        assert_eq!(use_case.papers.len(), 1);

        assert_eq!(
            h.datasets.queries.lock().unwrap().as_slice(),
            ["Acme Demand Forecasting"]
        );
        assert_eq!(
            h.papers.queries.lock().unwrap().as_slice(),
            ["acme OR demand OR forecasting"]
        );
        assert_eq!(h.provider.calls.load(Ordering::SeqCst), 1);
        assert!(h.provider.prompts.lock().unwrap()[0].contains("Acme builds widgets."));
    }

    #[tokio::test]
    async fn test_fenced_model_output_is_accepted() {
        let fenced = format!("```json\n{ACME_JSON}\n```");
        let h = harness(
            MockSearch::returning(&["https://acme.test/about"]),
            acme_content(),
            &fenced,
        );

        let report = h.orchestrator.run("Acme").await.unwrap();
        assert_eq!(report.use_cases.len(), 1);
    }

    #[tokio::test]
    async fn test_zero_hits_stops_before_generation() {
        let h = harness(MockSearch::returning(&[]), acme_content(), ACME_JSON);

        let err = h.orchestrator.run("Acme").await.unwrap_err();

        assert!(matches!(err, PipelineError::NoCompanyInfoFound(_)));
        assert_eq!(h.search.calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.content.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.provider.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.datasets.calls() + h.repositories.calls() + h.papers.calls(), 0);
    }

    #[tokio::test]
    async fn test_search_failure_is_fatal() {
        let h = harness(MockSearch::failing(), acme_content(), ACME_JSON);

        let err = h.orchestrator.run("Acme").await.unwrap_err();

        assert!(matches!(err, PipelineError::SearchUnavailable(_)));
        assert!(err.to_string().contains("quota exceeded"));
        assert_eq!(h.content.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_partial_fetch_failure_still_proceeds() {
        let content = MockContent::with(vec![
            (
                "https://a.test",
                Err(FetchError::Timeout("https://a.test".to_string())),
            ),
            ("https://b.test", Ok("Acme builds widgets.")),
            (
                "https://c.test",
                Err(FetchError::Status {
                    status: 403,
                    url: "https://c.test".to_string(),
                }),
            ),
        ]);
        let h = harness(
            MockSearch::returning(&["https://a.test", "https://b.test", "https://c.test"]),
            content,
            ACME_JSON,
        );

        let report = h.orchestrator.run("Acme").await.unwrap();

        assert_eq!(report.use_cases.len(), 1);
        assert_eq!(h.content.calls.load(Ordering::SeqCst), 3);
        assert_eq!(h.provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_all_fetches_failing_is_fatal() {
        let content = MockContent::with(vec![
            (
                "https://a.test",
                Err(FetchError::Timeout("https://a.test".to_string())),
            ),
            ("https://b.test", Ok("   ")),
        ]);
        let h = harness(
            MockSearch::returning(&["https://a.test", "https://b.test"]),
            content,
            ACME_JSON,
        );

        let err = h.orchestrator.run("Acme").await.unwrap_err();

        assert!(matches!(err, PipelineError::NoCompanyInfoFound(_)));
        assert_eq!(h.provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_use_cases_is_generation_failure() {
        let h = harness(
            MockSearch::returning(&["https://acme.test/about"]),
            acme_content(),
            r#"{"overview":"Acme builds widgets."}"#,
        );

        let err = h.orchestrator.run("Acme").await.unwrap_err();

        assert!(matches!(
            err,
            PipelineError::GenerationFailed(GenerationError::ShapeMismatch(_))
        ));
        assert_eq!(h.datasets.calls() + h.repositories.calls() + h.papers.calls(), 0);
    }

    #[tokio::test]
    async fn test_malformed_model_output_is_generation_failure() {
        let h = harness(
            MockSearch::returning(&["https://acme.test/about"]),
            acme_content(),
            "Sorry, I cannot help with that.",
        );

        let err = h.orchestrator.run("Acme").await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::GenerationFailed(GenerationError::MalformedJson(_))
        ));
    }

    #[tokio::test]
    async fn test_failing_finder_only_empties_its_list() {
        let h = harness_with(
            MockSearch::returning(&["https://acme.test/about"]),
            acme_content(),
            ACME_JSON,
            MockFinder::failing(ResourceKind::Repository),
            PipelineSettings::default(),
        );

        let report = h.orchestrator.run("Acme").await.unwrap();

        let use_case = &report.use_cases[0];
        assert!(use_case.repos.is_empty());
        assert_eq!(use_case.datasets.len(), 1);
        assert_eq!(use_case.papers.len(), 1);
        assert_eq!(h.repositories.calls(), 1);
    }

    #[tokio::test]
    async fn test_use_cases_keep_model_order() {
        let cases: Vec<String> = ["Churn Prediction", "Fraud Detection", "Route Optimization"]
            .iter()
            .map(|h| format!(r#"{{"heading":"{h}","description":"d","implementation_steps":[]}}"#))
            .collect();
        let output = format!(r#"{{"overview":"o","use_cases":[{}]}}"#, cases.join(","));
        let h = harness(
            MockSearch::returning(&["https://acme.test/about"]),
            acme_content(),
            &output,
        );

        let report = h.orchestrator.run("Acme").await.unwrap();

        let headings: Vec<&str> = report
            .use_cases
            .iter()
            .map(|uc| uc.use_case.heading.as_str())
            .collect();
        assert_eq!(
            headings,
            ["Churn Prediction", "Fraud Detection", "Route Optimization"]
        );
        assert_eq!(h.datasets.calls(), 3);
    }

    #[tokio::test]
    async fn test_profile_respects_budget() {
        let long_page = "widgets ".repeat(100);
        let content = MockContent::with(vec![
            ("https://a.test", Ok(long_page.as_str())),
            ("https://b.test", Ok(long_page.as_str())),
        ]);
        let h = harness_with(
            MockSearch::returning(&["https://a.test", "https://b.test"]),
            content,
            ACME_JSON,
            MockFinder::new(ResourceKind::Repository, None),
            PipelineSettings {
                profile_max_chars: 50,
                ..PipelineSettings::default()
            },
        );

        h.orchestrator.run("Acme").await.unwrap();

        let prompt = h.provider.prompts.lock().unwrap()[0].clone();
        assert!(!prompt.contains(&"widgets ".repeat(10)));
        assert!(prompt.contains("widgets widgets"));
    }

    #[tokio::test]
    async fn test_run_can_be_spawned() {
        let h = harness(
            MockSearch::returning(&["https://acme.test/about"]),
            acme_content(),
            ACME_JSON,
        );
        let orchestrator = Arc::new(h.orchestrator);

        let handle = tokio::spawn({
            let orchestrator = Arc::clone(&orchestrator);
            async move { orchestrator.run("Acme").await }
        });

        let report = handle.await.unwrap().unwrap();
        assert_eq!(report.use_cases.len(), 1);
        assert_eq!(h.provider.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_blank_company_name_is_rejected() {
        let h = harness(
            MockSearch::returning(&["https://acme.test/about"]),
            acme_content(),
            ACME_JSON,
        );

        let err = tokio_test::block_on(h.orchestrator.run("   ")).unwrap_err();

        assert!(matches!(err, PipelineError::InvalidInput(_)));
        assert_eq!(h.search.calls.load(Ordering::SeqCst), 0);
    }
}
