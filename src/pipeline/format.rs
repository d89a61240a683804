use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::generate::UseCase;
use crate::resources::ResourceRecord;

#[derive(Debug, Clone, Serialize)]
pub struct EnrichedUseCase {
    #[serde(flatten)]
    pub use_case: UseCase,
    pub datasets: Vec<ResourceRecord>,
    pub repos: Vec<ResourceRecord>,
    pub papers: Vec<ResourceRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub id: Uuid,
    pub company_name: String,
    pub overview: String,
    pub use_cases: Vec<EnrichedUseCase>,
    pub generated_at: DateTime<Utc>,
    pub generation_duration_ms: u64,
    pub trace_id: String,
}

impl Report {
    /// Suggested download name for the rendered document.
    pub fn filename(&self) -> String {
        report_filename(&self.company_name)
    }
}

pub fn report_filename(company_name: &str) -> String {
    format!("{}_AI_ML_Report.pdf", company_name.trim().replace(' ', "_"))
}

pub struct FormatParams {
    pub company_name: String,
    pub overview: String,
    pub use_cases: Vec<EnrichedUseCase>,
    pub duration: Duration,
    pub trace_id: String,
}

#[tracing::instrument(
    name = "pipeline_stage format",
    skip(params),
    fields(
        pipeline.stage = "format",
        report.use_cases_count,
        report.resources_count,
    )
)]
pub fn format_report(params: FormatParams) -> Report {
    let resources_count: usize = params
        .use_cases
        .iter()
        .map(|uc| uc.datasets.len() + uc.repos.len() + uc.papers.len())
        .sum();

    let span = tracing::Span::current();
    span.record("report.use_cases_count", params.use_cases.len());
    span.record("report.resources_count", resources_count);

    Report {
        id: Uuid::new_v4(),
        company_name: params.company_name.trim().to_string(),
        overview: params.overview,
        use_cases: params.use_cases,
        generated_at: Utc::now(),
        generation_duration_ms: params.duration.as_millis() as u64,
        trace_id: params.trace_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enriched(heading: &str) -> EnrichedUseCase {
        EnrichedUseCase {
            use_case: UseCase {
                heading: heading.to_string(),
                description: "desc".to_string(),
                implementation_steps: vec!["Step 1".to_string()],
            },
            datasets: vec![],
            repos: vec![ResourceRecord::Repository {
                name: "acme/widgets".to_string(),
                url: "https://github.com/acme/widgets".to_string(),
                stars: 3,
            }],
            papers: vec![],
        }
    }

    #[test]
    fn test_format_report_assembles_all_fields() {
        let report = format_report(FormatParams {
            company_name: " Acme Corp ".to_string(),
            overview: "Acme builds widgets.".to_string(),
            use_cases: vec![enriched("Demand Forecasting"), enriched("Quality Inspection")],
            duration: Duration::from_millis(5400),
            trace_id: "abc123trace".to_string(),
        });

        assert_eq!(report.company_name, "Acme Corp");
        assert_eq!(report.overview, "Acme builds widgets.");
        assert_eq!(report.use_cases.len(), 2);
        assert_eq!(report.use_cases[1].use_case.heading, "Quality Inspection");
        assert_eq!(report.generation_duration_ms, 5400);
        assert_eq!(report.trace_id, "abc123trace");
        assert_eq!(report.filename(), "Acme_Corp_AI_ML_Report.pdf");
    }

    #[test]
    fn test_report_filename() {
        assert_eq!(report_filename("Acme"), "Acme_AI_ML_Report.pdf");
        assert_eq!(
            report_filename("Tata Consultancy Services"),
            "Tata_Consultancy_Services_AI_ML_Report.pdf"
        );
    }

    #[test]
    fn test_enriched_use_case_serializes_flat() {
        let json = serde_json::to_value(enriched("Demand Forecasting")).unwrap();
        assert_eq!(json["heading"], "Demand Forecasting");
        assert_eq!(json["implementation_steps"][0], "Step 1");
        assert_eq!(json["repos"][0]["kind"], "repository");
        assert!(json["datasets"].as_array().unwrap().is_empty());
    }
}
