use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::pipeline::Report;

#[derive(Debug, Deserialize)]
pub struct CreateReportBody {
    #[serde(default)]
    pub company_name: String,
}

#[derive(Debug, Serialize)]
pub struct CreateReportResponse {
    pub filename: String,
    pub report: Report,
}

pub async fn create_report(
    State(state): State<AppState>,
    Json(body): Json<CreateReportBody>,
) -> AppResult<Json<CreateReportResponse>> {
    let company_name = body.company_name.trim();
    if company_name.is_empty() {
        return Err(AppError::Validation("company_name must not be empty".into()));
    }

    tracing::info!(
        company.name = %company_name,
        llm.model = %state.config.llm_model,
        "Generating use case report"
    );

    let report = state.orchestrator.run(company_name).await?;

    Ok(Json(CreateReportResponse {
        filename: report.filename(),
        report,
    }))
}
