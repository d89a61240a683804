use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use opentelemetry::trace::TraceContextExt;
use serde_json::json;
use thiserror::Error;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::pipeline::PipelineError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl AppError {
    /// Status code and client-facing message for this error.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Pipeline(err) => match err {
                PipelineError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
                PipelineError::NoCompanyInfoFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
                PipelineError::SearchUnavailable(_) | PipelineError::GenerationFailed(_) => {
                    (StatusCode::BAD_GATEWAY, err.to_string())
                }
            },
        }
    }
}

fn get_trace_id() -> Option<String> {
    let span = Span::current();
    let context = span.context();
    let span_ref = context.span();
    let span_context = span_ref.span_context();

    if span_context.is_valid() {
        Some(span_context.trace_id().to_string())
    } else {
        None
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = self.status_and_message();

        match &self {
            AppError::Validation(_) => {}
            AppError::Pipeline(PipelineError::NoCompanyInfoFound(msg)) => {
                tracing::warn!(error = %msg, "No usable company information");
            }
            AppError::Pipeline(err) => {
                tracing::error!(error = %err, "Pipeline error");
            }
        }

        let body = if let Some(trace_id) = get_trace_id() {
            json!({
                "error": error_message,
                "status": status.as_u16(),
                "trace_id": trace_id,
            })
        } else {
            json!({
                "error": error_message,
                "status": status.as_u16(),
            })
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
