//! Researches a company on the web and proposes AI/ML use cases, each
//! enriched with related datasets, open-source repositories and papers.

pub mod config;
pub mod content;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod resources;
pub mod routes;
pub mod search;
pub mod telemetry;

use std::sync::Arc;

use config::Config;
use pipeline::ReportOrchestrator;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub orchestrator: Arc<ReportOrchestrator>,
}
