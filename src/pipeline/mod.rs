pub mod format;
pub mod generate;
pub mod keywords;
pub mod orchestrator;

pub use format::{EnrichedUseCase, Report, report_filename};
pub use generate::{GeneratedUseCases, GenerationError, UseCase, UseCaseGenerator, UseCaseSource};
pub use keywords::{KeywordExtractor, Separator};
pub use orchestrator::{PipelineError, PipelineSettings, ReportOrchestrator, ResourceFinders};
