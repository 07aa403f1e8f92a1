pub mod config;
pub mod embedding;
pub mod errors;
pub mod export;
pub mod filing;
pub mod ingest;
pub mod parsing;
pub mod pipeline;
pub mod records;
pub mod retrieval;
pub mod store;

// Re-exports
pub use config::PipelineConfig;
pub use errors::PipelineError;
pub use filing::{Filing, FilingFiles, FormType};
pub use ingest::IngestReport;
pub use pipeline::{BatchReport, Extraction, FilingStatus, Pipeline};
pub use store::{ScoredRecord, SearchFilter};
