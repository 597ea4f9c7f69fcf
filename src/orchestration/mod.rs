//! Pipeline orchestration: ingestion and the position-matching run.

pub mod ingest;
pub mod run;

pub use ingest::{IngestionError, IngestionResult, Ingestor};
pub use run::{RunError, RunSummary, TaxRunner};
