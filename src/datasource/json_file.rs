//! Record source backed by a JSON export file.

use super::{RecordSource, SourceError};
use crate::domain::Record;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

/// Reads a JSON array of joined records from a broker export file.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RecordSource for JsonFileSource {
    async fn fetch_records(&self) -> Result<Vec<Record>, SourceError> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| SourceError::IoError(format!("{}: {}", self.path.display(), e)))?;

        let records: Vec<Record> = serde_json::from_str(&contents)
            .map_err(|e| SourceError::ParseError(format!("{}: {}", self.path.display(), e)))?;

        info!(
            path = %self.path.display(),
            count = records.len(),
            "Loaded records from JSON export"
        );
        Ok(records)
    }
}
