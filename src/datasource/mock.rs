//! Mock record source for testing without file or network access.

use super::{RecordSource, SourceError};
use crate::domain::Record;
use async_trait::async_trait;

/// Mock record source that returns predefined test data.
#[derive(Debug, Clone)]
pub struct MockRecordSource {
    records: Vec<Record>,
    error: Option<SourceError>,
}

impl MockRecordSource {
    /// Create a new mock record source with empty data.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            error: None,
        }
    }

    /// Add a record to the mock source.
    pub fn with_record(mut self, record: Record) -> Self {
        self.records.push(record);
        self
    }

    /// Add multiple records to the mock source.
    pub fn with_records(mut self, records: Vec<Record>) -> Self {
        self.records.extend(records);
        self
    }

    /// Make fetch_records fail with the given error.
    pub fn with_error(mut self, error: SourceError) -> Self {
        self.error = Some(error);
        self
    }
}

impl Default for MockRecordSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordSource for MockRecordSource {
    async fn fetch_records(&self) -> Result<Vec<Record>, SourceError> {
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(self.records.clone()),
        }
    }
}
