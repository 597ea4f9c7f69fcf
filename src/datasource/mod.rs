//! Record source abstraction for fetching joined trade/ledger records.

use crate::domain::Record;
use async_trait::async_trait;
use std::fmt;

pub mod json_file;
pub mod mock;

pub use json_file::JsonFileSource;
pub use mock::MockRecordSource;

/// Source of joined trade + cash-ledger records.
///
/// Implementations must return records in a deterministic order; the
/// pipeline re-sorts by ledger-event id after persistence anyway.
#[async_trait]
pub trait RecordSource: Send + Sync + fmt::Debug {
    /// Fetch all available records from the source.
    async fn fetch_records(&self) -> Result<Vec<Record>, SourceError>;
}

/// Error type for record source operations.
#[derive(Debug, Clone)]
pub enum SourceError {
    /// I/O error reading the source (file missing, permission denied)
    IoError(String),
    /// Parsing error (invalid JSON or malformed record)
    ParseError(String),
    /// Other error
    Other(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::IoError(msg) => write!(f, "I/O error: {}", msg),
            SourceError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            SourceError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for SourceError {}
