use crate::datasource::{RecordSource, SourceError};
use crate::db::Repository;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Clone)]
pub struct Ingestor {
    source: Arc<dyn RecordSource>,
    repo: Arc<Repository>,
}

impl Ingestor {
    pub fn new(source: Arc<dyn RecordSource>, repo: Arc<Repository>) -> Self {
        Self { source, repo }
    }

    /// Fetch records from the source, drop invalid ones with a warning, and
    /// persist the rest idempotently.
    ///
    /// Re-running over a stream that was already ingested inserts nothing;
    /// duplicate transaction ids never produce duplicate rows.
    pub async fn ingest(&self) -> Result<IngestionResult, IngestionError> {
        let fetched = self.source.fetch_records().await?;
        let total_fetched = fetched.len();

        let mut valid = Vec::with_capacity(fetched.len());
        for record in fetched {
            match record.missing_required_field() {
                Some(field) => {
                    warn!(
                        transaction_id = %record.transaction_id,
                        field,
                        "Dropping record with missing required field"
                    );
                }
                None => valid.push(record),
            }
        }

        let dropped = total_fetched - valid.len();
        let inserted = self.repo.insert_records_batch(&valid).await?;

        info!(
            fetched = total_fetched,
            dropped,
            inserted,
            "Ingestion completed"
        );
        Ok(IngestionResult {
            fetched: total_fetched,
            dropped,
            inserted,
        })
    }
}

#[derive(Debug)]
pub struct IngestionResult {
    pub fetched: usize,
    pub dropped: usize,
    pub inserted: usize,
}

#[derive(Debug, Error)]
pub enum IngestionError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}
