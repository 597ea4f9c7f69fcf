use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Ingestion error: {0}")]
    Ingestion(String),
    #[error("Run error: {0}")]
    Run(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<crate::config::ConfigError> for AppError {
    fn from(err: crate::config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<crate::orchestration::ingest::IngestionError> for AppError {
    fn from(err: crate::orchestration::ingest::IngestionError) -> Self {
        AppError::Ingestion(err.to_string())
    }
}

impl From<crate::orchestration::run::RunError> for AppError {
    fn from(err: crate::orchestration::run::RunError) -> Self {
        AppError::Run(err.to_string())
    }
}
