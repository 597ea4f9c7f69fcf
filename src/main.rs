use fifotax::datasource::JsonFileSource;
use fifotax::error::AppError;
use fifotax::orchestration::{Ingestor, TaxRunner};
use fifotax::{config::Config, db::init_db, RecordSource, Repository};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let config = Config::from_env()?;

    let pool = init_db(&config.database_path).await?;
    let repo = Arc::new(Repository::new(pool));
    let source: Arc<dyn RecordSource> = Arc::new(JsonFileSource::new(&config.records_path));

    let ingestion = Ingestor::new(source, repo.clone()).ingest().await?;
    tracing::info!(
        fetched = ingestion.fetched,
        dropped = ingestion.dropped,
        inserted = ingestion.inserted,
        "Ingestion finished"
    );

    let summary = TaxRunner::new(repo, config).run().await?;
    tracing::info!(
        records_processed = summary.records_processed,
        skipped_level_of_detail = summary.skipped_level_of_detail,
        lots_opened = summary.lots_opened,
        positions_closed = summary.positions_closed,
        closes_skipped = summary.closes_skipped,
        statements_inserted = summary.statements_inserted,
        "Run finished"
    );
    Ok(())
}
