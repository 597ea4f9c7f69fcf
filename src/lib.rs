pub mod config;
pub mod datasource;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;

pub use config::Config;
pub use datasource::{JsonFileSource, MockRecordSource, RecordSource, SourceError};
pub use db::{init_db, Repository};
pub use domain::{
    AssetCategory, ClosedPosition, Conid, Decimal, OpenCloseFlag, OpenLot, Record, Side,
    TaxBucket, TaxStatement, TransactionId,
};
pub use engine::{MatchError, MatchOutcome, Matcher, PositionLedger};
pub use error::AppError;
pub use orchestration::{Ingestor, RunSummary, TaxRunner};
