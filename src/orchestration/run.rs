use crate::config::Config;
use crate::db::Repository;
use crate::domain::{Record, TaxStatement};
use crate::engine::{audit, tax, AuditField, MatchError, MatchOutcome, Matcher, PositionLedger};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Runs one position-matching and tax-classification pass over the
/// persisted record stream.
///
/// The open-lot table is loaded once at run start; all lot changes are
/// journaled in memory and flushed in a single transaction at run end.
#[derive(Clone)]
pub struct TaxRunner {
    repo: Arc<Repository>,
    config: Config,
}

impl TaxRunner {
    pub fn new(repo: Arc<Repository>, config: Config) -> Self {
        Self { repo, config }
    }

    /// Process the full record stream in ledger-event order.
    ///
    /// A record with an unknown open/close flag aborts the run before any
    /// lot changes are flushed; skips (no open lot, zero quantity) are
    /// recoverable and counted in the summary.
    pub async fn run(&self) -> Result<RunSummary, RunError> {
        let open_lots = self.repo.load_open_lots().await?;
        info!(seeded_lots = open_lots.len(), "Starting matching run");
        let mut matcher = Matcher::new(PositionLedger::from_lots(open_lots));

        let records = self.repo.fetch_joined_records().await?;
        let mut summary = RunSummary::default();

        for record in &records {
            if let Some(max) = self.config.max_records {
                if summary.records_processed >= max {
                    info!(max, "Record window exhausted, stopping run");
                    break;
                }
            }

            if record.level_of_detail != self.config.base_currency_level {
                debug!(
                    transaction_id = %record.transaction_id,
                    level_of_detail = %record.level_of_detail,
                    "Skipping non-base-currency row"
                );
                summary.skipped_level_of_detail += 1;
                continue;
            }

            match matcher.process(record)? {
                MatchOutcome::Opened { narrative, .. } => {
                    self.repo
                        .append_audit_note(record.transaction_id, AuditField::OpInfo, &narrative)
                        .await?;
                    summary.lots_opened += 1;
                }
                MatchOutcome::Closed {
                    position, narrative, ..
                } => {
                    self.repo.insert_closed_position(&position).await?;
                    self.repo
                        .append_audit_note(record.transaction_id, AuditField::OpInfo, &narrative)
                        .await?;
                    summary.positions_closed += 1;
                }
                MatchOutcome::SkippedNoOpenLot | MatchOutcome::SkippedZeroQuantity => {
                    summary.closes_skipped += 1;
                }
            }

            self.record_tax_statement(record).await?;
            summary.statements_inserted += 1;
            summary.records_processed += 1;
        }

        let mutations = matcher.into_ledger().take_mutations();
        self.repo.apply_lot_mutations(&mutations).await?;

        info!(
            records_processed = summary.records_processed,
            skipped_level_of_detail = summary.skipped_level_of_detail,
            lots_opened = summary.lots_opened,
            positions_closed = summary.positions_closed,
            closes_skipped = summary.closes_skipped,
            lot_mutations = mutations.len(),
            "Matching run completed"
        );
        Ok(summary)
    }

    async fn record_tax_statement(&self, record: &Record) -> Result<(), RunError> {
        let fifo_result = tax::fifo_result(record);
        let comment = audit::tax_narrative(record, fifo_result);

        let statement = TaxStatement {
            transaction_id: record.transaction_id,
            symbol: record.symbol.clone(),
            conid: record.conid,
            description: record.description.clone(),
            asset_category: record.asset_category.clone(),
            open_close: record.open_close.clone(),
            trade_date: record.trade_date,
            tax_year: record.tax_year(),
            side: record.side,
            quantity: record.quantity,
            base_amount: record.trade_amount,
            currency: record.currency.clone(),
            broker_realized: record.broker_realized,
            fifo_result,
            fx_rate_to_base: record.fx_rate_to_base,
            action: record.action.clone(),
            comment: comment.clone(),
        };
        self.repo.insert_tax_statement(&statement).await?;
        self.repo
            .append_audit_note(record.transaction_id, AuditField::TxInfo, &comment)
            .await?;

        if let Some(bucket) = tax::classify_bucket(record, fifo_result) {
            self.repo
                .update_tax_bucket(record.transaction_id, bucket, fifo_result)
                .await?;
        }
        Ok(())
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub records_processed: usize,
    pub skipped_level_of_detail: usize,
    pub statements_inserted: usize,
    pub lots_opened: usize,
    pub positions_closed: usize,
    pub closes_skipped: usize,
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Match(#[from] MatchError),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}
