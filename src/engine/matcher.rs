//! FIFO open/close matching over the ordered record stream.

use crate::domain::{days_in_trade, ClosedPosition, OpenCloseFlag, OpenLot, Record, TransactionId};
use crate::engine::ledger::{LedgerError, PositionLedger};
use crate::engine::{audit, combo, tax};
use thiserror::Error;
use tracing::{info, warn};

/// Errors that abort the run.
#[derive(Debug, Error, PartialEq)]
pub enum MatchError {
    /// The open/close flag was outside {Open, Close}: corrupted input.
    #[error("invalid open/close flag '{flag}' on transaction {transaction_id}")]
    InvalidFlag {
        transaction_id: TransactionId,
        flag: String,
    },
    /// A ledger mutation failed; the upstream validation contract is broken.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// What processing one record did to the ledger.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// A new lot was opened.
    Opened { lot: OpenLot, narrative: String },
    /// A close matched the earliest open lot.
    Closed {
        position: ClosedPosition,
        narrative: String,
        fully_closed: bool,
    },
    /// A close arrived with no open lot for its instrument; skipped.
    /// No synthetic short lot is ever inferred.
    SkippedNoOpenLot,
    /// A close arrived with zero quantity; skipped (caught divide-by-zero).
    SkippedZeroQuantity,
}

/// The FIFO open/close state machine.
///
/// Owns the ledger for the run's duration and carries the previously
/// processed record explicitly for combo classification.
#[derive(Debug)]
pub struct Matcher {
    ledger: PositionLedger,
    previous: Option<Record>,
}

impl Matcher {
    /// Create a matcher over a (possibly pre-seeded) ledger.
    pub fn new(ledger: PositionLedger) -> Self {
        Self {
            ledger,
            previous: None,
        }
    }

    /// Process one record in stream order.
    ///
    /// Recoverable conditions (no matching lot, zero-quantity close) are
    /// returned as skip outcomes; only stream corruption is an error.
    pub fn process(&mut self, record: &Record) -> Result<MatchOutcome, MatchError> {
        let outcome = match record.open_close {
            OpenCloseFlag::Open => self.open(record)?,
            OpenCloseFlag::Close => self.close(record)?,
            OpenCloseFlag::Unknown(ref flag) => {
                return Err(MatchError::InvalidFlag {
                    transaction_id: record.transaction_id,
                    flag: flag.clone(),
                });
            }
        };
        self.previous = Some(record.clone());
        Ok(outcome)
    }

    fn open(&mut self, record: &Record) -> Result<MatchOutcome, MatchError> {
        let combo = combo::classify(record, self.previous.as_ref());
        let lot = self.ledger.create_lot(record, combo.clone())?;
        let narrative = audit::open_narrative(record, &combo);
        info!(
            transaction_id = %record.transaction_id,
            conid = %record.conid,
            quantity = %record.quantity,
            combo = %combo,
            "opened lot"
        );
        Ok(MatchOutcome::Opened { lot, narrative })
    }

    fn close(&mut self, record: &Record) -> Result<MatchOutcome, MatchError> {
        let Some(lot) = self.ledger.find_earliest_open_lot(record.conid) else {
            warn!(
                transaction_id = %record.transaction_id,
                conid = %record.conid,
                "no open position found, nothing to close"
            );
            return Ok(MatchOutcome::SkippedNoOpenLot);
        };

        let Some(realized) = tax::realized_result(lot.amount, record.quantity, record.trade_amount)
        else {
            warn!(
                transaction_id = %record.transaction_id,
                conid = %record.conid,
                "zero-quantity close, skipping record"
            );
            return Ok(MatchOutcome::SkippedZeroQuantity);
        };

        let comment = format!(
            "{} {} --> {} {} {} Result: {}",
            lot.asset_category, lot.side, record.side, lot.amount, record.trade_amount, realized
        );
        let position = ClosedPosition {
            transaction_id: record.transaction_id,
            symbol: record.symbol.clone(),
            description: record.description.clone(),
            conid: record.conid,
            asset_category: record.asset_category.clone(),
            open_transaction_id: lot.transaction_id,
            open_side: lot.side,
            open_date: lot.trade_date,
            open_amount: lot.amount,
            open_quantity: lot.quantity,
            days_to_expiration: lot.days_to_expiration,
            close_date: record.trade_date,
            days_in_trade: days_in_trade(lot.trade_date, record.trade_date),
            close_amount: record.trade_amount,
            close_quantity: record.quantity,
            close_side: record.side,
            realized,
            comment,
        };

        // Single-lot-per-close: an oversized close consumes this lot entirely
        // and the excess is not matched against the next lot.
        let fully_closed = record.quantity.abs() >= lot.quantity.abs();
        if fully_closed {
            self.ledger.delete_lot(&lot);
        } else {
            self.ledger
                .reduce_lot(&lot, record.quantity, record.ledger_amount)?;
        }

        let narrative = audit::close_narrative(record);
        info!(
            transaction_id = %record.transaction_id,
            conid = %record.conid,
            open_transaction_id = %lot.transaction_id,
            realized = %realized,
            fully_closed,
            "closed against lot"
        );
        Ok(MatchOutcome::Closed {
            position,
            narrative,
            fully_closed,
        })
    }

    /// Read access to the ledger (diagnostics and tests).
    pub fn ledger(&self) -> &PositionLedger {
        &self.ledger
    }

    /// Consume the matcher and hand the ledger back for the flush.
    pub fn into_ledger(self) -> PositionLedger {
        self.ledger
    }
}
