//! In-memory open-lot ledger with a mutation journal.
//!
//! The full open-position table is loaded at run start and every mutation is
//! journaled, so the repository can flush the run's effects in one pass while
//! the engine keeps read-your-writes consistency in memory.

use crate::domain::{days_to_expiration, Conid, Decimal, OpenLot, Record, TransactionId};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors from ledger mutations.
#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    /// An opening record reached the ledger without a required field.
    #[error("record {transaction_id} is missing required field '{field}'")]
    MissingField {
        transaction_id: TransactionId,
        field: &'static str,
    },
    /// A reduction targeted a lot that is not in the ledger.
    #[error("open lot {0} not found")]
    LotNotFound(TransactionId),
    /// A reduction would not shrink the lot strictly toward zero (it would
    /// reach zero, cross it, or grow the lot).
    #[error("reducing lot {0} would not shrink it toward zero")]
    SignFlip(TransactionId),
}

/// A journaled ledger mutation, replayed against the repository at run end.
#[derive(Debug, Clone, PartialEq)]
pub enum LotMutation {
    /// A new lot was created from an opening record.
    Insert(OpenLot),
    /// A lot was partially closed; carries the new remaining values.
    Reduce {
        transaction_id: TransactionId,
        quantity: Decimal,
        amount: Decimal,
    },
    /// A lot was fully closed.
    Delete { transaction_id: TransactionId },
}

/// The open-lot table for one run. Sole mutator is the matcher.
#[derive(Debug, Default)]
pub struct PositionLedger {
    // Per conid, lots keyed by originating transaction id ascending (FIFO).
    lots: BTreeMap<Conid, BTreeMap<TransactionId, OpenLot>>,
    mutations: Vec<LotMutation>,
}

impl PositionLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from the persisted open-lot table.
    ///
    /// Seeding does not journal mutations; only changes made during the run
    /// are flushed back.
    pub fn from_lots(lots: Vec<OpenLot>) -> Self {
        let mut ledger = Self::new();
        for lot in lots {
            ledger
                .lots
                .entry(lot.conid)
                .or_default()
                .insert(lot.transaction_id, lot);
        }
        ledger
    }

    /// The open lot with the smallest originating transaction id for the
    /// instrument, or None when no lot is open.
    pub fn find_earliest_open_lot(&self, conid: Conid) -> Option<OpenLot> {
        self.lots
            .get(&conid)
            .and_then(|by_txn| by_txn.values().next())
            .cloned()
    }

    /// Insert a new lot derived from an opening record.
    ///
    /// # Errors
    /// Fails only when the record lacks a required field.
    pub fn create_lot(&mut self, record: &Record, combo: String) -> Result<OpenLot, LedgerError> {
        if let Some(field) = record.missing_required_field() {
            return Err(LedgerError::MissingField {
                transaction_id: record.transaction_id,
                field,
            });
        }

        let lot = OpenLot {
            conid: record.conid,
            symbol: record.symbol.clone(),
            description: record.description.clone(),
            quantity: record.quantity,
            amount: record.ledger_amount,
            transaction_id: record.transaction_id,
            asset_category: record.asset_category.clone(),
            side: record.side,
            trade_date: record.trade_date,
            days_to_expiration: days_to_expiration(record.expiry, record.trade_date),
            combo,
        };

        self.lots
            .entry(lot.conid)
            .or_default()
            .insert(lot.transaction_id, lot.clone());
        self.mutations.push(LotMutation::Insert(lot.clone()));
        Ok(lot)
    }

    /// Reduce a lot in place by the closing quantity and ledger amount.
    ///
    /// The closing values carry the opposite sign of the lot, so addition
    /// shrinks the remainder toward zero. A reduction that would reach or
    /// cross zero is a sign-flip error; full closes go through `delete_lot`.
    pub fn reduce_lot(
        &mut self,
        lot: &OpenLot,
        closing_quantity: Decimal,
        closing_amount: Decimal,
    ) -> Result<(), LedgerError> {
        let stored = self
            .lots
            .get_mut(&lot.conid)
            .and_then(|by_txn| by_txn.get_mut(&lot.transaction_id))
            .ok_or(LedgerError::LotNotFound(lot.transaction_id))?;

        // The closing quantity must oppose the lot's sign: a same-sign (or
        // zero) value would grow the lot instead of shrinking it.
        if closing_quantity.is_zero()
            || closing_quantity.is_positive() == stored.quantity.is_positive()
        {
            return Err(LedgerError::SignFlip(lot.transaction_id));
        }

        let new_quantity = stored.quantity + closing_quantity;
        if new_quantity.is_zero() || new_quantity.is_positive() != stored.quantity.is_positive() {
            return Err(LedgerError::SignFlip(lot.transaction_id));
        }

        stored.quantity = new_quantity;
        stored.amount = stored.amount + closing_amount;
        self.mutations.push(LotMutation::Reduce {
            transaction_id: stored.transaction_id,
            quantity: stored.quantity,
            amount: stored.amount,
        });
        Ok(())
    }

    /// Remove a fully closed lot. Idempotent if the lot is already gone.
    pub fn delete_lot(&mut self, lot: &OpenLot) {
        let removed = self
            .lots
            .get_mut(&lot.conid)
            .and_then(|by_txn| by_txn.remove(&lot.transaction_id));
        if removed.is_some() {
            self.mutations.push(LotMutation::Delete {
                transaction_id: lot.transaction_id,
            });
        }
    }

    /// Number of open lots for the instrument. Diagnostic only.
    pub fn count_open_lots(&self, conid: Conid) -> usize {
        self.lots.get(&conid).map_or(0, |by_txn| by_txn.len())
    }

    /// Net open exposure for the instrument: sum of all open lot quantities.
    pub fn net_exposure(&self, conid: Conid) -> Decimal {
        self.lots.get(&conid).map_or(Decimal::zero(), |by_txn| {
            by_txn
                .values()
                .fold(Decimal::zero(), |acc, lot| acc + lot.quantity)
        })
    }

    /// Drain the journal of mutations accumulated during the run.
    pub fn take_mutations(&mut self) -> Vec<LotMutation> {
        std::mem::take(&mut self.mutations)
    }
}
