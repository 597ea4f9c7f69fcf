//! Record type representing a joined trade + cash-ledger event.

use crate::domain::{AssetCategory, Conid, Decimal, OpenCloseFlag, Side, TransactionId};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Action code the broker reports for sell/buy-to-close executions.
pub const ACTION_SELL_TO_CLOSE: &str = "STC";

/// A single joined trade-execution + cash-ledger record.
///
/// This is the already-parsed, already-typed input to the matching engine;
/// feed parsing lives outside this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Globally unique broker transaction id.
    pub transaction_id: TransactionId,
    /// Cash-ledger event id; primary ordering key of the stream.
    pub ledger_event_id: i64,
    /// Instrument contract id.
    pub conid: Conid,
    /// Ticker symbol.
    pub symbol: String,
    /// Instrument description.
    pub description: String,
    /// Trade side (BUY or SELL).
    pub side: Side,
    /// Signed quantity (positive for buys, negative for sells).
    pub quantity: Decimal,
    /// Asset category (STK, OPT, ...).
    pub asset_category: AssetCategory,
    /// Option strike, if any.
    pub strike: Option<Decimal>,
    /// Option expiry date, if any.
    pub expiry: Option<NaiveDate>,
    /// Execution timestamp; combo legs share this exactly.
    pub executed_at: NaiveDateTime,
    /// Trade date.
    pub trade_date: NaiveDate,
    /// Open/close flag.
    pub open_close: OpenCloseFlag,
    /// Trade monetary amount.
    pub trade_amount: Decimal,
    /// Cash-ledger monetary amount.
    pub ledger_amount: Decimal,
    /// Currency of the ledger amount.
    pub currency: String,
    /// Broker-reported FIFO realized result, if any.
    pub broker_realized: Option<Decimal>,
    /// Currency conversion rate to the base currency.
    pub fx_rate_to_base: Decimal,
    /// Broker action code (e.g. "STC"), if any.
    pub action: Option<String>,
    /// Ledger level-of-detail marker; only base-currency rows are processed.
    pub level_of_detail: String,
}

impl Record {
    /// Returns the name of the first missing/invalid required field, or None
    /// if the record is fit for the matcher. Invalid records are dropped at
    /// ingestion with a warning and never reach the engine.
    pub fn missing_required_field(&self) -> Option<&'static str> {
        if self.transaction_id.as_i64() <= 0 {
            return Some("transaction_id");
        }
        if self.ledger_event_id <= 0 {
            return Some("ledger_event_id");
        }
        if self.conid.as_i64() <= 0 {
            return Some("conid");
        }
        if self.currency.is_empty() {
            return Some("currency");
        }
        None
    }

    /// True for option executions the broker flagged as sell/buy-to-close.
    pub fn is_sell_to_close(&self) -> bool {
        self.action.as_deref() == Some(ACTION_SELL_TO_CLOSE)
    }

    /// Calendar year the trade falls into, for the tax statement row.
    pub fn tax_year(&self) -> i32 {
        self.trade_date.year()
    }
}

/// Days from trade date to expiry; 0 when the instrument has no expiry.
pub fn days_to_expiration(expiry: Option<NaiveDate>, trade_date: NaiveDate) -> i64 {
    match expiry {
        Some(expiry) => (expiry - trade_date).num_days(),
        None => 0,
    }
}

/// Days between the opening and the closing trade dates.
pub fn days_in_trade(open_date: NaiveDate, close_date: NaiveDate) -> i64 {
    (close_date - open_date).num_days()
}
