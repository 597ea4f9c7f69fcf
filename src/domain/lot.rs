//! Open-lot and closed-position entities.

use crate::domain::{AssetCategory, Conid, Decimal, Side, TransactionId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An open position lot: the still-unclosed remainder of one opening record.
///
/// Owned exclusively by the position ledger. Quantity and amount share the
/// sign family of the originating side and only shrink toward zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenLot {
    /// Instrument contract id.
    pub conid: Conid,
    /// Ticker symbol.
    pub symbol: String,
    /// Instrument description.
    pub description: String,
    /// Signed remaining quantity.
    pub quantity: Decimal,
    /// Remaining ledger amount for the lot.
    pub amount: Decimal,
    /// Originating transaction id; FIFO ordering key.
    pub transaction_id: TransactionId,
    /// Asset category of the instrument.
    pub asset_category: AssetCategory,
    /// Side of the opening trade.
    pub side: Side,
    /// Opening trade date.
    pub trade_date: NaiveDate,
    /// Days from the opening trade date to expiry (0 if none).
    pub days_to_expiration: i64,
    /// Combo strategy tag; empty when the leg was not part of a combo.
    pub combo: String,
}

/// A completed match of a closing record against an open lot.
///
/// Created once per successful close; immutable thereafter. Pure audit/report
/// output, never read back by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedPosition {
    /// Transaction id of the closing record.
    pub transaction_id: TransactionId,
    /// Ticker symbol.
    pub symbol: String,
    /// Instrument description.
    pub description: String,
    /// Instrument contract id.
    pub conid: Conid,
    /// Asset category of the instrument.
    pub asset_category: AssetCategory,
    /// Transaction id of the matched open lot.
    pub open_transaction_id: TransactionId,
    /// Side of the opening trade.
    pub open_side: Side,
    /// Opening trade date.
    pub open_date: NaiveDate,
    /// Ledger amount of the matched lot at close time.
    pub open_amount: Decimal,
    /// Quantity remaining on the lot when the close matched it.
    pub open_quantity: Decimal,
    /// Days from the opening trade date to expiry (0 if none).
    pub days_to_expiration: i64,
    /// Closing trade date.
    pub close_date: NaiveDate,
    /// Days the position was held.
    pub days_in_trade: i64,
    /// Trade amount of the closing record.
    pub close_amount: Decimal,
    /// Signed quantity of the closing record.
    pub close_quantity: Decimal,
    /// Side of the closing trade.
    pub close_side: Side,
    /// Realized monetary result of the close.
    pub realized: Decimal,
    /// One-line narrative of the match.
    pub comment: String,
}
