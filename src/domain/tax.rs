//! Tax statement row and tax bucket selector.

use crate::domain::{AssetCategory, Conid, Decimal, OpenCloseFlag, Side, TransactionId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One tax-statement row per processed record.
///
/// Inserted once when the record is first processed; mutated exactly once
/// afterwards when a bucket amount is assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxStatement {
    /// Transaction id of the originating record.
    pub transaction_id: TransactionId,
    /// Ticker symbol.
    pub symbol: String,
    /// Instrument contract id.
    pub conid: Conid,
    /// Instrument description.
    pub description: String,
    /// Asset category of the instrument.
    pub asset_category: AssetCategory,
    /// Open/close flag of the record.
    pub open_close: OpenCloseFlag,
    /// Trade date.
    pub trade_date: NaiveDate,
    /// Tax year the trade date falls into.
    pub tax_year: i32,
    /// Trade side.
    pub side: Side,
    /// Signed quantity.
    pub quantity: Decimal,
    /// Trade amount in the reporting base currency.
    pub base_amount: Decimal,
    /// Currency of the ledger amount.
    pub currency: String,
    /// Broker-reported FIFO realized result, if any.
    pub broker_realized: Option<Decimal>,
    /// FIFO realized result used for bucket assignment.
    pub fifo_result: Decimal,
    /// Currency conversion rate to the base currency.
    pub fx_rate_to_base: Decimal,
    /// Broker action code, if any.
    pub action: Option<String>,
    /// Narrative comment for traceability.
    pub comment: String,
}

/// Tax-reporting bucket a realized result is assigned to.
///
/// A tagged field selector mapped to a fixed column, so bucket updates are
/// always parameterized SQL against a static column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaxBucket {
    /// Premium / gain on the option-writer side.
    OptionWriterGain,
    /// Loss on the option-writer side.
    OptionWriterLoss,
    /// Gain on the option-buyer side.
    OptionBuyerGain,
    /// Loss on the option-buyer side.
    OptionBuyerLoss,
    /// Realized stock gain.
    StockGain,
    /// Realized stock loss.
    StockLoss,
}

impl TaxBucket {
    /// The tax-statement column this bucket writes to.
    pub fn column(&self) -> &'static str {
        match self {
            TaxBucket::OptionWriterGain => "amount_option_writer_gain",
            TaxBucket::OptionWriterLoss => "amount_option_writer_loss",
            TaxBucket::OptionBuyerGain => "amount_option_buyer_gain",
            TaxBucket::OptionBuyerLoss => "amount_option_buyer_loss",
            TaxBucket::StockGain => "amount_stock_gain",
            TaxBucket::StockLoss => "amount_stock_loss",
        }
    }
}

impl std::fmt::Display for TaxBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.column())
    }
}
