//! Audit narratives appended to processed records.
//!
//! Purely observational: the matcher and tax classifier never read these
//! back. Appends are not deduplicated across reruns.

use crate::domain::{Decimal, Record};

/// Audit column a narrative is appended to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditField {
    /// Position-matching narrative (opens and closes).
    OpInfo,
    /// Tax-statement narrative.
    TxInfo,
}

impl AuditField {
    /// The records column this field writes to.
    pub fn column(&self) -> &'static str {
        match self {
            AuditField::OpInfo => "op_info",
            AuditField::TxInfo => "tx_info",
        }
    }
}

/// Narrative for an opened lot.
pub fn open_narrative(record: &Record, combo: &str) -> String {
    format!(
        "Open-Trade {} with total price {} and quantity: {} inserted, Combo: {}",
        record.description, record.trade_amount, record.quantity, combo
    )
}

/// Narrative for a matched close.
pub fn close_narrative(record: &Record) -> String {
    format!(
        "Close-Trade {} with total price {} and quantity: {} inserted",
        record.description, record.trade_amount, record.quantity
    )
}

/// Narrative for an inserted tax statement.
pub fn tax_narrative(record: &Record, fifo_result: Decimal) -> String {
    format!(
        "Tax statement {} {} with total price {} and quantity: {} inserted, FIFO result {}",
        record.open_close, record.description, record.trade_amount, record.quantity, fifo_result
    )
}
