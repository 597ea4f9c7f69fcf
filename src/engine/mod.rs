//! Pure matching, combo, and tax-classification logic.

pub mod audit;
pub mod combo;
pub mod ledger;
pub mod matcher;
pub mod tax;

pub use audit::AuditField;
pub use ledger::{LedgerError, LotMutation, PositionLedger};
pub use matcher::{MatchError, MatchOutcome, Matcher};
