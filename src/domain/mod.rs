//! Domain types for the FIFO tax-lot engine.

pub mod decimal;
pub mod lot;
pub mod primitives;
pub mod record;
pub mod tax;

pub use decimal::Decimal;
pub use lot::{ClosedPosition, OpenLot};
pub use primitives::{AssetCategory, Conid, OpenCloseFlag, Side, TransactionId};
pub use record::{days_in_trade, days_to_expiration, Record, ACTION_SELL_TO_CLOSE};
pub use tax::{TaxBucket, TaxStatement};
