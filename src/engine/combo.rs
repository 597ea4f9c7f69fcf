//! Combo classification for simultaneously executed option legs.

use crate::domain::{Decimal, Record};

/// Derive the combo tag for an opening record.
///
/// Two legs belong to a combo only when the current record's execution
/// timestamp exactly equals the immediately preceding processed record's.
/// Pairwise only: legs are never compared against the whole timestamp group.
///
/// Long leg (quantity > 0): `BullPS` when the current strike is below the
/// previous one, otherwise `BullCS`. Short leg: `BearPS` when the current
/// strike is above the previous one, otherwise `BearCS`. The tag is
/// `{prefix}-Combo-{transaction id}`; no combo yields the empty string.
pub fn classify(current: &Record, previous: Option<&Record>) -> String {
    let Some(previous) = previous else {
        return String::new();
    };
    if current.executed_at != previous.executed_at {
        return String::new();
    }

    let strike = current.strike.unwrap_or_else(Decimal::zero);
    let prev_strike = previous.strike.unwrap_or_else(Decimal::zero);

    let prefix = if current.quantity.is_positive() {
        if strike < prev_strike {
            "BullPS"
        } else {
            "BullCS"
        }
    } else if strike > prev_strike {
        "BearPS"
    } else {
        "BearCS"
    };

    format!("{}-Combo-{}", prefix, current.transaction_id)
}
