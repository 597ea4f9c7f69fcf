//! Realized-result calculation and tax bucket classification.

use crate::domain::{AssetCategory, Decimal, OpenCloseFlag, Record, Side, TaxBucket};

/// Realized monetary result of a close:
/// `(matched lot amount / closing quantity) * closing quantity + closing trade amount`.
///
/// Algebraically this is `lot amount + trade amount` for a nonzero quantity,
/// but the division is performed explicitly so a zero-quantity close surfaces
/// as `None` and is skipped instead of corrupting the ledger.
pub fn realized_result(
    lot_amount: Decimal,
    closing_quantity: Decimal,
    closing_trade_amount: Decimal,
) -> Option<Decimal> {
    lot_amount
        .checked_div(closing_quantity)
        .map(|per_unit| per_unit * closing_quantity + closing_trade_amount)
}

/// FIFO realized result reported on the tax statement.
///
/// Opens book the trade amount. Closes use the broker-reported realized
/// result for stock, and for options flagged sell/buy-to-close; everything
/// else passes the trade amount through. A missing broker-reported result
/// counts as zero.
pub fn fifo_result(record: &Record) -> Decimal {
    if record.open_close == OpenCloseFlag::Open {
        return record.trade_amount;
    }
    match record.asset_category {
        AssetCategory::Stock => record.broker_realized.unwrap_or_else(Decimal::zero),
        AssetCategory::Option if record.is_sell_to_close() => {
            record.broker_realized.unwrap_or_else(Decimal::zero)
        }
        _ => record.trade_amount,
    }
}

/// Assign the record's realized result to a tax bucket; first match wins.
///
/// Writing an option (open + sell + OPT) always books the provisional premium
/// into the writer-gain bucket. Other opens are not yet realized. Closes
/// branch on category: options split writer/buyer by quantity sign and
/// gain/loss by the broker-reported result's sign; stock splits gain/loss by
/// the FIFO result's sign. Pure function of the record fields.
pub fn classify_bucket(record: &Record, fifo_result: Decimal) -> Option<TaxBucket> {
    let is_open = record.open_close == OpenCloseFlag::Open;

    if is_open && record.side == Side::Sell && record.asset_category == AssetCategory::Option {
        return Some(TaxBucket::OptionWriterGain);
    }
    if is_open {
        return None;
    }

    match record.asset_category {
        AssetCategory::Option => {
            let realized = record.broker_realized.unwrap_or_else(Decimal::zero);
            if record.quantity.is_positive() {
                if realized.is_positive() {
                    Some(TaxBucket::OptionWriterGain)
                } else {
                    Some(TaxBucket::OptionWriterLoss)
                }
            } else if realized.is_positive() {
                Some(TaxBucket::OptionBuyerGain)
            } else {
                Some(TaxBucket::OptionBuyerLoss)
            }
        }
        AssetCategory::Stock => {
            if fifo_result.is_positive() {
                Some(TaxBucket::StockGain)
            } else {
                Some(TaxBucket::StockLoss)
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Conid, TransactionId};
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn record(
        flag: OpenCloseFlag,
        side: Side,
        category: AssetCategory,
        quantity: &str,
        trade_amount: &str,
        broker_realized: Option<&str>,
        action: Option<&str>,
    ) -> Record {
        Record {
            transaction_id: TransactionId::new(9),
            ledger_event_id: 9,
            conid: Conid::new(77),
            symbol: "XYZ".to_string(),
            description: "XYZ CORP".to_string(),
            side,
            quantity: d(quantity),
            asset_category: category,
            strike: None,
            expiry: None,
            executed_at: NaiveDate::from_ymd_opt(2023, 5, 2)
                .unwrap()
                .and_hms_opt(16, 0, 0)
                .unwrap(),
            trade_date: NaiveDate::from_ymd_opt(2023, 5, 2).unwrap(),
            open_close: flag,
            trade_amount: d(trade_amount),
            ledger_amount: d(trade_amount),
            currency: "USD".to_string(),
            broker_realized: broker_realized.map(d),
            fx_rate_to_base: d("1"),
            action: action.map(|s| s.to_string()),
            level_of_detail: "BaseCurrency".to_string(),
        }
    }

    #[test]
    fn test_realized_result_arithmetic() {
        // open amount -500, close of quantity 10 with trade amount 520 => 20
        let result = realized_result(d("-500"), d("10"), d("520")).unwrap();
        assert_eq!(result, d("20"));
    }

    #[test]
    fn test_realized_result_zero_quantity_is_none() {
        assert_eq!(realized_result(d("-500"), d("0"), d("520")), None);
    }

    #[test]
    fn test_fifo_result_open_books_trade_amount() {
        let r = record(
            OpenCloseFlag::Open,
            Side::Buy,
            AssetCategory::Stock,
            "10",
            "-500",
            Some("123"),
            None,
        );
        assert_eq!(fifo_result(&r), d("-500"));
    }

    #[test]
    fn test_fifo_result_stock_close_uses_broker_realized() {
        let r = record(
            OpenCloseFlag::Close,
            Side::Sell,
            AssetCategory::Stock,
            "-10",
            "520",
            Some("20"),
            None,
        );
        assert_eq!(fifo_result(&r), d("20"));
    }

    #[test]
    fn test_fifo_result_option_stc_uses_broker_realized() {
        let r = record(
            OpenCloseFlag::Close,
            Side::Sell,
            AssetCategory::Option,
            "-1",
            "95",
            Some("-5"),
            Some("STC"),
        );
        assert_eq!(fifo_result(&r), d("-5"));
    }

    #[test]
    fn test_fifo_result_option_non_stc_passes_trade_amount() {
        let r = record(
            OpenCloseFlag::Close,
            Side::Buy,
            AssetCategory::Option,
            "1",
            "-95",
            Some("-5"),
            Some("BTC"),
        );
        assert_eq!(fifo_result(&r), d("-95"));
    }

    #[test]
    fn test_fifo_result_missing_broker_realized_is_zero() {
        let r = record(
            OpenCloseFlag::Close,
            Side::Sell,
            AssetCategory::Stock,
            "-10",
            "520",
            None,
            None,
        );
        assert_eq!(fifo_result(&r), d("0"));
    }

    #[test]
    fn test_bucket_option_writer_open() {
        let r = record(
            OpenCloseFlag::Open,
            Side::Sell,
            AssetCategory::Option,
            "-1",
            "100",
            None,
            None,
        );
        assert_eq!(
            classify_bucket(&r, fifo_result(&r)),
            Some(TaxBucket::OptionWriterGain)
        );
    }

    #[test]
    fn test_bucket_other_opens_unassigned() {
        let r = record(
            OpenCloseFlag::Open,
            Side::Buy,
            AssetCategory::Stock,
            "10",
            "-500",
            None,
            None,
        );
        assert_eq!(classify_bucket(&r, fifo_result(&r)), None);
    }

    #[test]
    fn test_bucket_option_close_quadrants() {
        // Buy-to-close a written option: writer side.
        let r = record(
            OpenCloseFlag::Close,
            Side::Buy,
            AssetCategory::Option,
            "1",
            "-40",
            Some("60"),
            None,
        );
        assert_eq!(
            classify_bucket(&r, fifo_result(&r)),
            Some(TaxBucket::OptionWriterGain)
        );

        let r = record(
            OpenCloseFlag::Close,
            Side::Buy,
            AssetCategory::Option,
            "1",
            "-140",
            Some("-40"),
            None,
        );
        assert_eq!(
            classify_bucket(&r, fifo_result(&r)),
            Some(TaxBucket::OptionWriterLoss)
        );

        // Sell-to-close a long option: buyer side.
        let r = record(
            OpenCloseFlag::Close,
            Side::Sell,
            AssetCategory::Option,
            "-1",
            "160",
            Some("60"),
            Some("STC"),
        );
        assert_eq!(
            classify_bucket(&r, fifo_result(&r)),
            Some(TaxBucket::OptionBuyerGain)
        );

        let r = record(
            OpenCloseFlag::Close,
            Side::Sell,
            AssetCategory::Option,
            "-1",
            "60",
            Some("-40"),
            Some("STC"),
        );
        assert_eq!(
            classify_bucket(&r, fifo_result(&r)),
            Some(TaxBucket::OptionBuyerLoss)
        );
    }

    #[test]
    fn test_bucket_stock_by_fifo_result_sign() {
        let r = record(
            OpenCloseFlag::Close,
            Side::Sell,
            AssetCategory::Stock,
            "-10",
            "520",
            Some("20"),
            None,
        );
        assert_eq!(
            classify_bucket(&r, fifo_result(&r)),
            Some(TaxBucket::StockGain)
        );

        let r = record(
            OpenCloseFlag::Close,
            Side::Sell,
            AssetCategory::Stock,
            "-10",
            "480",
            Some("-20"),
            None,
        );
        assert_eq!(
            classify_bucket(&r, fifo_result(&r)),
            Some(TaxBucket::StockLoss)
        );
    }

    #[test]
    fn test_bucket_other_category_unassigned() {
        let r = record(
            OpenCloseFlag::Close,
            Side::Sell,
            AssetCategory::Other("FUT".to_string()),
            "-1",
            "100",
            Some("20"),
            None,
        );
        assert_eq!(classify_bucket(&r, fifo_result(&r)), None);
    }

    #[test]
    fn test_classification_is_idempotent() {
        let r = record(
            OpenCloseFlag::Close,
            Side::Sell,
            AssetCategory::Stock,
            "-10",
            "520",
            Some("20"),
            None,
        );
        let fifo = fifo_result(&r);
        let first = classify_bucket(&r, fifo);
        let second = classify_bucket(&r, fifo);
        assert_eq!(first, second);
        assert_eq!(fifo, fifo_result(&r));
    }
}
