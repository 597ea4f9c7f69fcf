//! Repository layer for database operations.
//!
//! This module provides the `Repository` struct for all database operations.
//! Methods are organized across submodules by domain:
//! - `lots.rs` - open-lot and closed-position operations
//! - `tax.rs` - tax-statement operations
//!
//! Monetary values and dates are stored as canonical strings; parsing back
//! falls back to a logged default rather than failing the whole fetch.

mod lots;
mod tax;

use crate::domain::{
    AssetCategory, Conid, Decimal, OpenCloseFlag, Record, Side, TransactionId,
};
use crate::engine::AuditField;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use tracing::warn;

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // =========================================================================
    // Record operations
    // =========================================================================

    /// Insert records idempotently in a single transaction.
    ///
    /// Returns the number of newly inserted records (excludes duplicates).
    ///
    /// # Errors
    /// Returns an error if the transaction fails.
    pub async fn insert_records_batch(&self, records: &[Record]) -> Result<usize, sqlx::Error> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut total_inserted = 0usize;
        let mut tx = self.pool.begin().await?;

        for record in records {
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO records (
                    ledger_event_id, transaction_id, conid, symbol, description,
                    side, quantity, asset_category, strike, expiry,
                    executed_at, trade_date, open_close, trade_amount, ledger_amount,
                    currency, broker_realized, fx_rate_to_base, action, level_of_detail
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(record.ledger_event_id)
            .bind(record.transaction_id.as_i64())
            .bind(record.conid.as_i64())
            .bind(&record.symbol)
            .bind(&record.description)
            .bind(record.side.as_str())
            .bind(record.quantity.to_canonical_string())
            .bind(record.asset_category.as_str())
            .bind(record.strike.map(|s| s.to_canonical_string()))
            .bind(record.expiry.map(|d| d.to_string()))
            // NaiveDateTime's Display uses a space separator, which its
            // FromStr does not accept. Store the T-separated form instead.
            .bind(record.executed_at.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
            .bind(record.trade_date.to_string())
            .bind(record.open_close.as_str())
            .bind(record.trade_amount.to_canonical_string())
            .bind(record.ledger_amount.to_canonical_string())
            .bind(&record.currency)
            .bind(record.broker_realized.map(|r| r.to_canonical_string()))
            .bind(record.fx_rate_to_base.to_canonical_string())
            .bind(record.action.as_deref())
            .bind(&record.level_of_detail)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() > 0 {
                total_inserted += 1;
            }
        }

        tx.commit().await?;
        Ok(total_inserted)
    }

    /// Fetch the joined record stream, ordered by ledger-event id ascending.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn fetch_joined_records(&self) -> Result<Vec<Record>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT ledger_event_id, transaction_id, conid, symbol, description,
                   side, quantity, asset_category, strike, expiry,
                   executed_at, trade_date, open_close, trade_amount, ledger_amount,
                   currency, broker_realized, fx_rate_to_base, action, level_of_detail
            FROM records
            ORDER BY ledger_event_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(record_from_row).collect())
    }

    // =========================================================================
    // Audit narrative operations
    // =========================================================================

    /// Append a one-line narrative to a record's audit field.
    ///
    /// Append-only: existing narrative is kept and the new line is joined
    /// with "; ". Reprocessing the same transaction id is not deduplicated.
    pub async fn append_audit_note(
        &self,
        transaction_id: TransactionId,
        field: AuditField,
        text: &str,
    ) -> Result<(), sqlx::Error> {
        // Static SQL per field; the column is never spliced from input.
        let sql = match field {
            AuditField::OpInfo => {
                r#"
                UPDATE records
                SET op_info = CASE
                    WHEN op_info IS NULL OR op_info = '' THEN ?1
                    ELSE op_info || '; ' || ?1
                END
                WHERE transaction_id = ?2
                "#
            }
            AuditField::TxInfo => {
                r#"
                UPDATE records
                SET tx_info = CASE
                    WHEN tx_info IS NULL OR tx_info = '' THEN ?1
                    ELSE tx_info || '; ' || ?1
                END
                WHERE transaction_id = ?2
                "#
            }
        };

        sqlx::query(sql)
            .bind(text)
            .bind(transaction_id.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Read back a record's audit field (diagnostics and tests).
    pub async fn get_audit_note(
        &self,
        transaction_id: TransactionId,
        field: AuditField,
    ) -> Result<Option<String>, sqlx::Error> {
        let sql = match field {
            AuditField::OpInfo => "SELECT op_info FROM records WHERE transaction_id = ?",
            AuditField::TxInfo => "SELECT tx_info FROM records WHERE transaction_id = ?",
        };
        let row = sqlx::query(sql)
            .bind(transaction_id.as_i64())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.and_then(|r| r.get(0)))
    }
}

// =============================================================================
// Row parsing helpers (lossy with warnings)
// =============================================================================

pub(crate) fn parse_decimal(value: &str, context: &'static str) -> Decimal {
    Decimal::from_str(value).unwrap_or_else(|e| {
        warn!(
            value = %value,
            context,
            error = %e,
            "Failed to parse stored decimal, using default"
        );
        Decimal::default()
    })
}

pub(crate) fn parse_opt_decimal(value: Option<String>, context: &'static str) -> Option<Decimal> {
    value.map(|v| parse_decimal(&v, context))
}

pub(crate) fn parse_date(value: &str, context: &'static str) -> NaiveDate {
    value.parse().unwrap_or_else(|e| {
        warn!(
            value = %value,
            context,
            error = %e,
            "Failed to parse stored date, using epoch"
        );
        NaiveDate::from_ymd_opt(1970, 1, 1).expect("epoch date")
    })
}

pub(crate) fn parse_datetime(value: &str, context: &'static str) -> NaiveDateTime {
    value.parse().unwrap_or_else(|e| {
        warn!(
            value = %value,
            context,
            error = %e,
            "Failed to parse stored datetime, using epoch"
        );
        NaiveDate::from_ymd_opt(1970, 1, 1)
            .expect("epoch date")
            .and_hms_opt(0, 0, 0)
            .expect("epoch time")
    })
}

pub(crate) fn parse_side(value: &str) -> Side {
    Side::parse(value).unwrap_or_else(|| {
        warn!(value = %value, "Unexpected side value in storage, defaulting to BUY");
        Side::Buy
    })
}

fn record_from_row(row: &SqliteRow) -> Record {
    let side: String = row.get("side");
    let quantity: String = row.get("quantity");
    let asset_category: String = row.get("asset_category");
    let strike: Option<String> = row.get("strike");
    let expiry: Option<String> = row.get("expiry");
    let executed_at: String = row.get("executed_at");
    let trade_date: String = row.get("trade_date");
    let open_close: String = row.get("open_close");
    let trade_amount: String = row.get("trade_amount");
    let ledger_amount: String = row.get("ledger_amount");
    let broker_realized: Option<String> = row.get("broker_realized");
    let fx_rate_to_base: String = row.get("fx_rate_to_base");

    Record {
        transaction_id: TransactionId::new(row.get("transaction_id")),
        ledger_event_id: row.get("ledger_event_id"),
        conid: Conid::new(row.get("conid")),
        symbol: row.get("symbol"),
        description: row.get("description"),
        side: parse_side(&side),
        quantity: parse_decimal(&quantity, "records.quantity"),
        asset_category: AssetCategory::from(asset_category),
        strike: parse_opt_decimal(strike, "records.strike"),
        expiry: expiry.map(|d| parse_date(&d, "records.expiry")),
        executed_at: parse_datetime(&executed_at, "records.executed_at"),
        trade_date: parse_date(&trade_date, "records.trade_date"),
        open_close: OpenCloseFlag::from(open_close),
        trade_amount: parse_decimal(&trade_amount, "records.trade_amount"),
        ledger_amount: parse_decimal(&ledger_amount, "records.ledger_amount"),
        currency: row.get("currency"),
        broker_realized: parse_opt_decimal(broker_realized, "records.broker_realized"),
        fx_rate_to_base: parse_decimal(&fx_rate_to_base, "records.fx_rate_to_base"),
        action: row.get("action"),
        level_of_detail: row.get("level_of_detail"),
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{sample_record, setup_test_db};
    use super::*;

    #[tokio::test]
    async fn test_insert_and_fetch_records_ordered() {
        let (repo, _temp) = setup_test_db().await;

        let r2 = sample_record(2, OpenCloseFlag::Close);
        let r1 = sample_record(1, OpenCloseFlag::Open);
        let inserted = repo
            .insert_records_batch(&[r2.clone(), r1.clone()])
            .await
            .unwrap();
        assert_eq!(inserted, 2);

        let records = repo.fetch_joined_records().await.unwrap();
        assert_eq!(records, vec![r1, r2]);
    }

    #[tokio::test]
    async fn test_insert_records_batch_is_idempotent() {
        let (repo, _temp) = setup_test_db().await;

        let record = sample_record(1, OpenCloseFlag::Open);
        assert_eq!(
            repo.insert_records_batch(&[record.clone()]).await.unwrap(),
            1
        );
        assert_eq!(repo.insert_records_batch(&[record]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_record_roundtrip_with_optional_fields() {
        let (repo, _temp) = setup_test_db().await;

        let mut record = sample_record(1, OpenCloseFlag::Open);
        record.asset_category = AssetCategory::Option;
        record.strike = Some(Decimal::from_str("110.5").unwrap());
        record.expiry = NaiveDate::from_ymd_opt(2023, 3, 17);
        record.broker_realized = Some(Decimal::from_str("-12.25").unwrap());
        record.action = Some("STC".to_string());

        repo.insert_records_batch(&[record.clone()]).await.unwrap();
        let fetched = repo.fetch_joined_records().await.unwrap();
        assert_eq!(fetched, vec![record]);
    }

    #[tokio::test]
    async fn test_executed_at_roundtrips_exactly() {
        let (repo, _temp) = setup_test_db().await;

        // Two records one second apart: the instants must come back distinct,
        // or simultaneous-execution detection breaks downstream.
        let mut r1 = sample_record(1, OpenCloseFlag::Open);
        r1.executed_at = NaiveDate::from_ymd_opt(2023, 3, 1)
            .unwrap()
            .and_hms_opt(15, 30, 30)
            .unwrap();
        let mut r2 = sample_record(2, OpenCloseFlag::Open);
        r2.executed_at = NaiveDate::from_ymd_opt(2023, 3, 1)
            .unwrap()
            .and_hms_opt(15, 30, 31)
            .unwrap();

        repo.insert_records_batch(&[r1.clone(), r2.clone()])
            .await
            .unwrap();
        let fetched = repo.fetch_joined_records().await.unwrap();
        assert_eq!(fetched[0].executed_at, r1.executed_at);
        assert_eq!(fetched[1].executed_at, r2.executed_at);
        assert_ne!(fetched[0].executed_at, fetched[1].executed_at);
    }

    #[tokio::test]
    async fn test_append_audit_note_appends() {
        let (repo, _temp) = setup_test_db().await;
        let record = sample_record(1, OpenCloseFlag::Open);
        repo.insert_records_batch(&[record]).await.unwrap();

        let txn = TransactionId::new(1);
        repo.append_audit_note(txn, AuditField::OpInfo, "first")
            .await
            .unwrap();
        repo.append_audit_note(txn, AuditField::OpInfo, "second")
            .await
            .unwrap();
        repo.append_audit_note(txn, AuditField::TxInfo, "tax")
            .await
            .unwrap();

        let op_info = repo.get_audit_note(txn, AuditField::OpInfo).await.unwrap();
        assert_eq!(op_info.as_deref(), Some("first; second"));

        let tx_info = repo.get_audit_note(txn, AuditField::TxInfo).await.unwrap();
        assert_eq!(tx_info.as_deref(), Some("tax"));
    }
}
