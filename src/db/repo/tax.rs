//! Tax-statement repository operations.

use super::{parse_date, parse_decimal, parse_opt_decimal, parse_side, Repository};
use crate::domain::{
    AssetCategory, Conid, Decimal, OpenCloseFlag, TaxBucket, TaxStatement, TransactionId,
};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

impl Repository {
    /// Insert a tax-statement row. One row per processed record.
    ///
    /// # Errors
    /// Returns an error if the insert fails, including on duplicate
    /// transaction ids.
    pub async fn insert_tax_statement(
        &self,
        statement: &TaxStatement,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO tax_statements (
                transaction_id, symbol, conid, description, asset_category,
                open_close, trade_date, tax_year, side, quantity,
                base_amount, currency, broker_realized, fifo_result,
                fx_rate_to_base, action, comment
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(statement.transaction_id.as_i64())
        .bind(&statement.symbol)
        .bind(statement.conid.as_i64())
        .bind(&statement.description)
        .bind(statement.asset_category.as_str())
        .bind(statement.open_close.as_str())
        .bind(statement.trade_date.to_string())
        .bind(statement.tax_year)
        .bind(statement.side.as_str())
        .bind(statement.quantity.to_canonical_string())
        .bind(statement.base_amount.to_canonical_string())
        .bind(&statement.currency)
        .bind(statement.broker_realized.map(|r| r.to_canonical_string()))
        .bind(statement.fifo_result.to_canonical_string())
        .bind(statement.fx_rate_to_base.to_canonical_string())
        .bind(statement.action.as_deref())
        .bind(&statement.comment)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Set the bucket amount on a tax statement.
    ///
    /// The column name comes from the `TaxBucket` enum, never from input, so
    /// the interpolation stays bounded to the six known columns.
    pub async fn update_tax_bucket(
        &self,
        transaction_id: TransactionId,
        bucket: TaxBucket,
        amount: Decimal,
    ) -> Result<(), sqlx::Error> {
        let sql = format!(
            "UPDATE tax_statements SET {} = ? WHERE transaction_id = ?",
            bucket.column()
        );
        sqlx::query(&sql)
            .bind(amount.to_canonical_string())
            .bind(transaction_id.as_i64())
            .execute(self.pool())
            .await?;
        Ok(())
    }

    /// Read back a single bucket amount (reporting and tests).
    pub async fn get_tax_bucket_amount(
        &self,
        transaction_id: TransactionId,
        bucket: TaxBucket,
    ) -> Result<Option<Decimal>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM tax_statements WHERE transaction_id = ?",
            bucket.column()
        );
        let row = sqlx::query(&sql)
            .bind(transaction_id.as_i64())
            .fetch_optional(self.pool())
            .await?;

        let value: Option<String> = match row {
            Some(r) => r.get(0),
            None => None,
        };
        Ok(parse_opt_decimal(value, "tax_statements.bucket"))
    }

    /// Load all tax statements for a tax year, in transaction order.
    pub async fn load_tax_statements(
        &self,
        tax_year: i32,
    ) -> Result<Vec<TaxStatement>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT transaction_id, symbol, conid, description, asset_category,
                   open_close, trade_date, tax_year, side, quantity,
                   base_amount, currency, broker_realized, fifo_result,
                   fx_rate_to_base, action, comment
            FROM tax_statements
            WHERE tax_year = ?
            ORDER BY transaction_id ASC
            "#,
        )
        .bind(tax_year)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.iter().map(tax_statement_from_row).collect())
    }
}

fn tax_statement_from_row(row: &SqliteRow) -> TaxStatement {
    let asset_category: String = row.get("asset_category");
    let open_close: String = row.get("open_close");
    let trade_date: String = row.get("trade_date");
    let side: String = row.get("side");
    let quantity: String = row.get("quantity");
    let base_amount: String = row.get("base_amount");
    let broker_realized: Option<String> = row.get("broker_realized");
    let fifo_result: String = row.get("fifo_result");
    let fx_rate_to_base: String = row.get("fx_rate_to_base");

    TaxStatement {
        transaction_id: TransactionId::new(row.get("transaction_id")),
        symbol: row.get("symbol"),
        conid: Conid::new(row.get("conid")),
        description: row.get("description"),
        asset_category: AssetCategory::from(asset_category),
        open_close: OpenCloseFlag::from(open_close),
        trade_date: parse_date(&trade_date, "tax_statements.trade_date"),
        tax_year: row.get("tax_year"),
        side: parse_side(&side),
        quantity: parse_decimal(&quantity, "tax_statements.quantity"),
        base_amount: parse_decimal(&base_amount, "tax_statements.base_amount"),
        currency: row.get("currency"),
        broker_realized: parse_opt_decimal(broker_realized, "tax_statements.broker_realized"),
        fifo_result: parse_decimal(&fifo_result, "tax_statements.fifo_result"),
        fx_rate_to_base: parse_decimal(&fx_rate_to_base, "tax_statements.fx_rate_to_base"),
        action: row.get("action"),
        comment: row.get("comment"),
    }
}
