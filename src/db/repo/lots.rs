//! Open-lot and closed-position repository operations.

use super::{parse_date, parse_decimal, parse_side, Repository};
use crate::domain::{AssetCategory, ClosedPosition, Conid, OpenLot, TransactionId};
use crate::engine::LotMutation;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

impl Repository {
    /// Load the full open-lot table, ordered by originating transaction id.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn load_open_lots(&self) -> Result<Vec<OpenLot>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT transaction_id, conid, symbol, description, quantity, amount,
                   asset_category, side, trade_date, days_to_expiration, combo
            FROM open_positions
            ORDER BY transaction_id ASC
            "#,
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows.iter().map(lot_from_row).collect())
    }

    /// The persisted open lot with the smallest originating transaction id
    /// for the instrument, or None.
    pub async fn find_earliest_open_lot(
        &self,
        conid: Conid,
    ) -> Result<Option<OpenLot>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT transaction_id, conid, symbol, description, quantity, amount,
                   asset_category, side, trade_date, days_to_expiration, combo
            FROM open_positions
            WHERE conid = ?
            ORDER BY transaction_id ASC
            LIMIT 1
            "#,
        )
        .bind(conid.as_i64())
        .fetch_optional(self.pool())
        .await?;

        Ok(row.as_ref().map(lot_from_row))
    }

    /// Number of persisted open lots for the instrument. Diagnostic only.
    pub async fn count_open_lots(&self, conid: Conid) -> Result<i64, sqlx::Error> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM open_positions WHERE conid = ?")
            .bind(conid.as_i64())
            .fetch_one(self.pool())
            .await?;
        Ok(row.get("count"))
    }

    /// Flush the run's ledger mutations atomically in a single transaction.
    ///
    /// # Errors
    /// Returns an error if any statement fails; nothing is committed then.
    pub async fn apply_lot_mutations(
        &self,
        mutations: &[LotMutation],
    ) -> Result<(), sqlx::Error> {
        if mutations.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool().begin().await?;

        for mutation in mutations {
            match mutation {
                LotMutation::Insert(lot) => {
                    sqlx::query(
                        r#"
                        INSERT OR REPLACE INTO open_positions (
                            transaction_id, conid, symbol, description, quantity, amount,
                            asset_category, side, trade_date, days_to_expiration, combo
                        )
                        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                        "#,
                    )
                    .bind(lot.transaction_id.as_i64())
                    .bind(lot.conid.as_i64())
                    .bind(&lot.symbol)
                    .bind(&lot.description)
                    .bind(lot.quantity.to_canonical_string())
                    .bind(lot.amount.to_canonical_string())
                    .bind(lot.asset_category.as_str())
                    .bind(lot.side.as_str())
                    .bind(lot.trade_date.to_string())
                    .bind(lot.days_to_expiration)
                    .bind(&lot.combo)
                    .execute(&mut *tx)
                    .await?;
                }
                LotMutation::Reduce {
                    transaction_id,
                    quantity,
                    amount,
                } => {
                    sqlx::query(
                        "UPDATE open_positions SET quantity = ?, amount = ? WHERE transaction_id = ?",
                    )
                    .bind(quantity.to_canonical_string())
                    .bind(amount.to_canonical_string())
                    .bind(transaction_id.as_i64())
                    .execute(&mut *tx)
                    .await?;
                }
                LotMutation::Delete { transaction_id } => {
                    sqlx::query("DELETE FROM open_positions WHERE transaction_id = ?")
                        .bind(transaction_id.as_i64())
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }

        tx.commit().await?;
        Ok(())
    }

    /// Insert a completed match.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn insert_closed_position(
        &self,
        position: &ClosedPosition,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO closed_positions (
                transaction_id, symbol, description, conid, asset_category,
                open_transaction_id, open_side, open_date, open_amount, open_quantity,
                days_to_expiration, close_date, days_in_trade, close_amount,
                close_quantity, close_side, realized, comment
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(position.transaction_id.as_i64())
        .bind(&position.symbol)
        .bind(&position.description)
        .bind(position.conid.as_i64())
        .bind(position.asset_category.as_str())
        .bind(position.open_transaction_id.as_i64())
        .bind(position.open_side.as_str())
        .bind(position.open_date.to_string())
        .bind(position.open_amount.to_canonical_string())
        .bind(position.open_quantity.to_canonical_string())
        .bind(position.days_to_expiration)
        .bind(position.close_date.to_string())
        .bind(position.days_in_trade)
        .bind(position.close_amount.to_canonical_string())
        .bind(position.close_quantity.to_canonical_string())
        .bind(position.close_side.as_str())
        .bind(position.realized.to_canonical_string())
        .bind(&position.comment)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Load all closed positions, oldest first (reporting and tests).
    pub async fn load_closed_positions(&self) -> Result<Vec<ClosedPosition>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT transaction_id, symbol, description, conid, asset_category,
                   open_transaction_id, open_side, open_date, open_amount, open_quantity,
                   days_to_expiration, close_date, days_in_trade, close_amount,
                   close_quantity, close_side, realized, comment
            FROM closed_positions
            ORDER BY id ASC
            "#,
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows.iter().map(closed_position_from_row).collect())
    }
}

fn lot_from_row(row: &SqliteRow) -> OpenLot {
    let quantity: String = row.get("quantity");
    let amount: String = row.get("amount");
    let asset_category: String = row.get("asset_category");
    let side: String = row.get("side");
    let trade_date: String = row.get("trade_date");

    OpenLot {
        conid: Conid::new(row.get("conid")),
        symbol: row.get("symbol"),
        description: row.get("description"),
        quantity: parse_decimal(&quantity, "open_positions.quantity"),
        amount: parse_decimal(&amount, "open_positions.amount"),
        transaction_id: TransactionId::new(row.get("transaction_id")),
        asset_category: AssetCategory::from(asset_category),
        side: parse_side(&side),
        trade_date: parse_date(&trade_date, "open_positions.trade_date"),
        days_to_expiration: row.get("days_to_expiration"),
        combo: row.get("combo"),
    }
}

fn closed_position_from_row(row: &SqliteRow) -> ClosedPosition {
    let asset_category: String = row.get("asset_category");
    let open_side: String = row.get("open_side");
    let open_date: String = row.get("open_date");
    let open_amount: String = row.get("open_amount");
    let open_quantity: String = row.get("open_quantity");
    let close_date: String = row.get("close_date");
    let close_amount: String = row.get("close_amount");
    let close_quantity: String = row.get("close_quantity");
    let close_side: String = row.get("close_side");
    let realized: String = row.get("realized");

    ClosedPosition {
        transaction_id: TransactionId::new(row.get("transaction_id")),
        symbol: row.get("symbol"),
        description: row.get("description"),
        conid: Conid::new(row.get("conid")),
        asset_category: AssetCategory::from(asset_category),
        open_transaction_id: TransactionId::new(row.get("open_transaction_id")),
        open_side: parse_side(&open_side),
        open_date: parse_date(&open_date, "closed_positions.open_date"),
        open_amount: parse_decimal(&open_amount, "closed_positions.open_amount"),
        open_quantity: parse_decimal(&open_quantity, "closed_positions.open_quantity"),
        days_to_expiration: row.get("days_to_expiration"),
        close_date: parse_date(&close_date, "closed_positions.close_date"),
        days_in_trade: row.get("days_in_trade"),
        close_amount: parse_decimal(&close_amount, "closed_positions.close_amount"),
        close_quantity: parse_decimal(&close_quantity, "closed_positions.close_quantity"),
        close_side: parse_side(&close_side),
        realized: parse_decimal(&realized, "closed_positions.realized"),
        comment: row.get("comment"),
    }
}
