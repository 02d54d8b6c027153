//! Position and realized-sale storage, including the atomic
//! recalculation commit.

use crate::domain::{
    CostBasisMethod, Position, RealizedSale, Symbol, TimeMs, Transaction, UserId,
};
use sqlx::Row;
use std::str::FromStr;

use super::{parse_stored_decimal, Repository};

impl Repository {
    /// Query the stored position set for a user, ordered by symbol.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn query_positions(&self, user: &UserId) -> Result<Vec<Position>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT symbol, quantity, avg_price, category
            FROM positions
            WHERE user = ?
            ORDER BY symbol ASC
            "#,
        )
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let symbol: String = row.get("symbol");
                Position {
                    quantity: parse_stored_decimal(
                        "quantity",
                        &symbol,
                        &row.get::<String, _>("quantity"),
                    ),
                    avg_price: parse_stored_decimal(
                        "avg_price",
                        &symbol,
                        &row.get::<String, _>("avg_price"),
                    ),
                    category: row.get::<Option<String>, _>("category"),
                    symbol: Symbol::new(&symbol),
                }
            })
            .collect())
    }

    /// Query stored realized-sale records for a user and method.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn query_realized_sales(
        &self,
        user: &UserId,
        method: CostBasisMethod,
        symbol: Option<&Symbol>,
    ) -> Result<Vec<RealizedSale>, sqlx::Error> {
        let (sql, binds_symbol) = if symbol.is_some() {
            (
                r#"
                SELECT sale_tx_key, symbol, quantity_sold, sale_price, cost_basis,
                       realized_gain, method, time_ms
                FROM realized_sales
                WHERE user = ? AND method = ? AND symbol = ?
                ORDER BY time_ms ASC, id ASC
                "#,
                true,
            )
        } else {
            (
                r#"
                SELECT sale_tx_key, symbol, quantity_sold, sale_price, cost_basis,
                       realized_gain, method, time_ms
                FROM realized_sales
                WHERE user = ? AND method = ?
                ORDER BY time_ms ASC, id ASC
                "#,
                false,
            )
        };

        let mut query = sqlx::query(sql)
            .bind(user.as_str())
            .bind(method.to_string());
        if binds_symbol {
            query = query.bind(symbol.expect("binds_symbol implies symbol is Some").as_str());
        }

        let rows = query.fetch_all(&self.pool).await?;

        Ok(rows
            .iter()
            .map(|row| {
                let sale_tx_key: String = row.get("sale_tx_key");
                let method = CostBasisMethod::from_str(&row.get::<String, _>("method"))
                    .unwrap_or_default();
                RealizedSale {
                    symbol: Symbol::new(&row.get::<String, _>("symbol")),
                    quantity_sold: parse_stored_decimal(
                        "quantity_sold",
                        &sale_tx_key,
                        &row.get::<String, _>("quantity_sold"),
                    ),
                    sale_price: parse_stored_decimal(
                        "sale_price",
                        &sale_tx_key,
                        &row.get::<String, _>("sale_price"),
                    ),
                    cost_basis: parse_stored_decimal(
                        "cost_basis",
                        &sale_tx_key,
                        &row.get::<String, _>("cost_basis"),
                    ),
                    realized_gain: parse_stored_decimal(
                        "realized_gain",
                        &sale_tx_key,
                        &row.get::<String, _>("realized_gain"),
                    ),
                    method,
                    time_ms: TimeMs::new(row.get::<i64, _>("time_ms")),
                    // Consumed-lot detail is recomputed on demand, not stored.
                    consumed: Vec::new(),
                    sale_tx_key,
                }
            })
            .collect())
    }

    /// Commit one recalculation atomically: the replaced position set,
    /// newly emitted synthetic transactions, and the replaced realized
    /// records for the method all land together, or none do.
    ///
    /// # Errors
    /// Returns an error if any statement fails; the transaction is
    /// rolled back.
    pub async fn commit_recalculation(
        &self,
        user: &UserId,
        positions: &[Position],
        synthetic: &[Transaction],
        method: CostBasisMethod,
        realized: &[RealizedSale],
    ) -> Result<(), sqlx::Error> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let mut tx = self.pool.begin().await?;

        // Positions are a full-replacement set, never patched in place.
        sqlx::query("DELETE FROM positions WHERE user = ?")
            .bind(user.as_str())
            .execute(&mut *tx)
            .await?;

        for position in positions {
            sqlx::query(
                r#"
                INSERT INTO positions (user, symbol, quantity, avg_price, category, updated_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(user.as_str())
            .bind(position.symbol.as_str())
            .bind(position.quantity.to_canonical_string())
            .bind(position.avg_price.to_canonical_string())
            .bind(position.category.as_deref())
            .bind(now_ms)
            .execute(&mut *tx)
            .await?;
        }

        for credit in synthetic {
            sqlx::query(
                r#"
                INSERT INTO transactions
                (tx_key, user, symbol, kind, quantity, unit_price, total_amount, time_ms,
                 payment_method, payment_currency, synthetic, category, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(tx_key) DO NOTHING
                "#,
            )
            .bind(&credit.tx_key)
            .bind(credit.user.as_str())
            .bind(credit.symbol.as_str())
            .bind(credit.kind.to_string())
            .bind(credit.quantity.to_canonical_string())
            .bind(credit.unit_price.to_canonical_string())
            .bind(credit.total_amount.to_canonical_string())
            .bind(credit.time_ms.as_ms())
            .bind(credit.payment_method.as_deref())
            .bind(credit.payment_currency.as_ref().map(|s| s.as_str()))
            .bind(1)
            .bind(credit.category.as_deref())
            .bind(now_ms)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM realized_sales WHERE user = ? AND method = ?")
            .bind(user.as_str())
            .bind(method.to_string())
            .execute(&mut *tx)
            .await?;

        for sale in realized {
            sqlx::query(
                r#"
                INSERT INTO realized_sales
                (sale_tx_key, user, symbol, quantity_sold, sale_price, cost_basis,
                 realized_gain, method, time_ms, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&sale.sale_tx_key)
            .bind(user.as_str())
            .bind(sale.symbol.as_str())
            .bind(sale.quantity_sold.to_canonical_string())
            .bind(sale.sale_price.to_canonical_string())
            .bind(sale.cost_basis.to_canonical_string())
            .bind(sale.realized_gain.to_canonical_string())
            .bind(method.to_string())
            .bind(sale.time_ms.as_ms())
            .bind(now_ms)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
