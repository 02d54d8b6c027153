//! Ledger log reads and writes.

use crate::domain::{Symbol, TimeMs, Transaction, TxKind, UserId};
use sqlx::Row;
use std::str::FromStr;
use tracing::warn;

use super::{parse_stored_decimal, Repository, TxQuery};

impl Repository {
    /// Insert a transaction into the log idempotently.
    ///
    /// Returns false if a row with the same `tx_key` already exists.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn insert_transaction(&self, tx: &Transaction) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO transactions
            (tx_key, user, symbol, kind, quantity, unit_price, total_amount, time_ms,
             payment_method, payment_currency, synthetic, category, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(tx_key) DO NOTHING
            "#,
        )
        .bind(&tx.tx_key)
        .bind(tx.user.as_str())
        .bind(tx.symbol.as_str())
        .bind(tx.kind.to_string())
        .bind(tx.quantity.to_canonical_string())
        .bind(tx.unit_price.to_canonical_string())
        .bind(tx.total_amount.to_canonical_string())
        .bind(tx.time_ms.as_ms())
        .bind(tx.payment_method.as_deref())
        .bind(tx.payment_currency.as_ref().map(|s| s.as_str()))
        .bind(tx.synthetic as i32)
        .bind(tx.category.as_deref())
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a transaction by key, scoped to its owner.
    ///
    /// Returns true if a row was removed.
    pub async fn delete_transaction(
        &self,
        user: &UserId,
        tx_key: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM transactions WHERE user = ? AND tx_key = ?")
            .bind(user.as_str())
            .bind(tx_key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Query a user's transactions ordered for replay (time, then rowid,
    /// preserving insertion order for identical timestamps).
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn query_transactions(
        &self,
        user: &UserId,
        query: &TxQuery,
    ) -> Result<Vec<Transaction>, sqlx::Error> {
        let mut sql = String::from(
            r#"
            SELECT tx_key, user, symbol, kind, quantity, unit_price, total_amount, time_ms,
                   payment_method, payment_currency, synthetic, category
            FROM transactions
            WHERE user = ?
            "#,
        );
        if !query.include_synthetic {
            sql.push_str(" AND synthetic = 0");
        }
        if query.symbol.is_some() {
            sql.push_str(" AND symbol = ?");
        }
        if query.category.is_some() {
            sql.push_str(" AND category = ?");
        }
        if query.from_ms.is_some() {
            sql.push_str(" AND time_ms >= ?");
        }
        if query.to_ms.is_some() {
            sql.push_str(" AND time_ms <= ?");
        }
        sql.push_str(" ORDER BY time_ms ASC, rowid ASC");

        let mut q = sqlx::query(&sql).bind(user.as_str());
        if let Some(symbol) = &query.symbol {
            q = q.bind(symbol.as_str().to_string());
        }
        if let Some(category) = &query.category {
            q = q.bind(category.clone());
        }
        if let Some(from_ms) = query.from_ms {
            q = q.bind(from_ms.as_ms());
        }
        if let Some(to_ms) = query.to_ms {
            q = q.bind(to_ms.as_ms());
        }

        let rows = q.fetch_all(&self.pool).await?;

        Ok(rows
            .iter()
            .filter_map(|row| {
                let tx_key: String = row.get("tx_key");
                let kind_str: String = row.get("kind");
                let kind = match TxKind::from_str(&kind_str) {
                    Ok(kind) => kind,
                    Err(e) => {
                        warn!(tx_key = %tx_key, error = %e, "Skipping transaction with unknown kind");
                        return None;
                    }
                };

                Some(Transaction {
                    quantity: parse_stored_decimal(
                        "quantity",
                        &tx_key,
                        &row.get::<String, _>("quantity"),
                    ),
                    unit_price: parse_stored_decimal(
                        "unit_price",
                        &tx_key,
                        &row.get::<String, _>("unit_price"),
                    ),
                    total_amount: parse_stored_decimal(
                        "total_amount",
                        &tx_key,
                        &row.get::<String, _>("total_amount"),
                    ),
                    time_ms: TimeMs::new(row.get::<i64, _>("time_ms")),
                    user: UserId::new(row.get::<String, _>("user")),
                    symbol: Symbol::new(&row.get::<String, _>("symbol")),
                    kind,
                    payment_method: row.get::<Option<String>, _>("payment_method"),
                    payment_currency: row
                        .get::<Option<String>, _>("payment_currency")
                        .map(|s| Symbol::new(&s)),
                    synthetic: row.get::<i32, _>("synthetic") != 0,
                    category: row.get::<Option<String>, _>("category"),
                    tx_key,
                })
            })
            .collect())
    }

    /// Count a user's transactions, including synthetic rows.
    pub async fn count_transactions(&self, user: &UserId) -> Result<i64, sqlx::Error> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM transactions WHERE user = ?")
            .bind(user.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>("n"))
    }
}
