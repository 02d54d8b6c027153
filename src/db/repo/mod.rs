//! Repository layer for database operations.
//!
//! Methods are organized across submodules by domain:
//! - `transactions.rs` - ledger log reads and writes
//! - `portfolio.rs` - positions and realized-sale records, including the
//!   atomic recalculation commit

mod portfolio;
mod transactions;

use crate::domain::{Decimal, Symbol, TimeMs};
use sqlx::sqlite::SqlitePool;
use std::str::FromStr;
use tracing::warn;

/// Query restrictions for reading the transaction log.
///
/// Synthetic rows are excluded unless explicitly requested, so a replay
/// over the returned set never double counts engine-generated credits.
#[derive(Debug, Clone, Default)]
pub struct TxQuery {
    pub symbol: Option<Symbol>,
    pub category: Option<String>,
    pub from_ms: Option<TimeMs>,
    pub to_ms: Option<TimeMs>,
    pub include_synthetic: bool,
}

/// Repository for database operations.
pub struct Repository {
    pub(crate) pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }
}

/// Parse a stored canonical decimal, warning and defaulting to zero on
/// corruption. SQLite SUM would silently degrade to REAL; decimals are
/// summed in Rust instead.
pub(crate) fn parse_stored_decimal(column: &str, key: &str, raw: &str) -> Decimal {
    Decimal::from_str(raw).unwrap_or_else(|e| {
        warn!(
            column = column,
            key = key,
            value = raw,
            error = %e,
            "Failed to parse stored decimal, using default"
        );
        Decimal::default()
    })
}
