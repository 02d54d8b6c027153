//! Domain types and determinism layer for the portfolio ledger.
//!
//! This module provides:
//! - Lossless numeric handling via the Decimal wrapper
//! - Domain primitives: TimeMs, UserId, Symbol, TxKind, CostBasisMethod
//! - Transaction, Position, and RealizedSale records
//! - Stable ordering helpers for deterministic replay

pub mod decimal;
pub mod ordering;
pub mod position;
pub mod primitives;
pub mod realized;
pub mod transaction;

pub use decimal::Decimal;
pub use ordering::{is_sorted_by_time, sort_transactions_deterministic, TxOrderingKey};
pub use position::Position;
pub use primitives::{
    CostBasisMethod, MethodParseError, Symbol, TimeMs, TxKind, TxKindParseError, UserId,
};
pub use realized::{ConsumedLot, RealizedSale};
pub use transaction::{Transaction, TransactionError};
