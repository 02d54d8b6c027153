//! Position type: the current holding for one user and asset.

use crate::domain::{Decimal, Symbol};
use serde::{Deserialize, Serialize};

/// Current holding for one asset, derived by replaying the ledger.
///
/// Quantity is signed: it goes negative when recorded sells exceed
/// recorded acquisitions, which the design tolerates rather than rejects.
/// The weighted-average price is recomputed on every acquisition and left
/// unchanged on disposals, except when quantity crosses from positive to
/// negative (see the reconstructor's oversell heuristic).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Asset symbol (normalized uppercase).
    pub symbol: Symbol,
    /// Signed quantity held.
    pub quantity: Decimal,
    /// Weighted-average acquisition price per unit.
    pub avg_price: Decimal,
    /// Category tag carried through from the originating transaction.
    pub category: Option<String>,
}

impl Position {
    /// Create a position with no category tag.
    pub fn new(symbol: Symbol, quantity: Decimal, avg_price: Decimal) -> Self {
        Position {
            symbol,
            quantity,
            avg_price,
            category: None,
        }
    }

    /// Acquisition cost of the current holding (quantity * avg price).
    ///
    /// Zero for non-positive holdings.
    pub fn cost_basis(&self) -> Decimal {
        if self.quantity.is_positive() {
            self.quantity * self.avg_price
        } else {
            Decimal::zero()
        }
    }
}
