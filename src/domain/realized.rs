//! Realized-sale records produced by the cost-basis engine.

use crate::domain::{CostBasisMethod, Decimal, Symbol, TimeMs};
use serde::{Deserialize, Serialize};

/// A slice taken from an acquisition lot to cover part of a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumedLot {
    /// Quantity taken from the lot.
    pub quantity: Decimal,
    /// The lot's original unit price.
    pub unit_price: Decimal,
    /// When the lot was acquired.
    pub acquired_ms: TimeMs,
}

impl ConsumedLot {
    /// Cost contributed by this slice (quantity * lot price).
    pub fn cost(&self) -> Decimal {
        self.quantity * self.unit_price
    }
}

/// Realized gain/loss for a single sale under a given accounting method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealizedSale {
    /// Key of the originating sale transaction.
    pub sale_tx_key: String,
    /// Asset symbol.
    pub symbol: Symbol,
    /// Quantity sold.
    pub quantity_sold: Decimal,
    /// Sale price per unit.
    pub sale_price: Decimal,
    /// Cost basis consumed to cover the sale.
    pub cost_basis: Decimal,
    /// proceeds - cost basis.
    pub realized_gain: Decimal,
    /// Accounting method used.
    pub method: CostBasisMethod,
    /// Time of the sale.
    pub time_ms: TimeMs,
    /// Ordered consumed-lot detail for audit.
    pub consumed: Vec<ConsumedLot>,
}

impl RealizedSale {
    /// Gross proceeds of the sale.
    pub fn proceeds(&self) -> Decimal {
        self.quantity_sold * self.sale_price
    }
}
