//! Acquisition lots and the lot book consumed by the cost-basis engine.
//!
//! A `LotBook` is a per-symbol, per-computation structure: it is built
//! fresh for every `compute_realized` call and discarded at the end, so
//! no computation ever observes another's partial mutation.

use crate::domain::{ConsumedLot, CostBasisMethod, Decimal, TimeMs};

/// A discrete acquisition tracked until fully consumed by disposals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lot {
    /// Quantity remaining in the lot.
    pub quantity: Decimal,
    /// Acquisition price per unit (0 for airdrop/farming lots).
    pub unit_price: Decimal,
    /// When the lot was acquired.
    pub acquired_ms: TimeMs,
}

/// Result of consuming lots to cover one sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consumption {
    /// Total cost basis of the consumed slices.
    pub cost_basis: Decimal,
    /// Ordered consumed-lot detail for audit.
    pub consumed: Vec<ConsumedLot>,
}

/// Ordered collection of acquisition lots for one symbol.
///
/// All three accounting methods run over the same book: FIFO and LIFO
/// walk the lot sequence (oldest-first or newest-first) mutating
/// remainders in place, while Average draws on the pooled running totals
/// and scales the remaining cost proportionally.
#[derive(Debug, Clone, Default)]
pub struct LotBook {
    lots: Vec<Lot>,
    total_quantity: Decimal,
    total_cost: Decimal,
}

impl LotBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an acquisition lot in replay order.
    pub fn push(&mut self, lot: Lot) {
        self.total_quantity += lot.quantity;
        self.total_cost += lot.quantity * lot.unit_price;
        self.lots.push(lot);
    }

    /// Total quantity still held across all lots.
    pub fn remaining_quantity(&self) -> Decimal {
        self.total_quantity
    }

    /// Consume `quantity` units under the given method.
    ///
    /// Returns `None` when the book holds less than the requested
    /// quantity; the caller decides how to report the inconsistency.
    pub fn consume(&mut self, quantity: Decimal, method: CostBasisMethod) -> Option<Consumption> {
        if !quantity.is_positive() || self.total_quantity < quantity {
            return None;
        }
        match method {
            CostBasisMethod::Fifo => Some(self.consume_ordered(quantity, false)),
            CostBasisMethod::Lifo => Some(self.consume_ordered(quantity, true)),
            CostBasisMethod::Average => Some(self.consume_average(quantity)),
        }
    }

    /// Walk the lot sequence in order (or reverse for LIFO), shrinking
    /// partially consumed lots in place so remainders keep their original
    /// price and date.
    fn consume_ordered(&mut self, quantity: Decimal, newest_first: bool) -> Consumption {
        let mut remaining = quantity;
        let mut cost_basis = Decimal::zero();
        let mut consumed = Vec::new();

        let indices: Vec<usize> = if newest_first {
            (0..self.lots.len()).rev().collect()
        } else {
            (0..self.lots.len()).collect()
        };

        for i in indices {
            if remaining.is_zero() {
                break;
            }
            let lot = &mut self.lots[i];
            if !lot.quantity.is_positive() {
                continue;
            }
            let take = lot.quantity.min(remaining);
            lot.quantity -= take;
            remaining -= take;
            cost_basis += take * lot.unit_price;
            consumed.push(ConsumedLot {
                quantity: take,
                unit_price: lot.unit_price,
                acquired_ms: lot.acquired_ms,
            });
        }

        self.total_quantity -= quantity;
        self.total_cost -= cost_basis;

        Consumption {
            cost_basis,
            consumed,
        }
    }

    /// Draw on the pooled running average: cost basis is quantity times
    /// the current average, and the remaining cost is scaled down by the
    /// same fraction removed rather than lot by lot.
    fn consume_average(&mut self, quantity: Decimal) -> Consumption {
        let avg = if self.total_quantity.is_zero() {
            Decimal::zero()
        } else {
            self.total_cost / self.total_quantity
        };
        let cost_basis = quantity * avg;

        let acquired_ms = self
            .lots
            .iter()
            .find(|lot| lot.quantity.is_positive())
            .map(|lot| lot.acquired_ms)
            .unwrap_or_default();

        self.total_quantity -= quantity;
        self.total_cost -= cost_basis;

        Consumption {
            cost_basis,
            consumed: vec![ConsumedLot {
                quantity,
                unit_price: avg,
                acquired_ms,
            }],
        }
    }
}
