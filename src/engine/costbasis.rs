//! Realized P&L engine: consumes acquisition lots to realize gains.
//!
//! Independent of the position reconstructor; both are re-derived from
//! the log rather than cross-updated. All lot state is local to one
//! `compute_realized` call.

use crate::domain::{
    is_sorted_by_time, CostBasisMethod, Decimal, RealizedSale, Symbol, TimeMs, Transaction,
    TransactionError, TxKind,
};
use crate::engine::lots::{Lot, LotBook};
use std::collections::HashMap;
use thiserror::Error;
use tracing::warn;

/// Optional restrictions applied before partitioning into lots and sales.
///
/// Lots are built from the filtered set only: a date window that excludes
/// earlier buys also excludes their inventory.
#[derive(Debug, Clone, Default)]
pub struct Filters {
    pub symbol: Option<Symbol>,
    pub category: Option<String>,
    pub from_ms: Option<TimeMs>,
    pub to_ms: Option<TimeMs>,
}

impl Filters {
    fn matches(&self, tx: &Transaction) -> bool {
        if let Some(symbol) = &self.symbol {
            if &tx.symbol != symbol {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if tx.category.as_deref() != Some(category.as_str()) {
                return false;
            }
        }
        if let Some(from) = self.from_ms {
            if tx.time_ms < from {
                return false;
            }
        }
        if let Some(to) = self.to_ms {
            if tx.time_ms > to {
                return false;
            }
        }
        true
    }
}

/// Per-symbol realized summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolRealized {
    pub symbol: Symbol,
    /// Total quantity acquired in the filtered set.
    pub acquired_quantity: Decimal,
    /// Total quantity sold (excluding skipped sales).
    pub sold_quantity: Decimal,
    /// Quantity left in the lot book after all sales.
    pub remaining_quantity: Decimal,
    /// Sum of realized gains for this symbol.
    pub realized_gain: Decimal,
    /// Ordered realized-sale records with consumed-lot audit detail.
    pub sales: Vec<RealizedSale>,
    /// Sales skipped because cumulative acquisitions could not cover them.
    pub skipped_sales: u32,
}

/// Aggregate output of one realized-P&L computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealizedReport {
    pub method: CostBasisMethod,
    /// Sum of realized gains across all symbols.
    pub total_realized: Decimal,
    /// Per-symbol summaries in first-appearance order.
    pub symbols: Vec<SymbolRealized>,
    /// Total count of skipped sales, so callers can detect omissions.
    pub skipped_sales: u32,
}

impl RealizedReport {
    fn empty(method: CostBasisMethod) -> Self {
        RealizedReport {
            method,
            total_realized: Decimal::zero(),
            symbols: Vec::new(),
            skipped_sales: 0,
        }
    }
}

/// Validation failure for a realized-P&L input.
#[derive(Debug, Error)]
pub enum RealizedError {
    /// Input not sorted ascending by timestamp.
    #[error("transactions must be sorted ascending by timestamp")]
    UnsortedInput,
    /// Malformed transaction shape.
    #[error(transparent)]
    Invalid(#[from] TransactionError),
}

#[derive(Debug, Default)]
struct SymbolState {
    book: LotBook,
    acquired: Decimal,
    sold: Decimal,
    realized: Decimal,
    sales: Vec<RealizedSale>,
    skipped: u32,
}

/// Compute realized gain/loss per sale under the given method.
///
/// Acquisitions (buy, airdrop, farming) become lots in replay order;
/// each sale consumes lots per the method's ordering rule. A sale that
/// cumulative acquisitions cannot cover is skipped and counted, not
/// turned into a negative-lot error. An empty input is a valid zero
/// result.
pub fn compute_realized(
    transactions: &[Transaction],
    method: CostBasisMethod,
    filters: &Filters,
) -> Result<RealizedReport, RealizedError> {
    for tx in transactions {
        tx.validate()?;
    }
    if !is_sorted_by_time(transactions) {
        return Err(RealizedError::UnsortedInput);
    }
    if transactions.is_empty() {
        return Ok(RealizedReport::empty(method));
    }

    let mut states: HashMap<Symbol, SymbolState> = HashMap::new();
    let mut order: Vec<Symbol> = Vec::new();

    for tx in transactions.iter().filter(|tx| filters.matches(tx)) {
        if !states.contains_key(&tx.symbol) {
            order.push(tx.symbol.clone());
            states.insert(tx.symbol.clone(), SymbolState::default());
        }
        let state = states.get_mut(&tx.symbol).expect("inserted above");

        match tx.kind {
            TxKind::Buy | TxKind::Airdrop | TxKind::Farming => {
                let unit_price = if tx.kind.is_zero_cost() {
                    Decimal::zero()
                } else {
                    tx.unit_price
                };
                state.acquired += tx.quantity;
                state.book.push(Lot {
                    quantity: tx.quantity,
                    unit_price,
                    acquired_ms: tx.time_ms,
                });
            }
            TxKind::Sell => match state.book.consume(tx.quantity, method) {
                Some(consumption) => {
                    let proceeds = tx.quantity * tx.unit_price;
                    let realized_gain = proceeds - consumption.cost_basis;
                    state.sold += tx.quantity;
                    state.realized += realized_gain;
                    state.sales.push(RealizedSale {
                        sale_tx_key: tx.tx_key.clone(),
                        symbol: tx.symbol.clone(),
                        quantity_sold: tx.quantity,
                        sale_price: tx.unit_price,
                        cost_basis: consumption.cost_basis,
                        realized_gain,
                        method,
                        time_ms: tx.time_ms,
                        consumed: consumption.consumed,
                    });
                }
                None => {
                    // Untracked transfers-in are a known real-world gap;
                    // skipping beats fabricating a negative cost basis.
                    warn!(
                        symbol = %tx.symbol,
                        tx_key = %tx.tx_key,
                        quantity = %tx.quantity,
                        "sale exceeds cumulative acquisitions, skipping from realized output"
                    );
                    state.skipped += 1;
                }
            },
        }
    }

    let mut total_realized = Decimal::zero();
    let mut skipped_sales = 0u32;
    let symbols = order
        .into_iter()
        .map(|symbol| {
            let state = states.remove(&symbol).unwrap_or_default();
            total_realized += state.realized;
            skipped_sales += state.skipped;
            SymbolRealized {
                symbol,
                acquired_quantity: state.acquired,
                sold_quantity: state.sold,
                remaining_quantity: state.book.remaining_quantity(),
                realized_gain: state.realized,
                sales: state.sales,
                skipped_sales: state.skipped,
            }
        })
        .collect();

    Ok(RealizedReport {
        method,
        total_realized,
        symbols,
        skipped_sales,
    })
}
