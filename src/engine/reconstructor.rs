//! Position reconstructor: replays a transaction history into positions.
//!
//! The replay is order-dependent (the weighted-average price depends on
//! processing order), so the input must arrive sorted ascending by
//! timestamp; the reconstructor verifies and rejects rather than
//! re-sorting silently. It is a pure function: positions and any
//! synthetic transactions to append are explicit outputs, never writes.

use crate::domain::{
    is_sorted_by_time, Decimal, Position, Symbol, Transaction, TransactionError, TxKind,
};
use crate::engine::StablecoinSet;
use std::collections::HashMap;
use thiserror::Error;
use tracing::warn;

/// Output of one replay pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayOutcome {
    /// One position per distinct symbol encountered, in first-appearance
    /// order. Zero and negative quantities are reported, not hidden.
    pub positions: Vec<Position>,
    /// Synthetic stablecoin credits generated by sales during this
    /// replay. The caller persists these; they must be excluded from the
    /// input of any future replay.
    pub synthetic: Vec<Transaction>,
}

/// Validation failure for a replay input.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// A synthetic transaction was fed back into a replay.
    #[error("synthetic transaction {0} must not be replayed")]
    SyntheticInput(String),
    /// Input not sorted ascending by timestamp.
    #[error("transactions must be sorted ascending by timestamp")]
    UnsortedInput,
    /// Malformed transaction shape.
    #[error(transparent)]
    Invalid(#[from] TransactionError),
}

#[derive(Debug, Default)]
struct PositionState {
    quantity: Decimal,
    avg_price: Decimal,
    category: Option<String>,
}

/// Replay a user's full transaction list into current positions.
///
/// A sell whose payment currency is a recognized stablecoin emits a
/// synthetic buy of that stablecoin at unit price 1.0 for the proceeds,
/// applied within the same replay so stablecoin balances accumulate from
/// trading activity.
///
/// # Errors
/// Fails fast on synthetic input, unsorted input, or a malformed
/// transaction; there is no recovery path here by design.
pub fn reconstruct(
    transactions: &[Transaction],
    stablecoins: &StablecoinSet,
) -> Result<ReplayOutcome, ReplayError> {
    for tx in transactions {
        if tx.synthetic {
            return Err(ReplayError::SyntheticInput(tx.tx_key.clone()));
        }
        tx.validate()?;
    }
    if !is_sorted_by_time(transactions) {
        return Err(ReplayError::UnsortedInput);
    }

    let mut states: HashMap<Symbol, PositionState> = HashMap::new();
    let mut order: Vec<Symbol> = Vec::new();
    let mut synthetic: Vec<Transaction> = Vec::new();

    for tx in transactions {
        apply(&mut states, &mut order, tx);

        if tx.kind == TxKind::Sell {
            if let Some(credit) = stablecoin_credit(tx, stablecoins) {
                apply(&mut states, &mut order, &credit);
                synthetic.push(credit);
            }
        }
    }

    let positions = order
        .into_iter()
        .map(|symbol| {
            let state = states.remove(&symbol).unwrap_or_default();
            let avg_price = normalize_avg_price(&symbol, state.avg_price);
            Position {
                symbol,
                quantity: state.quantity,
                avg_price,
                category: state.category,
            }
        })
        .collect();

    Ok(ReplayOutcome {
        positions,
        synthetic,
    })
}

/// Build the synthetic stablecoin credit for a sale, if its proceeds are
/// denominated in a recognized stablecoin.
fn stablecoin_credit(sale: &Transaction, stablecoins: &StablecoinSet) -> Option<Transaction> {
    let currency = sale.payment_currency.as_ref()?;
    if !stablecoins.contains(currency) || !sale.total_amount.is_positive() {
        return None;
    }
    Some(Transaction::synthetic_stablecoin_credit(
        sale,
        currency.clone(),
        sale.total_amount,
    ))
}

fn apply(
    states: &mut HashMap<Symbol, PositionState>,
    order: &mut Vec<Symbol>,
    tx: &Transaction,
) {
    if !states.contains_key(&tx.symbol) {
        order.push(tx.symbol.clone());
        states.insert(tx.symbol.clone(), PositionState::default());
        let state = states.get_mut(&tx.symbol).expect("just inserted");
        match tx.kind {
            TxKind::Buy | TxKind::Airdrop | TxKind::Farming => {
                state.quantity = tx.quantity;
                state.avg_price = acquisition_price(tx);
            }
            // A sell with no prior position creates a negative holding at
            // the sale's own price.
            TxKind::Sell => {
                state.quantity = -tx.quantity;
                state.avg_price = tx.unit_price;
            }
        }
        state.category = tx.category.clone();
        return;
    }

    let state = states.get_mut(&tx.symbol).expect("checked above");
    match tx.kind {
        TxKind::Buy | TxKind::Airdrop | TxKind::Farming => {
            let price = acquisition_price(tx);
            let new_quantity = state.quantity + tx.quantity;
            // Quantity-weighted blend; zero-cost acquisitions dilute the
            // average toward zero.
            state.avg_price = if new_quantity.is_zero() {
                Decimal::zero()
            } else {
                (state.quantity * state.avg_price + tx.quantity * price) / new_quantity
            };
            state.quantity = new_quantity;
        }
        TxKind::Sell => {
            let pre = state.quantity;
            state.quantity -= tx.quantity;
            // Oversell heuristic: crossing from positive to negative
            // resets the average to the sale's own price. Documented
            // behavior, not a correctness guarantee.
            if pre.is_positive() && state.quantity.is_negative() {
                warn!(
                    symbol = %tx.symbol,
                    tx_key = %tx.tx_key,
                    "oversell crossed position negative, resetting average price to sale price"
                );
                state.avg_price = tx.unit_price;
            }
        }
    }
    if state.category.is_none() {
        state.category = tx.category.clone();
    }
}

fn acquisition_price(tx: &Transaction) -> Decimal {
    if tx.kind.is_zero_cost() {
        Decimal::zero()
    } else {
        tx.unit_price
    }
}

/// Clamp degenerate average prices to zero.
///
/// Adversarial replay sequences (strings of oversells against a negative
/// holding) can leave a negative average behind; a safe default beats
/// propagating it.
fn normalize_avg_price(symbol: &Symbol, avg_price: Decimal) -> Decimal {
    if avg_price.is_negative() {
        warn!(symbol = %symbol, avg_price = %avg_price, "clamping degenerate average price to 0");
        Decimal::zero()
    } else {
        avg_price
    }
}
