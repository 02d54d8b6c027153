//! Pure computation engines for deterministic ledger replay.
//!
//! Two independent read-models over the same transaction log:
//! - [`reconstructor`]: replays the full history into current positions
//! - [`costbasis`]: consumes acquisition lots to realize gains on sales
//!
//! Both are pure functions of their input; persistence is the caller's
//! concern (see `orchestration`).

use crate::domain::Symbol;
use std::collections::HashSet;

pub mod costbasis;
pub mod lots;
pub mod reconstructor;

pub use costbasis::{compute_realized, Filters, RealizedError, RealizedReport, SymbolRealized};
pub use lots::{Consumption, Lot, LotBook};
pub use reconstructor::{reconstruct, ReplayError, ReplayOutcome};

/// Recognized stablecoin symbols, pegged 1:1 to the reference fiat unit.
///
/// A sale whose payment currency is on this list triggers a synthetic
/// buy of that stablecoin for the proceeds.
#[derive(Debug, Clone, Default)]
pub struct StablecoinSet(HashSet<Symbol>);

impl StablecoinSet {
    /// Build a set from symbol strings (normalized uppercase).
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        StablecoinSet(symbols.into_iter().map(|s| Symbol::new(s.as_ref())).collect())
    }

    /// True if the symbol is a recognized stablecoin.
    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.0.contains(symbol)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
