//! Coordination layer tying the ledger store to the pure engines.

pub mod recalculator;

pub use recalculator::{RecalcError, RecalcSummary, Recalculator};
