//! Mock price feed for testing without network calls.

use super::{PriceFeed, PriceFeedError};
use crate::domain::{Decimal, Symbol};
use async_trait::async_trait;
use std::collections::HashMap;

/// Mock price feed that returns predefined prices.
#[derive(Debug, Clone, Default)]
pub struct MockPriceFeed {
    prices: HashMap<Symbol, Decimal>,
}

impl MockPriceFeed {
    /// Create a new mock price feed with no prices.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a price for a symbol.
    pub fn with_price(mut self, symbol: Symbol, price: Decimal) -> Self {
        self.prices.insert(symbol, price);
        self
    }
}

#[async_trait]
impl PriceFeed for MockPriceFeed {
    async fn spot_price(&self, symbol: &Symbol) -> Result<Option<Decimal>, PriceFeedError> {
        Ok(self.prices.get(symbol).copied())
    }
}
