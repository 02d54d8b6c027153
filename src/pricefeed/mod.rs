//! Market-price retrieval abstraction.
//!
//! The engines never touch this; only the portfolio-valuation endpoint
//! consumes resolved prices, keeping the core free of network coupling.

use crate::domain::{Decimal, Symbol};
use async_trait::async_trait;
use std::fmt;

pub mod http;
pub mod mock;

pub use http::HttpPriceFeed;
pub use mock::MockPriceFeed;

/// Price feed trait for resolving a spot price per asset symbol.
///
/// Implementations must handle retry/backoff and rate limiting.
#[async_trait]
pub trait PriceFeed: Send + Sync + fmt::Debug {
    /// Fetch the current spot price for a symbol.
    ///
    /// Returns `None` when the feed does not know the symbol; callers
    /// must not fabricate a price in that case.
    async fn spot_price(&self, symbol: &Symbol) -> Result<Option<Decimal>, PriceFeedError>;
}

/// Error type for price feed operations.
#[derive(Debug, Clone)]
pub enum PriceFeedError {
    /// Network error (e.g., connection timeout, DNS failure)
    NetworkError(String),
    /// HTTP error (e.g., 429 rate limit, 5xx server error)
    HttpError { status: u16, message: String },
    /// Parsing error (invalid JSON or malformed response)
    ParseError(String),
    /// Rate limit exceeded (caller should implement backoff)
    RateLimited,
}

impl fmt::Display for PriceFeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceFeedError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            PriceFeedError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            PriceFeedError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            PriceFeedError::RateLimited => write!(f, "Rate limited"),
        }
    }
}

impl std::error::Error for PriceFeedError {}
