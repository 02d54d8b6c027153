//! HTTP price feed client.

use super::{PriceFeed, PriceFeedError};
use crate::domain::{Decimal, Symbol};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Price feed backed by a simple JSON spot-price endpoint.
///
/// Expects `GET {base_url}/price/{SYMBOL}` to return
/// `{"symbol": "...", "price": "..."}` with the price as a string,
/// or 404 when the symbol is not listed.
#[derive(Debug, Clone)]
pub struct HttpPriceFeed {
    client: Client,
    base_url: String,
}

impl HttpPriceFeed {
    /// Create a new HTTP price feed against the given base URL.
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    async fn get_price_json(
        &self,
        symbol: &Symbol,
    ) -> Result<Option<serde_json::Value>, PriceFeedError> {
        let url = format!("{}/price/{}", self.base_url, symbol.as_str());
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        retry(backoff, || async {
            let response = self.client.get(&url).send().await.map_err(|e| {
                backoff::Error::transient(PriceFeedError::NetworkError(e.to_string()))
            })?;

            let status = response.status();
            if status == 404 {
                // Unknown symbol, not an error worth retrying.
                return Ok(None);
            }
            if status == 429 {
                return Err(backoff::Error::transient(PriceFeedError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(PriceFeedError::HttpError {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(PriceFeedError::HttpError {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<serde_json::Value>()
                .await
                .map(Some)
                .map_err(|e| backoff::Error::permanent(PriceFeedError::ParseError(e.to_string())))
        })
        .await
    }
}

#[async_trait]
impl PriceFeed for HttpPriceFeed {
    async fn spot_price(&self, symbol: &Symbol) -> Result<Option<Decimal>, PriceFeedError> {
        debug!("Fetching spot price for symbol={}", symbol.as_str());

        let Some(body) = self.get_price_json(symbol).await? else {
            return Ok(None);
        };

        parse_price(&body).map(Some)
    }
}

fn parse_price(body: &serde_json::Value) -> Result<Decimal, PriceFeedError> {
    let price_str = body
        .get("price")
        .and_then(|v| v.as_str())
        .ok_or_else(|| PriceFeedError::ParseError("Missing price field".to_string()))?;

    Decimal::from_str_canonical(price_str)
        .map_err(|e| PriceFeedError::ParseError(format!("Invalid price: {}", e)))
}
