use axum::extract::{Query, State};
use axum::Json;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{parse_user, AppState};
use crate::domain::Decimal;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioQuery {
    pub user: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioResponse {
    pub holdings: Vec<HoldingDto>,
    /// Sum of cost bases over all long holdings.
    pub total_cost_basis: String,
    /// Sum of market values over priced holdings only.
    pub total_market_value: String,
    pub total_unrealized_gain: String,
    /// Symbols the price feed could not value.
    pub unpriced_symbols: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingDto {
    pub symbol: String,
    pub quantity: String,
    pub avg_price: String,
    pub cost_basis: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unrealized_gain: Option<String>,
}

pub async fn get_portfolio(
    Query(params): Query<PortfolioQuery>,
    State(state): State<AppState>,
) -> Result<Json<PortfolioResponse>, AppError> {
    let user = parse_user(&params.user)?;

    let positions = state.repo.query_positions(&user).await?;

    let prices = join_all(
        positions
            .iter()
            .map(|p| state.price_feed.spot_price(&p.symbol)),
    )
    .await;

    let mut holdings = Vec::with_capacity(positions.len());
    let mut total_cost_basis = Decimal::zero();
    let mut total_market_value = Decimal::zero();
    let mut total_unrealized = Decimal::zero();
    let mut unpriced = Vec::new();

    for (position, price) in positions.iter().zip(prices) {
        let cost_basis = position.cost_basis();
        total_cost_basis += cost_basis;

        // A feed failure degrades that symbol to unpriced rather than
        // failing the whole portfolio.
        let price = match price {
            Ok(price) => price,
            Err(e) => {
                warn!(symbol = position.symbol.as_str(), error = %e, "Price lookup failed");
                None
            }
        };

        let (market_price, market_value, unrealized_gain) = match price {
            Some(price) => {
                let value = position.quantity * price;
                let gain = value - cost_basis;
                total_market_value += value;
                total_unrealized += gain;
                (
                    Some(price.to_canonical_string()),
                    Some(value.to_canonical_string()),
                    Some(gain.to_canonical_string()),
                )
            }
            None => {
                unpriced.push(position.symbol.as_str().to_string());
                (None, None, None)
            }
        };

        holdings.push(HoldingDto {
            symbol: position.symbol.as_str().to_string(),
            quantity: position.quantity.to_canonical_string(),
            avg_price: position.avg_price.to_canonical_string(),
            cost_basis: cost_basis.to_canonical_string(),
            market_price,
            market_value,
            unrealized_gain,
        });
    }

    Ok(Json(PortfolioResponse {
        holdings,
        total_cost_basis: total_cost_basis.to_canonical_string(),
        total_market_value: total_market_value.to_canonical_string(),
        total_unrealized_gain: total_unrealized.to_canonical_string(),
        unpriced_symbols: unpriced,
    }))
}
