pub mod health;
pub mod portfolio;
pub mod positions;
pub mod realized;
pub mod transactions;

use crate::config::Config;
use crate::db::Repository;
use crate::orchestration::Recalculator;
use crate::pricefeed::PriceFeed;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::domain::UserId;
use crate::error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Config,
    pub recalculator: Arc<Recalculator>,
    pub price_feed: Arc<dyn PriceFeed>,
}

impl AppState {
    pub fn new(
        repo: Arc<Repository>,
        config: Config,
        recalculator: Arc<Recalculator>,
        price_feed: Arc<dyn PriceFeed>,
    ) -> Self {
        Self {
            repo,
            config,
            recalculator,
            price_feed,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route(
            "/v1/transactions",
            get(transactions::get_transactions).post(transactions::post_transaction),
        )
        .route(
            "/v1/transactions/:tx_key",
            axum::routing::delete(transactions::delete_transaction),
        )
        .route("/v1/positions", get(positions::get_positions))
        .route("/v1/portfolio", get(portfolio::get_portfolio))
        .route("/v1/realized", get(realized::get_realized))
        .route("/v1/recalculate", post(transactions::post_recalculate))
        .layer(cors)
        .with_state(state)
}

pub(crate) fn parse_user(input: &str) -> Result<UserId, AppError> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.len() > 128 {
        return Err(AppError::BadRequest("Invalid user id".to_string()));
    }
    Ok(UserId::new(trimmed.to_string()))
}
