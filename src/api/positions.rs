use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{parse_user, AppState};
use crate::domain::Position;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionsQuery {
    pub user: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionsResponse {
    pub positions: Vec<PositionDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionDto {
    pub symbol: String,
    pub quantity: String,
    pub avg_price: String,
    pub cost_basis: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl PositionDto {
    pub(crate) fn from_domain(position: &Position) -> Self {
        PositionDto {
            symbol: position.symbol.as_str().to_string(),
            quantity: position.quantity.to_canonical_string(),
            avg_price: position.avg_price.to_canonical_string(),
            cost_basis: position.cost_basis().to_canonical_string(),
            category: position.category.clone(),
        }
    }
}

pub async fn get_positions(
    Query(params): Query<PositionsQuery>,
    State(state): State<AppState>,
) -> Result<Json<PositionsResponse>, AppError> {
    let user = parse_user(&params.user)?;

    let positions = state.repo.query_positions(&user).await?;

    Ok(Json(PositionsResponse {
        positions: positions.iter().map(PositionDto::from_domain).collect(),
    }))
}
