use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{parse_user, AppState};
use crate::db::TxQuery;
use crate::domain::{
    sort_transactions_deterministic, CostBasisMethod, RealizedSale, Symbol, TimeMs, Transaction,
};
use crate::engine::{compute_realized, reconstruct, Filters, SymbolRealized};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealizedQuery {
    pub user: String,
    pub method: Option<String>,
    pub symbol: Option<String>,
    pub category: Option<String>,
    pub from_ms: Option<i64>,
    pub to_ms: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealizedResponse {
    pub method: String,
    pub total_realized: String,
    pub skipped_sales: u32,
    pub symbols: Vec<SymbolRealizedDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolRealizedDto {
    pub symbol: String,
    pub acquired_quantity: String,
    pub sold_quantity: String,
    pub remaining_quantity: String,
    pub realized_gain: String,
    pub skipped_sales: u32,
    pub sales: Vec<RealizedSaleDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealizedSaleDto {
    pub sale_tx_key: String,
    pub time_ms: i64,
    pub quantity_sold: String,
    pub sale_price: String,
    pub cost_basis: String,
    pub realized_gain: String,
    pub consumed: Vec<ConsumedLotDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumedLotDto {
    pub quantity: String,
    pub unit_price: String,
    pub acquired_ms: i64,
}

impl SymbolRealizedDto {
    fn from_domain(summary: &SymbolRealized) -> Self {
        SymbolRealizedDto {
            symbol: summary.symbol.as_str().to_string(),
            acquired_quantity: summary.acquired_quantity.to_canonical_string(),
            sold_quantity: summary.sold_quantity.to_canonical_string(),
            remaining_quantity: summary.remaining_quantity.to_canonical_string(),
            realized_gain: summary.realized_gain.to_canonical_string(),
            skipped_sales: summary.skipped_sales,
            sales: summary.sales.iter().map(RealizedSaleDto::from_domain).collect(),
        }
    }
}

impl RealizedSaleDto {
    fn from_domain(sale: &RealizedSale) -> Self {
        RealizedSaleDto {
            sale_tx_key: sale.sale_tx_key.clone(),
            time_ms: sale.time_ms.as_ms(),
            quantity_sold: sale.quantity_sold.to_canonical_string(),
            sale_price: sale.sale_price.to_canonical_string(),
            cost_basis: sale.cost_basis.to_canonical_string(),
            realized_gain: sale.realized_gain.to_canonical_string(),
            consumed: sale
                .consumed
                .iter()
                .map(|lot| ConsumedLotDto {
                    quantity: lot.quantity.to_canonical_string(),
                    unit_price: lot.unit_price.to_canonical_string(),
                    acquired_ms: lot.acquired_ms.as_ms(),
                })
                .collect(),
        }
    }
}

/// Recomputes realized gains from the log so the response carries full
/// consumed-lot detail and honors ad-hoc filters, unlike the persisted
/// records which exist for the default view.
pub async fn get_realized(
    Query(params): Query<RealizedQuery>,
    State(state): State<AppState>,
) -> Result<Json<RealizedResponse>, AppError> {
    let user = parse_user(&params.user)?;

    let method = match params.method.as_deref() {
        Some(raw) => CostBasisMethod::from_str(raw)?,
        None => state.recalculator.default_method(),
    };

    let from_ms = params.from_ms.map(TimeMs::new);
    let to_ms = params.to_ms.map(TimeMs::new);
    if let (Some(from), Some(to)) = (from_ms, to_ms) {
        if from > to {
            return Err(AppError::BadRequest("fromMs must be <= toMs".to_string()));
        }
    }

    let filters = Filters {
        symbol: params
            .symbol
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Symbol::new),
        category: params.category.clone(),
        from_ms,
        to_ms,
    };

    let organic = state.repo.query_transactions(&user, &TxQuery::default()).await?;
    let outcome =
        reconstruct(&organic, state.recalculator.stablecoins()).map_err(|e| {
            AppError::Internal(e.to_string())
        })?;

    let mut full: Vec<Transaction> = organic;
    full.extend(outcome.synthetic);
    sort_transactions_deterministic(&mut full);

    let report = compute_realized(&full, method, &filters)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(RealizedResponse {
        method: report.method.to_string(),
        total_realized: report.total_realized.to_canonical_string(),
        skipped_sales: report.skipped_sales,
        symbols: report
            .symbols
            .iter()
            .map(SymbolRealizedDto::from_domain)
            .collect(),
    }))
}
