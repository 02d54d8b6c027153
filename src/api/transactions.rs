use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{parse_user, AppState};
use crate::db::TxQuery;
use crate::domain::{CostBasisMethod, Decimal, Symbol, TimeMs, Transaction, TxKind};
use crate::error::AppError;
use crate::orchestration::RecalcSummary;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsQuery {
    pub user: String,
    pub symbol: Option<String>,
    pub category: Option<String>,
    pub from_ms: Option<i64>,
    pub to_ms: Option<i64>,
    pub include_synthetic: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsResponse {
    pub transactions: Vec<TransactionDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDto {
    pub tx_key: String,
    pub time_ms: i64,
    pub symbol: String,
    pub kind: String,
    pub quantity: String,
    pub unit_price: String,
    pub total_amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_currency: Option<String>,
    pub synthetic: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl TransactionDto {
    fn from_domain(tx: &Transaction) -> Self {
        TransactionDto {
            tx_key: tx.tx_key.clone(),
            time_ms: tx.time_ms.as_ms(),
            symbol: tx.symbol.as_str().to_string(),
            kind: tx.kind.to_string(),
            quantity: tx.quantity.to_canonical_string(),
            unit_price: tx.unit_price.to_canonical_string(),
            total_amount: tx.total_amount.to_canonical_string(),
            payment_method: tx.payment_method.clone(),
            payment_currency: tx.payment_currency.as_ref().map(|s| s.as_str().to_string()),
            synthetic: tx.synthetic,
            category: tx.category.clone(),
        }
    }
}

pub async fn get_transactions(
    Query(params): Query<TransactionsQuery>,
    State(state): State<AppState>,
) -> Result<Json<TransactionsResponse>, AppError> {
    let user = parse_user(&params.user)?;

    let from_ms = params.from_ms.map(TimeMs::new);
    let to_ms = params.to_ms.map(TimeMs::new);
    if let (Some(from), Some(to)) = (from_ms, to_ms) {
        if from > to {
            return Err(AppError::BadRequest("fromMs must be <= toMs".to_string()));
        }
    }

    let symbol = params
        .symbol
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Symbol::new);

    let query = TxQuery {
        symbol,
        category: params.category.clone(),
        from_ms,
        to_ms,
        include_synthetic: params.include_synthetic.unwrap_or(false),
    };

    let transactions = state.repo.query_transactions(&user, &query).await?;

    Ok(Json(TransactionsResponse {
        transactions: transactions.iter().map(TransactionDto::from_domain).collect(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransactionRequest {
    pub user: String,
    pub time_ms: i64,
    pub symbol: String,
    pub kind: String,
    pub quantity: String,
    pub unit_price: String,
    pub payment_method: Option<String>,
    pub payment_currency: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendResponse {
    pub tx_key: String,
    pub inserted: bool,
    pub recalculation: RecalcSummaryDto,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecalcSummaryDto {
    pub position_count: usize,
    pub synthetic_emitted: usize,
    pub realized_records: usize,
    pub skipped_sales: u32,
    pub method: String,
}

impl RecalcSummaryDto {
    fn from_summary(summary: &RecalcSummary) -> Self {
        RecalcSummaryDto {
            position_count: summary.positions.len(),
            synthetic_emitted: summary.synthetic_emitted,
            realized_records: summary.realized_records,
            skipped_sales: summary.skipped_sales,
            method: summary.method.to_string(),
        }
    }
}

pub async fn post_transaction(
    State(state): State<AppState>,
    Json(request): Json<NewTransactionRequest>,
) -> Result<Json<AppendResponse>, AppError> {
    let user = parse_user(&request.user)?;

    let symbol = request.symbol.trim();
    if symbol.is_empty() {
        return Err(AppError::BadRequest("Symbol must not be empty".to_string()));
    }

    let kind = TxKind::from_str(&request.kind)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let quantity = Decimal::from_str_canonical(&request.quantity)
        .map_err(|_| AppError::BadRequest("Invalid quantity".to_string()))?;
    let unit_price = Decimal::from_str_canonical(&request.unit_price)
        .map_err(|_| AppError::BadRequest("Invalid unitPrice".to_string()))?;

    let mut tx = Transaction::new(
        TimeMs::new(request.time_ms),
        user.clone(),
        Symbol::new(symbol),
        kind,
        quantity,
        unit_price,
        request.payment_method.clone(),
        request
            .payment_currency
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Symbol::new),
    );
    if let Some(category) = &request.category {
        tx = tx.with_category(category);
    }
    tx.validate()?;

    let (inserted, summary) = state.recalculator.append_and_recalculate(&user, &tx).await?;

    Ok(Json(AppendResponse {
        tx_key: tx.tx_key,
        inserted,
        recalculation: RecalcSummaryDto::from_summary(&summary),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteQuery {
    pub user: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub deleted: bool,
    pub recalculation: RecalcSummaryDto,
}

pub async fn delete_transaction(
    Path(tx_key): Path<String>,
    Query(params): Query<DeleteQuery>,
    State(state): State<AppState>,
) -> Result<Json<DeleteResponse>, AppError> {
    let user = parse_user(&params.user)?;

    let (deleted, summary) = state
        .recalculator
        .delete_and_recalculate(&user, &tx_key)
        .await?;
    if !deleted {
        return Err(AppError::NotFound(format!("Transaction {} not found", tx_key)));
    }

    Ok(Json(DeleteResponse {
        deleted,
        recalculation: RecalcSummaryDto::from_summary(&summary),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecalculateQuery {
    pub user: String,
    pub method: Option<String>,
}

pub async fn post_recalculate(
    Query(params): Query<RecalculateQuery>,
    State(state): State<AppState>,
) -> Result<Json<RecalcSummaryDto>, AppError> {
    let user = parse_user(&params.user)?;
    let method = params
        .method
        .as_deref()
        .map(CostBasisMethod::from_str)
        .transpose()?;

    let summary = state.recalculator.recalculate(&user, method).await?;
    Ok(Json(RecalcSummaryDto::from_summary(&summary)))
}
