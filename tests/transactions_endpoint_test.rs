use axum::http::StatusCode;
use cryptofolio::api::{self, AppState};
use cryptofolio::db::init_db;
use cryptofolio::domain::CostBasisMethod;
use cryptofolio::pricefeed::MockPriceFeed;
use cryptofolio::{Config, Recalculator, Repository, StablecoinSet};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

struct TestApp {
    app: axum::Router,
    state: AppState,
    _temp: TempDir,
}

fn test_config() -> Config {
    Config {
        port: 0,
        database_path: ":memory:".to_string(),
        price_api_url: None,
        stablecoins: vec![
            cryptofolio::Symbol::new("USDT"),
            cryptofolio::Symbol::new("USDC"),
        ],
        default_cost_method: CostBasisMethod::Fifo,
    }
}

async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");

    let repo = Arc::new(Repository::new(pool));
    let config = test_config();
    let stablecoins = StablecoinSet::new(config.stablecoins.iter().map(|s| s.as_str()));
    let recalculator = Arc::new(Recalculator::new(
        repo.clone(),
        stablecoins,
        config.default_cost_method,
    ));
    let state = AppState::new(
        repo,
        config,
        recalculator,
        Arc::new(MockPriceFeed::new()),
    );
    let app = api::create_router(state.clone());

    TestApp {
        app,
        state,
        _temp: temp_dir,
    }
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method("GET")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();

    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_json(
    app: axum::Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap();

    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn delete(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();

    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn buy_body(symbol: &str, qty: &str, px: &str, ms: i64) -> serde_json::Value {
    serde_json::json!({
        "user": "u1",
        "timeMs": ms,
        "symbol": symbol,
        "kind": "buy",
        "quantity": qty,
        "unitPrice": px,
    })
}

#[tokio::test]
async fn test_health_endpoints() {
    let test_app = setup_test_app().await;

    let (status, body) = get(test_app.app.clone(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = get(test_app.app.clone(), "/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_post_transaction_inserts_and_recalculates() {
    let test_app = setup_test_app().await;

    let (status, body) = post_json(
        test_app.app.clone(),
        "/v1/transactions",
        buy_body("btc", "2", "50000", 1000),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["inserted"], true);
    assert!(body["txKey"].as_str().unwrap().starts_with("tx:"));
    assert_eq!(body["recalculation"]["positionCount"], 1);

    let (status, body) = get(test_app.app.clone(), "/v1/positions?user=u1").await;
    assert_eq!(status, StatusCode::OK);
    // Symbol was normalized to uppercase on ingestion.
    assert_eq!(body["positions"][0]["symbol"], "BTC");
    assert_eq!(body["positions"][0]["quantity"], "2");
    assert_eq!(body["positions"][0]["avgPrice"], "50000");
}

#[tokio::test]
async fn test_post_duplicate_transaction_not_inserted_twice() {
    let test_app = setup_test_app().await;

    let body = buy_body("BTC", "1", "100", 1000);
    let (_, first) = post_json(test_app.app.clone(), "/v1/transactions", body.clone()).await;
    assert_eq!(first["inserted"], true);

    let (status, second) = post_json(test_app.app.clone(), "/v1/transactions", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["inserted"], false);
    assert_eq!(second["txKey"], first["txKey"]);
}

#[tokio::test]
async fn test_post_transaction_rejects_bad_shapes() {
    let test_app = setup_test_app().await;

    let mut bad_kind = buy_body("BTC", "1", "100", 1000);
    bad_kind["kind"] = serde_json::json!("stake");
    let (status, body) = post_json(test_app.app.clone(), "/v1/transactions", bad_kind).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("stake"));

    let zero_qty = buy_body("BTC", "0", "100", 1000);
    let (status, _) = post_json(test_app.app.clone(), "/v1/transactions", zero_qty).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let negative_price = buy_body("BTC", "1", "-5", 1000);
    let (status, _) = post_json(test_app.app.clone(), "/v1/transactions", negative_price).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_transactions_excludes_synthetic_by_default() {
    let test_app = setup_test_app().await;

    post_json(
        test_app.app.clone(),
        "/v1/transactions",
        buy_body("BTC", "1", "100", 1000),
    )
    .await;
    let mut sell = buy_body("BTC", "1", "150", 2000);
    sell["kind"] = serde_json::json!("sell");
    sell["paymentCurrency"] = serde_json::json!("USDT");
    post_json(test_app.app.clone(), "/v1/transactions", sell).await;

    let (status, body) = get(test_app.app.clone(), "/v1/transactions?user=u1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transactions"].as_array().unwrap().len(), 2);

    let (_, all) = get(
        test_app.app.clone(),
        "/v1/transactions?user=u1&includeSynthetic=true",
    )
    .await;
    let txs = all["transactions"].as_array().unwrap();
    assert_eq!(txs.len(), 3);
    assert!(txs.iter().any(|t| t["synthetic"] == true
        && t["symbol"] == "USDT"
        && t["quantity"] == "150"
        && t["unitPrice"] == "1"));
}

#[tokio::test]
async fn test_get_transactions_rejects_inverted_window() {
    let test_app = setup_test_app().await;

    let (status, body) = get(
        test_app.app.clone(),
        "/v1/transactions?user=u1&fromMs=2000&toMs=1000",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("fromMs"));
}

#[tokio::test]
async fn test_delete_transaction_recalculates_positions() {
    let test_app = setup_test_app().await;

    let (_, created) = post_json(
        test_app.app.clone(),
        "/v1/transactions",
        buy_body("BTC", "1", "100", 1000),
    )
    .await;
    let tx_key = created["txKey"].as_str().unwrap().to_string();

    let (status, body) = delete(
        test_app.app.clone(),
        &format!("/v1/transactions/{}?user=u1", tx_key),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], true);
    assert_eq!(body["recalculation"]["positionCount"], 0);

    let (_, positions) = get(test_app.app.clone(), "/v1/positions?user=u1").await;
    assert!(positions["positions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_unknown_transaction_is_404() {
    let test_app = setup_test_app().await;

    let (status, _) = delete(
        test_app.app.clone(),
        "/v1/transactions/tx:doesnotexist?user=u1",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_recalculate_endpoint_reports_summary() {
    let test_app = setup_test_app().await;

    test_app
        .state
        .repo
        .insert_transaction(&cryptofolio::Transaction::new(
            cryptofolio::TimeMs::new(1000),
            cryptofolio::UserId::new("u1".to_string()),
            cryptofolio::Symbol::new("BTC"),
            cryptofolio::TxKind::Sell,
            cryptofolio::Decimal::from_str_canonical("5").unwrap(),
            cryptofolio::Decimal::from_str_canonical("10").unwrap(),
            None,
            None,
        ))
        .await
        .unwrap();

    let (status, body) = post_json(
        test_app.app.clone(),
        "/v1/recalculate?user=u1&method=average",
        serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["method"], "average");
    assert_eq!(body["skippedSales"], 1);
    assert_eq!(body["positionCount"], 1);
}

#[tokio::test]
async fn test_recalculate_rejects_unknown_method() {
    let test_app = setup_test_app().await;

    let (status, body) = post_json(
        test_app.app.clone(),
        "/v1/recalculate?user=u1&method=twap",
        serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("twap"));
}
