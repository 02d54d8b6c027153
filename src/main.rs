use cryptofolio::pricefeed::{HttpPriceFeed, MockPriceFeed};
use cryptofolio::{
    api, config::Config, db::init_db, PriceFeed, Recalculator, Repository, StablecoinSet,
};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let port = config.port;

    // Initialize database and dependencies
    let pool = match init_db(&config.database_path).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let repo = Arc::new(Repository::new(pool));
    let stablecoins = StablecoinSet::new(config.stablecoins.iter().map(|s| s.as_str()));
    let recalculator = Arc::new(Recalculator::new(
        repo.clone(),
        stablecoins,
        config.default_cost_method,
    ));
    let price_feed: Arc<dyn PriceFeed> = match &config.price_api_url {
        Some(url) => Arc::new(HttpPriceFeed::new(url.clone())),
        // Without a feed URL the portfolio endpoint reports every
        // symbol as unpriced.
        None => Arc::new(MockPriceFeed::new()),
    };

    // Create router
    let app = api::create_router(api::AppState::new(
        repo,
        config.clone(),
        recalculator,
        price_feed,
    ));

    // Bind to address
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on {}", addr);

    // Run server
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
