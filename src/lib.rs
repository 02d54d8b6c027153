pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;
pub mod pricefeed;

pub use config::Config;
pub use db::{init_db, Repository, TxQuery};
pub use domain::{
    CostBasisMethod, Decimal, Position, RealizedSale, Symbol, TimeMs, Transaction, TxKind, UserId,
};
pub use engine::StablecoinSet;
pub use error::AppError;
pub use orchestration::Recalculator;
pub use pricefeed::{HttpPriceFeed, MockPriceFeed, PriceFeed, PriceFeedError};
