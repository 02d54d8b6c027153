use crate::domain::{CostBasisMethod, Symbol};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub price_api_url: Option<String>,
    pub stablecoins: Vec<Symbol>,
    pub default_cost_method: CostBasisMethod,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        // Portfolio valuation degrades to unpriced positions without a feed.
        let price_api_url = env_map.get("PRICE_API_URL").cloned();

        let stablecoins = env_map
            .get("STABLECOINS")
            .map(|s| s.as_str())
            .unwrap_or("USDT,USDC,DAI")
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(Symbol::new)
            .collect::<Vec<_>>();

        let default_cost_method = CostBasisMethod::from_str(
            env_map
                .get("DEFAULT_COST_METHOD")
                .map(|s| s.as_str())
                .unwrap_or("fifo"),
        )
        .map_err(|e| ConfigError::InvalidValue("DEFAULT_COST_METHOD".to_string(), e.to_string()))?;

        Ok(Config {
            port,
            database_path,
            price_api_url,
            stablecoins,
            default_cost_method,
        })
    }
}
