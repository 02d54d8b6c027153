//! Domain primitives: TimeMs, UserId, Symbol, TxKind, CostBasisMethod.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Time in milliseconds since Unix epoch.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TimeMs(pub i64);

impl TimeMs {
    /// Create a TimeMs from milliseconds.
    pub fn new(ms: i64) -> Self {
        TimeMs(ms)
    }

    /// Get the underlying milliseconds value.
    pub fn as_ms(&self) -> i64 {
        self.0
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        TimeMs(chrono::Utc::now().timestamp_millis())
    }
}

/// Opaque user identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    /// Create a UserId from a string.
    pub fn new(id: String) -> Self {
        UserId(id)
    }

    /// Get the id as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Asset symbol, normalized to trimmed uppercase (e.g. "BTC", "USDT").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    /// Create a Symbol, normalizing to trimmed uppercase.
    pub fn new(symbol: &str) -> Self {
        Symbol(symbol.trim().to_ascii_uppercase())
    }

    /// Get the symbol as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transaction kind.
///
/// Airdrop and Farming are zero-cost acquisitions; Buy is a paid
/// acquisition; Sell is a disposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    Buy,
    Sell,
    Airdrop,
    Farming,
}

impl TxKind {
    /// True for kinds that add units to a position (Buy, Airdrop, Farming).
    pub fn is_acquisition(&self) -> bool {
        !matches!(self, TxKind::Sell)
    }

    /// True for zero-cost acquisitions (Airdrop, Farming).
    pub fn is_zero_cost(&self) -> bool {
        matches!(self, TxKind::Airdrop | TxKind::Farming)
    }
}

impl std::fmt::Display for TxKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TxKind::Buy => write!(f, "buy"),
            TxKind::Sell => write!(f, "sell"),
            TxKind::Airdrop => write!(f, "airdrop"),
            TxKind::Farming => write!(f, "farming"),
        }
    }
}

/// Parse error for [`TxKind`].
#[derive(Debug, Error)]
#[error("unknown transaction kind: {0}")]
pub struct TxKindParseError(pub String);

impl FromStr for TxKind {
    type Err = TxKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(TxKind::Buy),
            "sell" => Ok(TxKind::Sell),
            "airdrop" => Ok(TxKind::Airdrop),
            "farming" => Ok(TxKind::Farming),
            other => Err(TxKindParseError(other.to_string())),
        }
    }
}

/// Cost-basis accounting method for realized gain computation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostBasisMethod {
    #[default]
    Fifo,
    Lifo,
    Average,
}

impl std::fmt::Display for CostBasisMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CostBasisMethod::Fifo => write!(f, "fifo"),
            CostBasisMethod::Lifo => write!(f, "lifo"),
            CostBasisMethod::Average => write!(f, "average"),
        }
    }
}

/// Parse error for [`CostBasisMethod`].
#[derive(Debug, Error)]
#[error("unsupported cost-basis method: {0} (expected fifo, lifo, or average)")]
pub struct MethodParseError(pub String);

impl FromStr for CostBasisMethod {
    type Err = MethodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fifo" => Ok(CostBasisMethod::Fifo),
            "lifo" => Ok(CostBasisMethod::Lifo),
            "average" => Ok(CostBasisMethod::Average),
            other => Err(MethodParseError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_normalization() {
        assert_eq!(Symbol::new(" btc ").as_str(), "BTC");
        assert_eq!(Symbol::new("UsDt").as_str(), "USDT");
        assert_eq!(Symbol::new("ETH"), Symbol::new("eth"));
    }

    #[test]
    fn test_kind_classification() {
        assert!(TxKind::Buy.is_acquisition());
        assert!(TxKind::Airdrop.is_acquisition());
        assert!(TxKind::Farming.is_acquisition());
        assert!(!TxKind::Sell.is_acquisition());

        assert!(TxKind::Airdrop.is_zero_cost());
        assert!(TxKind::Farming.is_zero_cost());
        assert!(!TxKind::Buy.is_zero_cost());
    }

    #[test]
    fn test_kind_parse_case_insensitive() {
        assert_eq!("BUY".parse::<TxKind>().unwrap(), TxKind::Buy);
        assert_eq!(" farming ".parse::<TxKind>().unwrap(), TxKind::Farming);
        assert!("stake".parse::<TxKind>().is_err());
    }

    #[test]
    fn test_method_parse_case_insensitive() {
        assert_eq!("FIFO".parse::<CostBasisMethod>().unwrap(), CostBasisMethod::Fifo);
        assert_eq!("fifo".parse::<CostBasisMethod>().unwrap(), CostBasisMethod::Fifo);
        assert_eq!("Lifo".parse::<CostBasisMethod>().unwrap(), CostBasisMethod::Lifo);
        assert_eq!(
            "AVERAGE".parse::<CostBasisMethod>().unwrap(),
            CostBasisMethod::Average
        );
    }

    #[test]
    fn test_method_rejects_unknown() {
        let err = "twap".parse::<CostBasisMethod>().unwrap_err();
        assert!(err.to_string().contains("twap"));
    }

    #[test]
    fn test_method_default_is_fifo() {
        assert_eq!(CostBasisMethod::default(), CostBasisMethod::Fifo);
    }

    #[test]
    fn test_kind_serde_lowercase() {
        assert_eq!(serde_json::to_string(&TxKind::Airdrop).unwrap(), "\"airdrop\"");
        assert_eq!(
            serde_json::to_string(&CostBasisMethod::Average).unwrap(),
            "\"average\""
        );
    }

    #[test]
    fn test_timems_ordering() {
        assert!(TimeMs::new(1000) < TimeMs::new(2000));
    }
}
