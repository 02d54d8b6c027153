//! Transaction type: a single immutable entry in the ledger.

use crate::domain::{Decimal, Symbol, TimeMs, TxKind, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single ledger transaction (buy, sell, airdrop, or farming reward).
///
/// Immutable once recorded. Synthetic transactions are generated by the
/// engine itself (stablecoin proceeds from a sale) and are excluded from
/// replay input so they are never double counted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Stable unique identifier for this transaction.
    pub tx_key: String,
    /// Time of the transaction in milliseconds since Unix epoch.
    pub time_ms: TimeMs,
    /// Owning user.
    pub user: UserId,
    /// Asset symbol (normalized uppercase).
    pub symbol: Symbol,
    /// Transaction kind.
    pub kind: TxKind,
    /// Quantity of the asset (positive).
    pub quantity: Decimal,
    /// Price per unit (>= 0; 0 for airdrop/farming).
    pub unit_price: Decimal,
    /// Total amount, stored independently of quantity * unit_price.
    pub total_amount: Decimal,
    /// Payment method used, if recorded (e.g. "exchange", "wallet").
    pub payment_method: Option<String>,
    /// Currency the proceeds/payment were denominated in.
    pub payment_currency: Option<Symbol>,
    /// True for transactions generated by the engine itself.
    pub synthetic: bool,
    /// Optional category tag carried through to the position.
    pub category: Option<String>,
}

/// Validation error for a malformed transaction shape.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransactionError {
    #[error("transaction {0}: quantity must be positive")]
    NonPositiveQuantity(String),
    #[error("transaction {0}: unit price must not be negative")]
    NegativePrice(String),
    #[error("transaction {0}: total amount must not be negative")]
    NegativeTotal(String),
}

impl Transaction {
    /// Create a new transaction, deriving a stable `tx_key` and total amount.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        time_ms: TimeMs,
        user: UserId,
        symbol: Symbol,
        kind: TxKind,
        quantity: Decimal,
        unit_price: Decimal,
        payment_method: Option<String>,
        payment_currency: Option<Symbol>,
    ) -> Self {
        let total_amount = quantity * unit_price;
        let tx_key = Self::compute_tx_key(
            &user,
            &symbol,
            kind,
            time_ms,
            &quantity,
            &unit_price,
            false,
        );
        Transaction {
            tx_key,
            time_ms,
            user,
            symbol,
            kind,
            quantity,
            unit_price,
            total_amount,
            payment_method,
            payment_currency,
            synthetic: false,
            category: None,
        }
    }

    /// Build the synthetic stablecoin credit for a sale's proceeds.
    ///
    /// Unit price is pegged at 1.0; the quantity is the sale's total
    /// proceeds in the stablecoin.
    pub fn synthetic_stablecoin_credit(
        sale: &Transaction,
        stablecoin: Symbol,
        proceeds: Decimal,
    ) -> Self {
        let tx_key = Self::compute_tx_key(
            &sale.user,
            &stablecoin,
            TxKind::Buy,
            sale.time_ms,
            &proceeds,
            &Decimal::one(),
            true,
        );
        Transaction {
            tx_key,
            time_ms: sale.time_ms,
            user: sale.user.clone(),
            symbol: stablecoin,
            kind: TxKind::Buy,
            quantity: proceeds,
            unit_price: Decimal::one(),
            total_amount: proceeds,
            payment_method: sale.payment_method.clone(),
            payment_currency: None,
            synthetic: true,
            category: None,
        }
    }

    /// Attach a category tag.
    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    /// Override the derived key with a caller-supplied identifier.
    pub fn with_tx_key(mut self, tx_key: String) -> Self {
        self.tx_key = tx_key;
        self
    }

    /// Generate a stable unique key from the deterministic fields.
    pub fn compute_tx_key(
        user: &UserId,
        symbol: &Symbol,
        kind: TxKind,
        time_ms: TimeMs,
        quantity: &Decimal,
        unit_price: &Decimal,
        synthetic: bool,
    ) -> String {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update(user.as_str());
        hasher.update(symbol.as_str());
        hasher.update(kind.to_string());
        hasher.update(time_ms.as_ms().to_le_bytes());
        hasher.update(quantity.to_canonical_string());
        hasher.update(unit_price.to_canonical_string());
        hasher.update([synthetic as u8]);
        let hash = hasher.finalize();
        format!("tx:{}", hex::encode(&hash[..16]))
    }

    /// Fail-fast shape validation, applied before any replay.
    ///
    /// # Errors
    /// Returns the first violated constraint with the offending key.
    pub fn validate(&self) -> Result<(), TransactionError> {
        if !self.quantity.is_positive() {
            return Err(TransactionError::NonPositiveQuantity(self.tx_key.clone()));
        }
        if self.unit_price.is_negative() {
            return Err(TransactionError::NegativePrice(self.tx_key.clone()));
        }
        if self.total_amount.is_negative() {
            return Err(TransactionError::NegativeTotal(self.tx_key.clone()));
        }
        Ok(())
    }
}
