//! Stable transaction ordering for deterministic replay.

use crate::domain::Transaction;

/// Stable ordering key for transactions.
///
/// Identical timestamps are broken by original insertion order (`seq`),
/// then by tx_key, so a replay over the same log is reproducible.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TxOrderingKey {
    /// Time in milliseconds (primary sort).
    pub time_ms: i64,
    /// Insertion order in the log (secondary sort).
    pub seq: usize,
    /// Transaction key (fallback sort).
    pub tx_key: String,
}

impl TxOrderingKey {
    /// Create an ordering key from a transaction and its log index.
    pub fn from_transaction(tx: &Transaction, seq: usize) -> Self {
        TxOrderingKey {
            time_ms: tx.time_ms.as_ms(),
            seq,
            tx_key: tx.tx_key.clone(),
        }
    }
}

/// True if the slice is sorted ascending by timestamp.
///
/// The replay algorithms are order-dependent and never re-sort silently;
/// callers sort, the engine verifies.
pub fn is_sorted_by_time(transactions: &[Transaction]) -> bool {
    transactions
        .windows(2)
        .all(|pair| pair[0].time_ms <= pair[1].time_ms)
}

/// Sort transactions deterministically, preserving insertion order for ties.
pub fn sort_transactions_deterministic(transactions: &mut [Transaction]) {
    let keys: Vec<TxOrderingKey> = transactions
        .iter()
        .enumerate()
        .map(|(seq, tx)| TxOrderingKey::from_transaction(tx, seq))
        .collect();
    let mut order: Vec<usize> = (0..transactions.len()).collect();
    order.sort_by(|&a, &b| keys[a].cmp(&keys[b]));

    let mut sorted: Vec<Transaction> = order
        .iter()
        .map(|&i| transactions[i].clone())
        .collect();
    transactions.swap_with_slice(&mut sorted);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Decimal, Symbol, TimeMs, TxKind, UserId};
    use std::str::FromStr;

    fn tx(time_ms: i64, px: &str) -> Transaction {
        Transaction::new(
            TimeMs::new(time_ms),
            UserId::new("u1".to_string()),
            Symbol::new("BTC"),
            TxKind::Buy,
            Decimal::from_str("1").unwrap(),
            Decimal::from_str(px).unwrap(),
            None,
            None,
        )
    }

    #[test]
    fn test_is_sorted_by_time() {
        assert!(is_sorted_by_time(&[tx(1000, "1"), tx(2000, "2")]));
        assert!(is_sorted_by_time(&[tx(1000, "1"), tx(1000, "2")]));
        assert!(!is_sorted_by_time(&[tx(2000, "1"), tx(1000, "2")]));
        assert!(is_sorted_by_time(&[]));
    }

    #[test]
    fn test_sort_preserves_insertion_order_for_ties() {
        let a = tx(1000, "1");
        let b = tx(1000, "2");
        let c = tx(500, "3");
        let mut txs = vec![a.clone(), b.clone(), c.clone()];
        sort_transactions_deterministic(&mut txs);
        assert_eq!(txs, vec![c, a, b]);
    }
}
