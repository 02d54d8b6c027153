use cryptofolio::domain::{CostBasisMethod, Decimal, Symbol, TimeMs, Transaction, TxKind, UserId};
use cryptofolio::engine::{compute_realized, Filters};
use std::str::FromStr;

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn tx(symbol: &str, kind: TxKind, qty: &str, px: &str, ms: i64) -> Transaction {
    Transaction::new(
        TimeMs::new(ms),
        UserId::new("u1".to_string()),
        Symbol::new(symbol),
        kind,
        d(qty),
        d(px),
        None,
        None,
    )
}

fn ladder() -> Vec<Transaction> {
    vec![
        tx("BTC", TxKind::Buy, "10", "1", 1000),
        tx("BTC", TxKind::Buy, "10", "3", 2000),
        tx("BTC", TxKind::Sell, "10", "5", 3000),
    ]
}

#[test]
fn test_fifo_consumes_oldest_lot_first() {
    let report = compute_realized(&ladder(), CostBasisMethod::Fifo, &Filters::default()).unwrap();

    assert_eq!(report.total_realized, d("40"));
    let btc = &report.symbols[0];
    assert_eq!(btc.sales.len(), 1);
    assert_eq!(btc.sales[0].cost_basis, d("10"));
    assert_eq!(btc.sales[0].consumed.len(), 1);
    assert_eq!(btc.sales[0].consumed[0].unit_price, d("1"));
    assert_eq!(btc.remaining_quantity, d("10"));
}

#[test]
fn test_lifo_consumes_newest_lot_first() {
    let report = compute_realized(&ladder(), CostBasisMethod::Lifo, &Filters::default()).unwrap();

    assert_eq!(report.total_realized, d("20"));
    let btc = &report.symbols[0];
    assert_eq!(btc.sales[0].cost_basis, d("30"));
    assert_eq!(btc.sales[0].consumed[0].unit_price, d("3"));
}

#[test]
fn test_average_pools_lot_costs() {
    let report =
        compute_realized(&ladder(), CostBasisMethod::Average, &Filters::default()).unwrap();

    assert_eq!(report.total_realized, d("30"));
    let btc = &report.symbols[0];
    assert_eq!(btc.sales[0].cost_basis, d("20"));
    // Average consumption reports one pooled lot, not per-lot slices.
    assert_eq!(btc.sales[0].consumed.len(), 1);
    assert_eq!(btc.sales[0].consumed[0].unit_price, d("2"));
}

#[test]
fn test_partial_lot_consumption_spans_lots() {
    let txs = vec![
        tx("BTC", TxKind::Buy, "10", "1", 1000),
        tx("BTC", TxKind::Buy, "10", "3", 2000),
        tx("BTC", TxKind::Sell, "15", "5", 3000),
    ];
    let report = compute_realized(&txs, CostBasisMethod::Fifo, &Filters::default()).unwrap();

    let sale = &report.symbols[0].sales[0];
    // 10 @ 1 fully consumed, then 5 @ 3.
    assert_eq!(sale.cost_basis, d("25"));
    assert_eq!(sale.consumed.len(), 2);
    assert_eq!(sale.consumed[0].quantity, d("10"));
    assert_eq!(sale.consumed[1].quantity, d("5"));
    assert_eq!(report.symbols[0].remaining_quantity, d("5"));
}

#[test]
fn test_zero_cost_acquisitions_realize_full_proceeds() {
    let txs = vec![
        tx("ARB", TxKind::Airdrop, "100", "0", 1000),
        tx("ARB", TxKind::Sell, "100", "2", 2000),
    ];
    let report = compute_realized(&txs, CostBasisMethod::Fifo, &Filters::default()).unwrap();

    assert_eq!(report.total_realized, d("200"));
    assert_eq!(report.symbols[0].sales[0].cost_basis, d("0"));
}

#[test]
fn test_oversell_skipped_and_counted() {
    let txs = vec![
        tx("BTC", TxKind::Buy, "5", "1", 1000),
        tx("BTC", TxKind::Sell, "8", "2", 2000),
        tx("BTC", TxKind::Sell, "3", "2", 3000),
    ];
    let report = compute_realized(&txs, CostBasisMethod::Fifo, &Filters::default()).unwrap();

    // The oversized sale is skipped entirely; the later covered sale
    // still consumes the untouched lots.
    assert_eq!(report.skipped_sales, 1);
    let btc = &report.symbols[0];
    assert_eq!(btc.skipped_sales, 1);
    assert_eq!(btc.sales.len(), 1);
    assert_eq!(btc.sales[0].quantity_sold, d("3"));
    assert_eq!(btc.sales[0].realized_gain, d("3"));
}

#[test]
fn test_empty_input_zero_report() {
    let report = compute_realized(&[], CostBasisMethod::Average, &Filters::default()).unwrap();
    assert_eq!(report.total_realized, d("0"));
    assert!(report.symbols.is_empty());
    assert_eq!(report.skipped_sales, 0);
}

#[test]
fn test_symbol_filter_limits_report() {
    let txs = vec![
        tx("BTC", TxKind::Buy, "1", "10", 1000),
        tx("ETH", TxKind::Buy, "1", "10", 1000),
        tx("BTC", TxKind::Sell, "1", "20", 2000),
        tx("ETH", TxKind::Sell, "1", "30", 2000),
    ];
    let filters = Filters {
        symbol: Some(Symbol::new("ETH")),
        ..Filters::default()
    };
    let report = compute_realized(&txs, CostBasisMethod::Fifo, &filters).unwrap();

    assert_eq!(report.symbols.len(), 1);
    assert_eq!(report.symbols[0].symbol, Symbol::new("ETH"));
    assert_eq!(report.total_realized, d("20"));
}

#[test]
fn test_date_window_excludes_earlier_lots() {
    let txs = vec![
        tx("BTC", TxKind::Buy, "1", "10", 1000),
        tx("BTC", TxKind::Sell, "1", "20", 5000),
    ];
    let filters = Filters {
        from_ms: Some(TimeMs::new(2000)),
        ..Filters::default()
    };
    let report = compute_realized(&txs, CostBasisMethod::Fifo, &filters).unwrap();

    // The window hides the buy, so the sale has no inventory to consume.
    assert_eq!(report.skipped_sales, 1);
    assert_eq!(report.total_realized, d("0"));
}

#[test]
fn test_methods_agree_on_single_lot() {
    let txs = vec![
        tx("BTC", TxKind::Buy, "10", "4", 1000),
        tx("BTC", TxKind::Sell, "6", "9", 2000),
    ];
    for method in [
        CostBasisMethod::Fifo,
        CostBasisMethod::Lifo,
        CostBasisMethod::Average,
    ] {
        let report = compute_realized(&txs, method, &Filters::default()).unwrap();
        assert_eq!(report.total_realized, d("30"), "method {}", method);
    }
}

#[test]
fn test_method_parsing_case_insensitive_with_fifo_default() {
    use std::str::FromStr;

    assert_eq!(
        CostBasisMethod::from_str("FIFO").unwrap(),
        CostBasisMethod::Fifo
    );
    assert_eq!(
        CostBasisMethod::from_str("Lifo").unwrap(),
        CostBasisMethod::Lifo
    );
    assert_eq!(
        CostBasisMethod::from_str("average").unwrap(),
        CostBasisMethod::Average
    );
    assert_eq!(CostBasisMethod::default(), CostBasisMethod::Fifo);
    assert!(CostBasisMethod::from_str("twap").is_err());
}
