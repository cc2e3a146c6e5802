//! Integration tests for lendvar-portfolio.
//!
//! These tests verify end-to-end revaluation of a realistic lending book.

use std::collections::HashMap;

use lendvar_core::{AccountId, AssetSymbol};
use lendvar_portfolio::prelude::*;

// =============================================================================
// TEST FIXTURES
// =============================================================================

fn sym(s: &str) -> AssetSymbol {
    AssetSymbol::new(s).unwrap()
}

fn position(
    account: &str,
    symbol: &str,
    collateral: f64,
    debt: f64,
    is_collateral: bool,
    price: f64,
) -> PositionRecord {
    PositionRecord {
        account_id: AccountId::new(account).unwrap(),
        symbol: sym(symbol),
        collateral_amount: collateral,
        debt_amount: debt,
        is_collateral,
        reference_price: price,
    }
}

/// A small book mixing ETH, BTC and stablecoin borrowers.
fn create_lending_book() -> Portfolio {
    Portfolio::from_records(vec![
        // Leveraged ETH long: 20 WETH against 45k USDC
        position("0x01", "WETH", 20.0, 0.0, true, 3000.0),
        position("0x01", "USDC", 0.0, 45_000.0, true, 1.0),
        // BTC holder short ETH
        position("0x02", "WBTC", 2.0, 0.0, true, 60_000.0),
        position("0x02", "WETH", 0.0, 25.0, true, 3000.0),
        // Stablecoin loop
        position("0x03", "USDC", 100_000.0, 0.0, true, 1.0),
        position("0x03", "USDT", 0.0, 90_000.0, true, 1.0),
        // Supplier with collateral switched off and a dust loan
        position("0x04", "WETH", 3.0, 0.0, false, 3000.0),
        position("0x04", "USDT", 0.0, 10.0, false, 1.0),
        // Pure supplier
        position("0x05", "USDC", 5_000.0, 0.0, true, 1.0),
        // Exotic collateral the market model does not cover
        position("0x06", "RLUSD", 10_000.0, 0.0, true, 1.0),
        position("0x06", "WETH", 0.0, 2.0, true, 3000.0),
    ])
    .unwrap()
}

fn market_columns() -> Vec<AssetSymbol> {
    ["WETH", "WBTC", "USDC", "USDT"].into_iter().map(sym).collect()
}

// =============================================================================
// CURRENT STATE
// =============================================================================

#[test]
fn test_current_state_only_dust_is_bad_debt() {
    let book = create_lending_book();
    let snapshot = current_bad_debt(
        &book,
        &HashMap::<AssetSymbol, f64>::new(),
        &RevaluationConfig::default(),
    );

    assert_eq!(snapshot.accounts, 6);
    assert_eq!(snapshot.active_accounts, 5);
    assert_eq!(snapshot.insolvent_accounts, 1);
    assert!((snapshot.total_bad_debt - 10.0).abs() < 1e-9);
    assert_eq!(snapshot.by_symbol.len(), 1);
    assert!((snapshot.by_symbol[&sym("USDT")].bad_debt - 10.0).abs() < 1e-9);
}

// =============================================================================
// SCENARIOS
// =============================================================================

#[test]
fn test_eth_crash_scenario() {
    let book = create_lending_book();
    let plan = RevaluationPlan::compile(&book, &market_columns());

    // ETH -50%, BTC unchanged, stables at peg
    let shortfall = plan.shortfall(&[1500.0, 60_000.0, 1.0, 1.0]);
    // 0x01: 30000 - 45000 = -15000; 0x04: -10; others solvent
    assert!((shortfall - 15_010.0).abs() < 1e-9);
}

#[test]
fn test_eth_rally_scenario() {
    let book = create_lending_book();
    let plan = RevaluationPlan::compile(&book, &market_columns());

    // ETH x6, BTC unchanged
    let shortfall = plan.shortfall(&[18_000.0, 60_000.0, 1.0, 1.0]);
    // 0x02: 120000 - 450000 = -330000; 0x06: 10000 - 36000 = -26000; 0x04: -10
    assert!((shortfall - 356_010.0).abs() < 1e-6);
}

#[test]
fn test_stablecoin_depeg() {
    let book = create_lending_book();
    let columns = market_columns();

    let prices: HashMap<_, _> = columns
        .iter()
        .cloned()
        .zip([3000.0, 60_000.0, 0.85, 1.0])
        .collect();
    let result = scenario_shortfall(&book, &prices);

    // 0x03: 85000 - 90000 = -5000; 0x04: -10
    assert!((result.shortfall - 5_010.0).abs() < 1e-9);
    assert_eq!(result.insolvent_accounts, 2);
}

#[test]
fn test_uncovered_symbol_reported_once() {
    let book = create_lending_book();
    let plan = RevaluationPlan::compile(&book, &market_columns());

    assert_eq!(plan.diagnostics().len(), 1);
    assert!(plan.diagnostics().contains_kind("scenario_price_fallback"));

    let prices: HashMap<_, _> = market_columns()
        .into_iter()
        .zip([3000.0, 60_000.0, 1.0, 1.0])
        .collect();
    let result = scenario_shortfall(&book, &prices);
    assert_eq!(result.fallbacks.get(&sym("RLUSD")), Some(&1));
}

#[test]
fn test_portfolio_roundtrips_through_json() {
    let book = create_lending_book();
    let json = serde_json::to_string(&book).unwrap();
    let back: Portfolio = serde_json::from_str(&json).unwrap();
    assert_eq!(book, back);
}
