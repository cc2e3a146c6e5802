//! Property-based tests for revaluation invariants.
//!
//! These tests verify properties that should always hold:
//! - Scenario shortfall is non-negative and never below any single account's
//!   shortfall
//! - The compiled plan and the map-based revaluation agree exactly
//! - Bad-debt attribution sums to the total
//! - Parallel and sequential revaluation return identical rows

use std::collections::HashMap;

use lendvar_core::{AccountId, AssetSymbol};
use lendvar_portfolio::prelude::*;
use proptest::prelude::*;

const SYMBOLS: [&str; 5] = ["WETH", "WBTC", "USDC", "USDT", "wstETH"];

// =============================================================================
// TEST DATA GENERATORS
// =============================================================================

/// Generates a portfolio of `n` accounts with 1-4 positions each.
fn generate_portfolio(n: usize, seed: u64) -> Portfolio {
    let mut records = Vec::new();
    for i in 0..n {
        let hash = simple_hash(seed, i as u64);
        let positions = 1 + (hash % 4) as usize;
        for k in 0..positions {
            let h = simple_hash(hash, k as u64);
            let symbol = SYMBOLS[(h % SYMBOLS.len() as u64) as usize];
            let borrows = h % 3 == 0;
            records.push(PositionRecord {
                account_id: AccountId::new(format!("0x{i:04x}")).unwrap(),
                symbol: AssetSymbol::new(symbol).unwrap(),
                collateral_amount: if borrows { 0.0 } else { (h % 1000) as f64 / 10.0 },
                debt_amount: if borrows { (h % 5000) as f64 / 10.0 } else { 0.0 },
                is_collateral: h % 7 != 0,
                reference_price: 1.0 + (h % 300) as f64,
            });
        }
    }
    Portfolio::from_records(records).unwrap()
}

/// Generates one scenario row aligned with `SYMBOLS`.
fn generate_row(seed: u64) -> Vec<f64> {
    (0..SYMBOLS.len())
        .map(|j| 0.5 + (simple_hash(seed, j as u64) % 4000) as f64 / 10.0)
        .collect()
}

fn columns() -> Vec<AssetSymbol> {
    SYMBOLS.iter().map(|s| AssetSymbol::new(*s).unwrap()).collect()
}

/// Simple deterministic hash for test data generation.
fn simple_hash(seed: u64, i: u64) -> u64 {
    let mut x = seed.wrapping_add(i).wrapping_mul(0x517cc1b727220a95);
    x ^= x >> 32;
    x = x.wrapping_mul(0x517cc1b727220a95);
    x ^= x >> 32;
    x
}

// =============================================================================
// PROPERTY: PLAN AGREES WITH MAP REVALUATION
// =============================================================================

#[test]
fn property_plan_matches_map_revaluation() {
    let columns = columns();

    for seed in 0..10 {
        for size in [1, 5, 25, 100] {
            let portfolio = generate_portfolio(size, seed);
            let plan = RevaluationPlan::compile(&portfolio, &columns);
            let row = generate_row(seed * 31 + size as u64);

            let map: HashMap<_, _> = columns.iter().cloned().zip(row.iter().copied()).collect();
            let expected = scenario_shortfall(&portfolio, &map).shortfall;

            assert_eq!(
                plan.shortfall(&row),
                expected,
                "plan and map disagree for size={size}, seed={seed}"
            );
        }
    }
}

// =============================================================================
// PROPERTY: NO NETTING ACROSS ACCOUNTS
// =============================================================================

#[test]
fn property_total_dominates_each_account() {
    let columns = columns();

    for seed in 0..10 {
        let portfolio = generate_portfolio(50, seed);
        let row = generate_row(seed);
        let prices = IndexedPrices::new(&columns, &row);
        let total = scenario_shortfall(&portfolio, &prices).shortfall;

        let mut sum = 0.0;
        for account in portfolio.accounts() {
            let shortfall = account.valuation(&prices).shortfall();
            assert!(shortfall >= 0.0);
            assert!(shortfall <= total + 1e-9);
            sum += shortfall;
        }
        assert!((sum - total).abs() <= 1e-9 * total.max(1.0));
    }
}

// =============================================================================
// PROPERTY: ATTRIBUTION SUMS TO TOTAL
// =============================================================================

#[test]
fn property_attribution_sums_to_total() {
    let config = RevaluationConfig::default();

    for seed in 0..10 {
        let portfolio = generate_portfolio(100, seed);
        let snapshot = current_bad_debt(&portfolio, &HashMap::<AssetSymbol, f64>::new(), &config);

        let attributed: f64 = snapshot.by_symbol.values().map(|s| s.bad_debt).sum();
        assert!(
            (attributed - snapshot.total_bad_debt).abs() <= 1e-6 * snapshot.total_bad_debt.max(1.0),
            "attributed {attributed} vs total {} for seed={seed}",
            snapshot.total_bad_debt
        );
        assert!(snapshot.insolvent_accounts <= snapshot.active_accounts);
    }
}

// =============================================================================
// PROPERTY: PARALLEL EQUALS SEQUENTIAL
// =============================================================================

#[test]
fn property_parallel_rows_match_sequential() {
    let columns = columns();
    let portfolio = generate_portfolio(200, 7);
    let plan = RevaluationPlan::compile(&portfolio, &columns);

    let matrix: Vec<f64> = (0..500).flat_map(generate_row).collect();
    let sequential = plan.shortfalls(&matrix, &RevaluationConfig::sequential());
    let parallel = plan.shortfalls(&matrix, &RevaluationConfig::new().with_threshold(1));

    assert_eq!(sequential.len(), 500);
    assert_eq!(sequential, parallel);
}

// =============================================================================
// PROPTEST: SHORTFALL NON-NEGATIVE
// =============================================================================

proptest! {
    #[test]
    fn proptest_shortfall_non_negative(
        seed in any::<u64>(),
        size in 1usize..40,
        prices in proptest::collection::vec(0.0f64..1e6, SYMBOLS.len()),
    ) {
        let portfolio = generate_portfolio(size, seed);
        let plan = RevaluationPlan::compile(&portfolio, &columns());
        let shortfall = plan.shortfall(&prices);
        prop_assert!(shortfall >= 0.0);
        prop_assert!(shortfall.is_finite());
    }

    #[test]
    fn proptest_single_asset_account(
        collateral in 0.0f64..1e6,
        debt in 0.0f64..1e6,
        price in 0.0f64..1e4,
    ) {
        let symbol = AssetSymbol::new("A").unwrap();
        let account = Account::new(
            AccountId::new("solo").unwrap(),
            vec![Position::new(symbol.clone(), collateral, debt, true, 1.0)],
        );
        let prices: HashMap<_, _> = [(symbol, price)].into_iter().collect();
        let valuation = account.valuation(&prices);

        if collateral >= debt {
            prop_assert_eq!(valuation.shortfall(), 0.0);
        } else {
            let expected = (debt - collateral) * price;
            let scale = (debt * price).max(1.0);
            prop_assert!((valuation.shortfall() - expected).abs() <= 1e-9 * scale);
        }
    }
}
