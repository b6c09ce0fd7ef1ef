//! End-to-end scenarios: the documented behavior of both solvers on a
//! three-asset portfolio, plus the full validation taxonomy.

use portfolio_balancer::{AssetClass, Error, balancing_contribution, rebalance_portfolio};

fn asset(name: &str, target: f64, value: f64, sell: bool) -> AssetClass {
    AssetClass {
        name: name.into(),
        target_percent: target,
        current_value: value,
        sell,
    }
}

/// Stocks 80% / $100k, Cash 10% / $40k, Bonds 10% / $50k.
fn portfolio(sell: bool) -> Vec<AssetClass> {
    vec![
        asset("Stocks", 80.0, 100_000.0, sell),
        asset("Cash", 10.0, 40_000.0, sell),
        asset("Bonds", 10.0, 50_000.0, sell),
    ]
}

fn amounts(outcome: &portfolio_balancer::RebalanceOutcome) -> Vec<f64> {
    outcome.transactions.iter().map(|t| t.amount).collect()
}

#[test]
fn small_contribution_goes_entirely_to_stocks() {
    let outcome = rebalance_portfolio(25_000.0, &portfolio(false)).unwrap();

    assert_eq!(amounts(&outcome), vec![25_000.0, 0.0, 0.0]);
    assert_eq!(outcome.transactions[0].final_value, 125_000.0);
    assert_eq!(outcome.summary.total_before, 190_000.0);
    assert_eq!(outcome.summary.total_after, 215_000.0);
}

#[test]
fn large_contribution_fills_every_deficit() {
    let outcome = rebalance_portfolio(325_000.0, &portfolio(false)).unwrap();

    assert_eq!(amounts(&outcome), vec![312_000.0, 11_500.0, 1_500.0]);
    assert_eq!(outcome.summary.total_before, 190_000.0);
    assert_eq!(outcome.summary.total_after, 515_000.0);

    // Everything lands exactly on target.
    let finals: Vec<f64> = outcome
        .transactions
        .iter()
        .map(|t| t.final_percent)
        .collect();
    assert_eq!(finals, vec![80.0, 10.0, 10.0]);
}

#[test]
fn zero_amount_with_sell_permission_rebalances_in_place() {
    let outcome = rebalance_portfolio(0.0, &portfolio(true)).unwrap();

    assert_eq!(amounts(&outcome), vec![52_000.0, -21_000.0, -31_000.0]);
    assert_eq!(outcome.summary.total_after, 190_000.0);

    let finals: Vec<f64> = outcome
        .transactions
        .iter()
        .map(|t| t.final_percent)
        .collect();
    assert_eq!(finals, vec![80.0, 10.0, 10.0]);
}

#[test]
fn locked_withdrawal_comes_from_overweighted_assets() {
    let outcome = rebalance_portfolio(-25_000.0, &portfolio(false)).unwrap();

    // Perfect balance is unreachable (Stocks cannot be bought into without
    // selling), so the over-weighted Cash + Bonds pool absorbs the whole
    // withdrawal, redistributed by their equal target ratio.
    assert_eq!(amounts(&outcome), vec![0.0, -7_500.0, -17_500.0]);

    let finals: Vec<f64> = outcome
        .transactions
        .iter()
        .map(|t| t.final_value)
        .collect();
    assert_eq!(finals, vec![100_000.0, 32_500.0, 32_500.0]);

    assert_eq!(outcome.summary.total_after, 165_000.0);
    assert_eq!(outcome.transactions[0].final_percent, 60.61);
    assert_eq!(outcome.transactions[1].final_percent, 19.7);
    assert_eq!(outcome.transactions[2].final_percent, 19.7);
}

#[test]
fn minimum_contribution_matches_most_overweighted_asset() {
    // Bonds sit at 26.32% against a 10% target and need a $500k total.
    assert_eq!(balancing_contribution(&portfolio(false)).unwrap(), 310_000.0);
}

#[test]
fn transactions_report_starting_percentages() {
    let outcome = rebalance_portfolio(25_000.0, &portfolio(false)).unwrap();
    let current: Vec<f64> = outcome
        .transactions
        .iter()
        .map(|t| t.current_percent)
        .collect();
    // 100k / 40k / 50k of 190k.
    assert_eq!(current, vec![52.63, 21.05, 26.32]);
}

// ============================================================================
// Validation taxonomy
// ============================================================================

#[test]
fn targets_summing_to_90_are_rejected() {
    let assets = vec![
        asset("A", 50.0, 100.0, false),
        asset("B", 40.0, 100.0, false),
    ];
    assert!(matches!(
        rebalance_portfolio(100.0, &assets),
        Err(Error::InvalidTargets { .. })
    ));
    assert!(matches!(
        balancing_contribution(&assets),
        Err(Error::InvalidTargets { .. })
    ));
}

#[test]
fn targets_summing_to_140_are_rejected() {
    let assets = vec![
        asset("A", 70.0, 100.0, false),
        asset("B", 70.0, 100.0, false),
    ];
    assert!(matches!(
        rebalance_portfolio(100.0, &assets),
        Err(Error::InvalidTargets { .. })
    ));
}

#[test]
fn empty_list_is_rejected() {
    assert!(matches!(
        rebalance_portfolio(100.0, &[]),
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        balancing_contribution(&[]),
        Err(Error::InvalidInput(_))
    ));
}

#[test]
fn withdrawal_beyond_portfolio_value_is_rejected() {
    let assets = portfolio(true);
    assert!(matches!(
        rebalance_portfolio(-190_000.01, &assets),
        Err(Error::WithdrawalExceedsValue { .. })
    ));
    // Withdrawing exactly everything is still fine.
    assert!(rebalance_portfolio(-190_000.0, &assets).is_ok());
}

#[test]
fn error_messages_name_the_problem() {
    let err = rebalance_portfolio(100.0, &[]).unwrap_err();
    assert!(err.to_string().contains("empty"));

    let bad_targets = vec![asset("A", 90.0, 100.0, false)];
    let err = rebalance_portfolio(100.0, &bad_targets).unwrap_err();
    assert!(err.to_string().contains("90.00"));

    let small = vec![asset("A", 100.0, 100.0, true)];
    let err = rebalance_portfolio(-500.0, &small).unwrap_err();
    assert!(err.to_string().contains("exceeds"));
}
