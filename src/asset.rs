//! Asset-class inputs and the transaction/summary outputs.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::math::{TARGET_SUM_TOLERANCE, round_to_cents};

/// A named bucket of portfolio value with a target allocation and a sell
/// permission flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetClass {
    pub name: String,
    /// Target allocation in percent (0–100). Targets across the whole list
    /// must sum to 100 within 0.01.
    pub target_percent: f64,
    /// Current market value. Assumed non-negative.
    pub current_value: f64,
    /// Whether this asset may be reduced during rebalancing.
    #[serde(default)]
    pub sell: bool,
}

/// One per-asset line of a rebalancing plan.
///
/// All monetary and percentage fields are rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub name: String,
    /// Signed delta to apply: positive buys, negative sells.
    pub amount: f64,
    pub current_value: f64,
    pub final_value: f64,
    pub target_percent: f64,
    /// Share of the pre-rebalance total, or 0 for an empty portfolio.
    pub current_percent: f64,
    /// Share of the post-rebalance total, or 0 after a full liquidation.
    pub final_percent: f64,
}

/// Portfolio-level before/after totals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_before: f64,
    pub total_after: f64,
    /// The requested cash flow, rounded to cents. Negative for withdrawals.
    pub contribution: f64,
}

/// Full result of a rebalancing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceOutcome {
    pub transactions: Vec<Transaction>,
    pub summary: Summary,
}

/// Validate the asset list shared by both solvers: non-empty, finite
/// fields, targets summing to 100 within tolerance.
pub(crate) fn validate_assets(assets: &[AssetClass]) -> Result<()> {
    if assets.is_empty() {
        return Err(Error::InvalidInput("asset list is empty".into()));
    }
    for asset in assets {
        if !asset.target_percent.is_finite() || !asset.current_value.is_finite() {
            return Err(Error::InvalidInput(format!(
                "asset '{}' has a non-finite field",
                asset.name
            )));
        }
    }
    let sum: f64 = assets.iter().map(|a| a.target_percent).sum();
    if (sum - 100.0).abs() > TARGET_SUM_TOLERANCE {
        return Err(Error::InvalidTargets { sum });
    }
    Ok(())
}

/// Sum of current values, rounded to cents.
pub(crate) fn total_value(assets: &[AssetClass]) -> f64 {
    round_to_cents(assets.iter().map(|a| a.current_value).sum())
}
