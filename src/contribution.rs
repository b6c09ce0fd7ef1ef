//! Minimum Contribution Solver.
//!
//! Finds the smallest non-negative cash contribution that lets every asset
//! reach its target percentage without selling anything. The bound is set by
//! the most over-weighted asset: the portfolio has to grow until even that
//! asset's share falls to its target.

use crate::asset::{AssetClass, total_value, validate_assets};
use crate::error::Result;
use crate::math::round_to_cents;

/// Smallest contribution that brings every asset to (or under) its target
/// percentage, rounded to cents. Returns `0` for a portfolio already at or
/// under target everywhere.
///
/// Closed form: an asset holding `v` at target `p` stops being over-weighted
/// once the portfolio total reaches `v * 100 / p`; the answer is the largest
/// such required total minus the current total, floored at zero. Assets with
/// a zero target are excluded — they can never be over-weighted in these
/// terms.
///
/// Validation matches [`crate::rebalance_portfolio`]: the list must be
/// non-empty with targets summing to 100 ± 0.01.
pub fn balancing_contribution(assets: &[AssetClass]) -> Result<f64> {
    validate_assets(assets)?;

    let total_before = total_value(assets);
    let required_total = assets
        .iter()
        .filter(|a| a.target_percent > 0.0)
        .map(|a| a.current_value * 100.0 / a.target_percent)
        .fold(0.0_f64, f64::max);

    Ok(round_to_cents((required_total - total_before).max(0.0)))
}
