//! Balance Solver: split a signed cash amount across asset classes.
//!
//! The solver runs in phases over a mutable working copy of the asset list:
//!
//! 1. **Internal rebalancing** — sell over-weighted sellable assets to fund
//!    under-weighted sellable assets, leaving the total untouched.
//! 2. **External amount** — greedily buy into the most under-weighted assets
//!    for a contribution, or pick a withdrawal branch (perfect balance,
//!    sellable pool, over-weighted pool, global proportional).
//! 3. **Residual settlement** — push whatever cents rounding left over into
//!    a single asset so the plan sums back to the requested amount.
//! 4. **Output** — per-asset transactions plus a before/after summary.
//!
//! Deviation from target is always measured relative to the target
//! percentage (see [`crate::math::deviation`]), so a small allocation missed
//! badly is fixed before a large allocation missed slightly.

use log::debug;

use crate::asset::{
    AssetClass, RebalanceOutcome, Summary, Transaction, total_value, validate_assets,
};
use crate::error::{Error, Result};
use crate::math::{CENT, DEVIATION_EPS, MAX_ITERATIONS, deviation, round_to_cents};

/// Mutable working copy of one asset while the solver runs.
struct WorkingAsset {
    target_percent: f64,
    sell: bool,
    /// Running value, starts at the asset's current value.
    working_value: f64,
    /// Accumulated signed delta.
    transaction: f64,
    /// Fixed target value for the post-rebalance total.
    target_value: f64,
}

impl WorkingAsset {
    fn deviation(&self, total_after: f64) -> f64 {
        if total_after == 0.0 {
            return 0.0;
        }
        deviation(
            self.working_value / total_after * 100.0,
            self.target_percent,
        )
    }

    /// Apply a signed delta to the running value and the accumulated
    /// transaction. `delta` must already be rounded to cents.
    fn apply(&mut self, delta: f64) {
        self.working_value = round_to_cents(self.working_value + delta);
        self.transaction = round_to_cents(self.transaction + delta);
    }
}

/// Compute the per-asset transactions that move a portfolio as close to its
/// target allocation as sell permissions allow, while absorbing `amount`
/// (positive contribution, negative withdrawal, zero for an internal-only
/// rebalance).
///
/// Fails with [`Error::InvalidInput`] on an empty list or non-finite
/// numbers, [`Error::InvalidTargets`] when target percentages do not sum to
/// 100 ± 0.01, and [`Error::WithdrawalExceedsValue`] when the withdrawal is
/// larger than the portfolio. Anything else — no sellable assets, extreme
/// imbalance, cent-level residue — resolves through fallback branches and
/// still produces a valid, sum-preserving plan.
pub fn rebalance_portfolio(amount: f64, assets: &[AssetClass]) -> Result<RebalanceOutcome> {
    if !amount.is_finite() {
        return Err(Error::InvalidInput("amount is not finite".into()));
    }
    validate_assets(assets)?;

    let amount = round_to_cents(amount);
    let total_before = total_value(assets);
    let total_after = round_to_cents(total_before + amount);
    if total_after < 0.0 {
        return Err(Error::WithdrawalExceedsValue {
            amount,
            total: total_before,
        });
    }

    debug!(
        "rebalancing {} assets: total {total_before:.2} -> {total_after:.2}",
        assets.len()
    );

    let mut working: Vec<WorkingAsset> = assets
        .iter()
        .map(|a| WorkingAsset {
            target_percent: a.target_percent,
            sell: a.sell,
            working_value: round_to_cents(a.current_value),
            transaction: 0.0,
            target_value: round_to_cents(a.target_percent / 100.0 * total_after),
        })
        .collect();

    transfer_between_sellable(&mut working, total_after);

    if amount < 0.0 {
        apply_withdrawal(&mut working, amount, total_after);
    } else if amount > 0.0 {
        apply_contribution(&mut working, amount, total_after);
    }

    settle_residual(&mut working, total_after);

    Ok(build_outcome(assets, &working, total_before, total_after, amount))
}

/// Phase 1: sell-funded internal rebalancing.
///
/// Repeatedly moves value from the most over-weighted sellable asset to the
/// most under-weighted sellable asset without changing the portfolio total.
/// Runs for contributions and withdrawals alike; a hard iteration cap
/// guarantees termination even if cent rounding oscillates.
fn transfer_between_sellable(working: &mut [WorkingAsset], total_after: f64) {
    if total_after <= CENT || !working.iter().any(|w| w.sell) {
        return;
    }

    for iteration in 0..MAX_ITERATIONS {
        let (Some(seller), Some(buyer)) = (
            select_seller(working, total_after),
            select_buyer(working, total_after),
        ) else {
            break;
        };

        let excess = working[seller].working_value - working[seller].target_value;
        let deficit = working[buyer].target_value - working[buyer].working_value;
        let transfer = round_to_cents(
            excess
                .max(0.0)
                .min(deficit.max(0.0))
                .min(working[seller].working_value),
        );
        if transfer < CENT {
            break;
        }

        debug!("iteration {iteration}: transfer {transfer:.2} from #{seller} to #{buyer}");
        working[seller].apply(-transfer);
        working[buyer].apply(transfer);
    }
}

/// Sellable asset with the largest positive deviation and value left to
/// sell. Ties (within tolerance) keep the earlier asset.
fn select_seller(working: &[WorkingAsset], total_after: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, w) in working.iter().enumerate() {
        if !w.sell || w.working_value <= CENT {
            continue;
        }
        let dev = w.deviation(total_after);
        if dev <= DEVIATION_EPS {
            continue;
        }
        match best {
            Some((_, best_dev)) if dev <= best_dev + DEVIATION_EPS => {}
            _ => best = Some((i, dev)),
        }
    }
    best.map(|(i, _)| i)
}

/// Sellable asset with the most negative deviation. Ties keep the earlier
/// asset.
fn select_buyer(working: &[WorkingAsset], total_after: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, w) in working.iter().enumerate() {
        if !w.sell {
            continue;
        }
        let dev = w.deviation(total_after);
        if dev >= -DEVIATION_EPS {
            continue;
        }
        match best {
            Some((_, best_dev)) if dev >= best_dev - DEVIATION_EPS => {}
            _ => best = Some((i, dev)),
        }
    }
    best.map(|(i, _)| i)
}

/// Phase 2, `amount < 0`: pick a withdrawal branch.
///
/// Perfect target balance is the dominant objective: when it is reachable
/// after the withdrawal, every asset lands exactly on target, sell flags
/// notwithstanding. Otherwise the withdrawal comes out of the sellable pool
/// when it covers the amount, out of the over-weighted assets when nothing
/// is sellable, and proportionally out of everything as a last resort.
fn apply_withdrawal(working: &mut [WorkingAsset], amount: f64, total_after: f64) {
    // Nothing left to allocate: drive every position to zero.
    if total_after == 0.0 {
        debug!("withdrawal liquidates the portfolio");
        for w in working.iter_mut() {
            if w.working_value > 0.0 {
                let value = w.working_value;
                w.apply(-value);
            }
        }
        return;
    }

    let target_sum: f64 = working.iter().map(|w| w.target_percent).sum();

    let achievable = working
        .iter()
        .all(|w| w.target_percent / 100.0 * total_after <= w.working_value + CENT);
    if achievable {
        debug!("perfect target balance is achievable after withdrawal");
        for w in working.iter_mut() {
            let target = round_to_cents(w.target_percent / target_sum * total_after);
            let delta = round_to_cents(target - w.working_value);
            w.apply(delta);
        }
        return;
    }

    let sellable: Vec<usize> = (0..working.len()).filter(|&i| working[i].sell).collect();
    if sellable.is_empty() {
        // No sell permission anywhere: take the withdrawal out of the
        // over-weighted assets, redistributed by their target ratio.
        let over: Vec<usize> = (0..working.len())
            .filter(|&i| working[i].deviation(total_after) > DEVIATION_EPS)
            .collect();
        if !over.is_empty() {
            let pool: f64 = over.iter().map(|&i| working[i].working_value).sum();
            if pool + amount >= -CENT {
                debug!("withdrawing {:.2} from over-weighted assets", -amount);
                redistribute_pool(working, &over, pool + amount);
                return;
            }
        }
    } else {
        let pool: f64 = sellable.iter().map(|&i| working[i].working_value).sum();
        if pool + amount >= -CENT {
            debug!("withdrawing {:.2} from the sellable pool", -amount);
            redistribute_pool(working, &sellable, pool + amount);
            return;
        }
    }

    // Last resort: proportional withdrawal from every asset by global
    // target ratio, clamped so no value goes negative.
    debug!("withdrawing proportionally from all assets");
    for w in working.iter_mut() {
        let share = round_to_cents(amount * w.target_percent / target_sum);
        let delta = round_to_cents(share.max(-w.working_value));
        w.apply(delta);
    }
}

/// Set every pool member to its share of `pool_after`, split by the
/// members' target ratio. Degenerate pools (all-zero targets) fall back to
/// value share, then to an even split.
fn redistribute_pool(working: &mut [WorkingAsset], members: &[usize], pool_after: f64) {
    let pct_sum: f64 = members.iter().map(|&i| working[i].target_percent).sum();
    let value_sum: f64 = members.iter().map(|&i| working[i].working_value).sum();
    for &i in members {
        let ratio = if pct_sum > 0.0 {
            working[i].target_percent / pct_sum
        } else if value_sum > 0.0 {
            working[i].working_value / value_sum
        } else {
            1.0 / members.len() as f64
        };
        let target = round_to_cents((pool_after * ratio).max(0.0));
        let delta = round_to_cents(target - working[i].working_value);
        working[i].apply(delta);
    }
}

/// Phase 2, `amount > 0`: greedy contribution loop.
///
/// Each pass buys into the most under-weighted asset, up to its deficit,
/// until the cash is spent or no buy of at least one cent is possible.
/// Leftovers are handled by [`settle_residual`].
fn apply_contribution(working: &mut [WorkingAsset], amount: f64, total_after: f64) {
    let mut remaining = amount;
    for _ in 0..MAX_ITERATIONS {
        if remaining < CENT {
            break;
        }
        let Some(buyer) = select_most_underweighted(working, total_after) else {
            break;
        };
        let deficit = (working[buyer].target_value - working[buyer].working_value).max(0.0);
        let buy = round_to_cents(remaining.min(deficit));
        if buy < CENT {
            break;
        }
        debug!("buying {buy:.2} into #{buyer}");
        working[buyer].apply(buy);
        remaining = round_to_cents(remaining - buy);
    }
}

/// Asset with the lowest deviation. Ties keep the earlier asset.
fn select_most_underweighted(working: &[WorkingAsset], total_after: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, w) in working.iter().enumerate() {
        let dev = w.deviation(total_after);
        match best {
            Some((_, best_dev)) if dev >= best_dev - DEVIATION_EPS => {}
            _ => best = Some((i, dev)),
        }
    }
    best.map(|(i, _)| i)
}

/// Highest-deviation asset with positive working value.
fn select_residual_seller(working: &[WorkingAsset], total_after: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, w) in working.iter().enumerate() {
        if w.working_value <= 0.0 {
            continue;
        }
        let dev = w.deviation(total_after);
        match best {
            Some((_, best_dev)) if dev <= best_dev + DEVIATION_EPS => {}
            _ => best = Some((i, dev)),
        }
    }
    best.map(|(i, _)| i)
}

/// Phase 3: settle any residual left by rounding or clamping.
///
/// A leftover contribution goes to the most under-weighted asset; a
/// leftover withdrawal comes out of the most over-weighted asset that still
/// has value, clamped at zero and repeated if the clamp falls short (so no
/// final value ever goes negative).
fn settle_residual(working: &mut [WorkingAsset], total_after: f64) {
    for _ in 0..MAX_ITERATIONS {
        let allocated: f64 = working.iter().map(|w| w.working_value).sum();
        let remaining = round_to_cents(total_after - allocated);
        if remaining.abs() <= CENT {
            return;
        }
        if remaining > 0.0 {
            if let Some(i) = select_most_underweighted(working, total_after) {
                debug!("settling leftover contribution {remaining:.2} into #{i}");
                working[i].apply(remaining);
            }
            return;
        }
        let Some(i) = select_residual_seller(working, total_after) else {
            return;
        };
        debug!("settling leftover withdrawal {:.2} from #{i}", -remaining);
        let delta = round_to_cents(remaining.max(-working[i].working_value));
        working[i].apply(delta);
    }
}

/// Phase 4: freeze the working state into rounded output records.
fn build_outcome(
    assets: &[AssetClass],
    working: &[WorkingAsset],
    total_before: f64,
    total_after: f64,
    amount: f64,
) -> RebalanceOutcome {
    let transactions = assets
        .iter()
        .zip(working)
        .map(|(asset, w)| Transaction {
            name: asset.name.clone(),
            amount: round_to_cents(w.transaction),
            current_value: round_to_cents(asset.current_value),
            final_value: round_to_cents(w.working_value),
            target_percent: round_to_cents(asset.target_percent),
            current_percent: percent_of(asset.current_value, total_before),
            final_percent: percent_of(w.working_value, total_after),
        })
        .collect();

    RebalanceOutcome {
        transactions,
        summary: Summary {
            total_before,
            total_after,
            contribution: amount,
        },
    }
}

fn percent_of(value: f64, total: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        round_to_cents(value / total * 100.0)
    }
}
