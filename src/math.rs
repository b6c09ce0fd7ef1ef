//! Monetary rounding and the deviation metric shared by both solvers.

/// Tolerance when comparing deviations: differences inside this band count
/// as a tie and the earlier asset in the list wins.
pub(crate) const DEVIATION_EPS: f64 = 1e-4;

/// Smallest monetary step the solvers will move (one cent).
pub(crate) const CENT: f64 = 0.01;

/// Allowed drift of the target-percent sum from 100.
pub(crate) const TARGET_SUM_TOLERANCE: f64 = 0.01;

/// Hard cap on solver iterations. This is a termination safeguard against
/// rounding-induced oscillation, not a performance tuning knob.
pub(crate) const MAX_ITERATIONS: usize = 1_000;

/// Round to hundredths (cents).
///
/// Applied after every arithmetic step that produces a monetary or
/// percentage value, so floating-point drift cannot accumulate across
/// solver iterations.
#[inline]
pub fn round_to_cents(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Fractional deviation of an actual allocation from its target:
/// `actual / target - 1`, or `0` when the target is zero.
///
/// Negative means under-weighted (needs buying), positive means
/// over-weighted (needs selling). Magnitude is relative to the target, so a
/// small target missed by a lot outranks a large target missed by a little.
#[inline]
pub fn deviation(actual_pct: f64, target_pct: f64) -> f64 {
    if target_pct == 0.0 {
        0.0
    } else {
        actual_pct / target_pct - 1.0
    }
}
