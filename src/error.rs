//! Error types for the balancer.

/// All errors the solvers can return.
///
/// Every failure is synchronous and terminal: the solvers reject bad input
/// before touching any working state, so there are no partial results to
/// recover from and retrying an identical call changes nothing.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The asset list is unusable before any computation can start.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Target percentages do not sum to 100 within tolerance.
    #[error("target percentages sum to {sum:.2}, expected 100.00 ± 0.01")]
    InvalidTargets { sum: f64 },

    /// The requested withdrawal is larger than the whole portfolio.
    #[error("withdrawal of {amount:.2} exceeds portfolio value {total:.2}")]
    WithdrawalExceedsValue { amount: f64, total: f64 },
}

pub type Result<T> = std::result::Result<T, Error>;
