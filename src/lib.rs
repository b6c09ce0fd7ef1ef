//! Deterministic cash-flow rebalancing for target-allocation portfolios.
//!
//! Given a list of asset classes with target percentages and per-asset sell
//! permissions, the crate answers two questions:
//!
//! - [`rebalance_portfolio`]: how should a contribution or withdrawal be
//!   split across the assets so the result lands as close to target as the
//!   sell permissions allow?
//! - [`balancing_contribution`]: what is the smallest contribution that
//!   brings every asset back to its target percentage without selling
//!   anything?
//!
//! Both functions are pure: they take the asset list, return a plan, and
//! keep no state between calls, so they are safe to call concurrently. All
//! monetary arithmetic is rounded to cents at every step.
//!
//! # Example
//!
//! ```
//! use portfolio_balancer::{AssetClass, rebalance_portfolio};
//!
//! let assets = vec![
//!     AssetClass {
//!         name: "Stocks".into(),
//!         target_percent: 80.0,
//!         current_value: 100_000.0,
//!         sell: false,
//!     },
//!     AssetClass {
//!         name: "Bonds".into(),
//!         target_percent: 20.0,
//!         current_value: 40_000.0,
//!         sell: false,
//!     },
//! ];
//!
//! let outcome = rebalance_portfolio(10_000.0, &assets).unwrap();
//! assert_eq!(outcome.summary.total_after, 150_000.0);
//! // The whole deposit goes to the most under-weighted asset.
//! assert_eq!(outcome.transactions[0].amount, 10_000.0);
//! ```

pub mod asset;
pub mod contribution;
pub mod error;
pub mod math;
pub mod rebalance;

pub use asset::{AssetClass, RebalanceOutcome, Summary, Transaction};
pub use contribution::balancing_contribution;
pub use error::{Error, Result};
pub use math::{deviation, round_to_cents};
pub use rebalance::rebalance_portfolio;
