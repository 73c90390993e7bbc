//! Summary-tree planners
//!
//! Three strategies over one [`crate::model::TreeModel`]:
//!
//! - [`GreedyPlanner`]: best-first heuristic, near-linear, not optimal.
//! - [`ExactPlanner`]: bottom-up DP, exact optimum for every k.
//! - [`ApproximatePlanner`]: the same DP on weights rounded up to an
//!   epsilon-derived unit, with a one-sided additive error bound.
//!
//! All planners report entropies recomputed from the materialized pieces
//! under the true input weights, so their results are directly comparable.

mod approx;
mod dp;
mod exact;
mod greedy;

pub use approx::ApproximatePlanner;
pub use dp::{DpCell, DpTable, OptimalPlan};
pub use exact::ExactPlanner;
pub use greedy::{GreedyPlan, GreedyPlanner};
