//! Approximate optimal planner (FPTAS)
//!
//! Identical DP to [`super::ExactPlanner`], run on weights rounded **up** to
//! a multiple of a unit derived from the error bound. Rounding up is what
//! makes the guarantee one-sided: the reported entropy (always recomputed on
//! the true weights) never exceeds the exact optimum and trails it by at
//! most `epsilon`.
//!
//! Expected performance characteristic, not a defect: for very small
//! `epsilon` the rounding grid can be finer than the natural grid of the
//! input weights, in which case this planner explores more other-pool states
//! than the exact planner would and runs slower. No fallback between the
//! planners ever occurs.

use tracing::debug;

use crate::model::TreeModel;

use super::dp::{materialize, DpEngine, OptimalPlan};

/// Planner guaranteeing `exact(k) - approx(k) <= epsilon` for every k.
#[derive(Debug)]
pub struct ApproximatePlanner<'a> {
    model: &'a TreeModel,
    epsilon: f64,
}

impl<'a> ApproximatePlanner<'a> {
    /// Planner over a validated model with an additive error bound
    /// `epsilon > 0` (in nats).
    pub fn new(model: &'a TreeModel, epsilon: f64) -> Self {
        Self { model, epsilon }
    }

    /// Solve for all budgets in [1, `budget`] on the rounded weights.
    pub fn plan(&self, budget: usize) -> OptimalPlan {
        let unit = rounding_unit(
            self.epsilon,
            self.model.total_weight(),
            self.model.len(),
            budget,
        );
        debug!(epsilon = self.epsilon, ?unit, "derived rounding unit");
        let table = DpEngine::new(self.model, budget, unit).solve();
        let (summaries, entropies) = materialize(self.model, &table, budget);
        OptimalPlan {
            table,
            summaries,
            entropies,
        }
    }
}

/// Derive the rounding unit for (epsilon, total mass W, n nodes, budget K).
///
/// Rounding every weight up by less than `delta` perturbs each of the at
/// most K piece masses of any candidate summary by at most `n * delta`, and
/// the normalizer by at most the same amount. Bounding the per-piece entropy
/// change by `d * (1 - ln d)` for a normalized perturbation `d`, the whole
/// tree moves by at most `epsilon / 2` once `K * d * (1 - ln d) <= epsilon/2`.
/// The fixed point of `d = eps / (2K (1 - ln d))` is found iteratively and
/// shrunk a notch, then `delta = d * W / (2n)` is rounded down to a power of
/// two so that rounded masses are exactly representable and DP pool states
/// collide. Rounding `delta` down only tightens the guarantee.
///
/// Returns `None` when the unit would not be representable (degenerate
/// inputs such as W = 0, or an epsilon so small the grid is below f64
/// resolution); rounding is then the identity transform by construction.
pub(crate) fn rounding_unit(epsilon: f64, total: f64, n: usize, budget: usize) -> Option<f64> {
    if epsilon <= 0.0 || total <= 0.0 {
        return None;
    }
    let k = budget.max(1) as f64;
    let target = epsilon / (2.0 * k);
    let mut d: f64 = (target / 10.0).min(0.5);
    for _ in 0..8 {
        d = (target / (1.0 - d.ln())).min(0.5);
    }
    d *= 0.9; // stay strictly inside the bound after finite iteration
    let raw = d * total / (2.0 * n.max(1) as f64);
    if !raw.is_normal() {
        return None;
    }
    let unit = 2f64.powi(raw.log2().floor() as i32);
    if unit.is_normal() {
        Some(unit)
    } else {
        None
    }
}
