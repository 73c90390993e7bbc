//! Exact optimal planner
//!
//! Runs the shared DP on the weights exactly as given (identity transform).
//! The result is the true optimum for every k; on weights that share a grid
//! (integer counts in particular) the other-pool dimension of the DP stays
//! pseudo-polynomial in the total mass.

use crate::model::TreeModel;

use super::dp::{materialize, DpEngine, OptimalPlan};

/// Planner computing the exact maximum-entropy summary tree for every k.
#[derive(Debug)]
pub struct ExactPlanner<'a> {
    model: &'a TreeModel,
}

impl<'a> ExactPlanner<'a> {
    /// Planner over a validated model.
    pub fn new(model: &'a TreeModel) -> Self {
        Self { model }
    }

    /// Solve for all budgets in [1, `budget`] and materialize each optimum.
    ///
    /// Optima for different k come out of one table independently; the
    /// returned summaries are not guaranteed (and in general fail) to be
    /// nested across k.
    pub fn plan(&self, budget: usize) -> OptimalPlan {
        let table = DpEngine::new(self.model, budget, None).solve();
        let (summaries, entropies) = materialize(self.model, &table, budget);
        OptimalPlan {
            table,
            summaries,
            entropies,
        }
    }
}
