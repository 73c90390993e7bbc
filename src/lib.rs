//! # Maximum-Entropy Summary Trees
//!
//! Given a weighted rooted tree and a budget K, this library computes, for
//! every k in [1, K], the k-piece "summary tree" that best preserves the
//! shape of the weight distribution, measured by Shannon entropy of the
//! displayed piece weights. Pieces are single nodes, whole subtrees, or
//! synthetic "others" aggregating unexposed siblings; every summary
//! conserves the total mass.
//!
//! ## Planners
//!
//! 1. **Greedy**: best-first expansion by marginal gain — fast, near-optimal
//!    in practice, no guarantee.
//! 2. **Exact**: a bottom-up dynamic program over (node, sub-budget) made
//!    tractable by the entropy chain rule, which decomposes the objective
//!    into independent per-split gains.
//! 3. **Approximate**: the same DP on weights rounded up to an
//!    epsilon-derived unit; entropies trail the optimum by at most epsilon.
//!
//! ## Usage Example
//!
//! ```
//! let ids = vec![1u64, 2, 3, 4];
//! let parents = vec![0u64, 1, 1, 1]; // parent id 0 marks the root
//! let weights = vec![0.0, 3.0, 2.0, 1.0];
//! let labels: Vec<String> = ["root", "a", "b", "c"]
//!     .iter()
//!     .map(|s| s.to_string())
//!     .collect();
//!
//! let out = canopy::optimal(&ids, &parents, &weights, &labels, 4, 0.0).unwrap();
//! assert_eq!(out.summaries.len(), 4);
//! assert_eq!(out.summaries[3].len(), 4);
//! ```

#![warn(missing_docs, missing_debug_implementations)]
#![allow(clippy::new_without_default)]

// Core modules - each implements one component of the engine
pub mod builder; // summary-tree record materialization
pub mod entropy; // split-entropy accounting (chain rule)
pub mod frontier; // replayable frontier state
pub mod model; // validated arena tree model
pub mod planner; // greedy / exact / approximate planners

// Re-exports for convenience
pub use builder::{PieceKind, SummaryRow, SummaryTree, SummaryTreeBuilder};
pub use frontier::{Expansion, FrontierState, Piece};
pub use model::{CompactNode, Node, TreeModel, ROOT_SENTINEL};
pub use planner::{ApproximatePlanner, ExactPlanner, GreedyPlanner};

use thiserror::Error;
use tracing::debug;

/// Errors raised while validating inputs. All of them fire before any
/// planning work begins; no partial result is ever produced.
#[derive(Error, Debug)]
pub enum SummaryError {
    /// Input arrays have differing lengths.
    #[error("input arrays disagree: {ids} ids, {parents} parents, {weights} weights, {labels} labels")]
    LengthMismatch {
        /// Number of ids supplied.
        ids: usize,
        /// Number of parent ids supplied.
        parents: usize,
        /// Number of weights supplied.
        weights: usize,
        /// Number of labels supplied.
        labels: usize,
    },

    /// No nodes were supplied.
    #[error("empty input: a tree needs at least one node")]
    EmptyTree,

    /// A node id collides with the reserved root sentinel.
    #[error("node id {0} is reserved for the root sentinel")]
    InvalidNodeId(u64),

    /// The same id appears more than once.
    #[error("duplicate node id {0}")]
    DuplicateNode(u64),

    /// A parent id has no matching node.
    #[error("node {node} references missing parent {parent}")]
    DanglingReference {
        /// Node carrying the bad reference.
        node: u64,
        /// The parent id that does not exist.
        parent: u64,
    },

    /// A weight is negative or not finite.
    #[error("invalid weight {weight} on node {node}")]
    InvalidWeight {
        /// Offending node id.
        node: u64,
        /// The rejected weight.
        weight: f64,
    },

    /// The sentinel parent count is not exactly one.
    #[error("expected exactly one root, found {roots}")]
    MalformedTree {
        /// Number of sentinel-parent entries seen.
        roots: usize,
    },

    /// Parent pointers form a cycle; the named node never reaches the root.
    #[error("cycle detected: node {0} is not reachable from the root")]
    CycleDetected(u64),

    /// K is zero or exceeds the node count.
    #[error("budget {budget} out of range [1, {nodes}]")]
    BudgetOutOfRange {
        /// Requested budget.
        budget: usize,
        /// Number of nodes in the tree.
        nodes: usize,
    },

    /// Epsilon is negative or not finite.
    #[error("invalid epsilon {0}: must be finite and >= 0")]
    InvalidEpsilon(f64),
}

/// Everything a caller needs from one planning run: the validated, reordered
/// input (plus the permutation that reordered it), the compact tree
/// representation, and one summary tree with its entropy for every k.
#[derive(Debug)]
pub struct SummaryOutput {
    /// Node ids in arena (depth/parent sorted) order.
    pub ids: Vec<u64>,
    /// Parent ids in arena order (sentinel for the root).
    pub parents: Vec<u64>,
    /// Own weights in arena order.
    pub weights: Vec<f64>,
    /// Labels in arena order.
    pub labels: Vec<String>,
    /// `permutation[new_pos]` = index into the caller's original arrays.
    pub permutation: Vec<u32>,
    /// Compact representation: parent id plus first/last child position.
    pub compact: Vec<CompactNode>,
    /// Summary trees for k = 1..=K (index k - 1).
    pub summaries: Vec<SummaryTree>,
    /// The K x 2 entropy table: (k, entropy in nats).
    pub entropies: Vec<(usize, f64)>,
}

impl SummaryOutput {
    fn assemble(
        model: &TreeModel,
        summaries: Vec<SummaryTree>,
        entropies: Vec<(usize, f64)>,
    ) -> Self {
        Self {
            ids: model.ids(),
            parents: model.parents(),
            weights: model.weights(),
            labels: model.labels(),
            permutation: model.permutation().to_vec(),
            compact: model.compact(),
            summaries,
            entropies,
        }
    }
}

/// Plan summary trees with the greedy heuristic.
///
/// Fast and deterministic but not globally optimal; see
/// [`planner::GreedyPlanner`].
pub fn greedy(
    ids: &[u64],
    parents: &[u64],
    weights: &[f64],
    labels: &[String],
    budget: usize,
) -> Result<SummaryOutput, SummaryError> {
    let model = TreeModel::build(ids, parents, weights, labels)?;
    check_budget(budget, model.len())?;
    debug!(nodes = model.len(), budget, "greedy entry point");
    let plan = GreedyPlanner::new(&model).plan(budget);
    Ok(SummaryOutput::assemble(
        &model,
        plan.summaries,
        plan.entropies,
    ))
}

/// Plan optimal (or epsilon-near-optimal) summary trees.
///
/// `epsilon = 0` runs the exact dynamic program; `epsilon > 0` runs the
/// FPTAS on rounded weights, guaranteeing every returned entropy is within
/// `epsilon` of the exact optimum for the same k.
pub fn optimal(
    ids: &[u64],
    parents: &[u64],
    weights: &[f64],
    labels: &[String],
    budget: usize,
    epsilon: f64,
) -> Result<SummaryOutput, SummaryError> {
    if !epsilon.is_finite() || epsilon < 0.0 {
        return Err(SummaryError::InvalidEpsilon(epsilon));
    }
    let model = TreeModel::build(ids, parents, weights, labels)?;
    check_budget(budget, model.len())?;
    debug!(nodes = model.len(), budget, epsilon, "optimal entry point");
    let plan = if epsilon == 0.0 {
        ExactPlanner::new(&model).plan(budget)
    } else {
        ApproximatePlanner::new(&model, epsilon).plan(budget)
    };
    Ok(SummaryOutput::assemble(
        &model,
        plan.summaries,
        plan.entropies,
    ))
}

fn check_budget(budget: usize, nodes: usize) -> Result<(), SummaryError> {
    if budget < 1 || budget > nodes {
        return Err(SummaryError::BudgetOutOfRange { budget, nodes });
    }
    Ok(())
}
