//! Shared dynamic-programming engine
//!
//! Both optimal planners run the same bottom-up DP; they differ only in the
//! weight transform applied before it (identity vs round-up-to-unit). For a
//! node `v` and sub-budget `b`, `f(v, b)` is the best total scaled entropy
//! obtainable from `v`'s subtree when exactly `b` pieces of the overall
//! budget are spent inside it. `f(v, 1) = 0`: the subtree is kept whole.
//!
//! For an internal node the children are merged one at a time into a table
//! of partial states keyed by (pieces used so far, mass folded into the
//! other pool, pool non-empty). Exposing child `c` with budget `b_c` adds
//! `f(c, b_c)` plus the child's own split term; hiding it moves its subtree
//! mass into the pool. Finalizing adds the node's own-weight and pool terms
//! at total budget `1 + children pieces + (pool ? 1 : 0)`. The pool mass is
//! keyed by its exact f64 bit pattern, so states collide - and the table
//! stays pseudo-polynomial - whenever weights sit on a common grid (integer
//! inputs, or rounded weights whose unit is a power of two).
//!
//! Optima for different budgets come out of one table independently, so the
//! k- and (k+1)-piece summaries need not be nested.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tracing::debug;

use crate::builder::{SummaryTree, SummaryTreeBuilder};
use crate::entropy::piece_term;
use crate::frontier::Piece;
use crate::model::TreeModel;

/// One DP cell: the optimum for (node, sub-budget) plus its realizing choice.
#[derive(Debug, Clone)]
pub struct DpCell {
    gain: f64,
    // Per-child piece budgets in arena order, 0 = folded into the other
    // pool. None = the subtree is kept whole (b = 1).
    choice: Option<Vec<u32>>,
}

impl DpCell {
    /// Best achievable scaled entropy contribution.
    pub fn gain(&self) -> f64 {
        self.gain
    }
}

/// Completed DP table: `cells[pos][b - 1]` for budgets `1..=min(size, K)`.
#[derive(Debug)]
pub struct DpTable {
    cells: Vec<Vec<Option<DpCell>>>,
}

impl DpTable {
    /// Cell for (arena position, sub-budget), if that budget is feasible.
    pub fn cell(&self, pos: usize, b: usize) -> Option<&DpCell> {
        self.cells
            .get(pos)
            .and_then(|row| row.get(b.wrapping_sub(1)))
            .and_then(|cell| cell.as_ref())
    }

    /// Optimal gain for (arena position, sub-budget).
    pub fn gain(&self, pos: usize, b: usize) -> Option<f64> {
        self.cell(pos, b).map(DpCell::gain)
    }

    /// Unwind stored decisions into the piece list of the k-piece optimum.
    ///
    /// Pieces come out in the DFS order the builder expects. Iterative; the
    /// stack depth is bounded by the number of exposed nodes, never the raw
    /// tree height times fan-out.
    pub fn reconstruct(&self, model: &TreeModel, k: usize) -> Vec<Piece> {
        enum Work {
            Node { pos: usize, b: usize },
            Other { parent: usize, members: Vec<usize> },
        }

        let mut pieces = Vec::with_capacity(k);
        let mut stack = vec![Work::Node {
            pos: model.root(),
            b: k,
        }];
        while let Some(work) = stack.pop() {
            match work {
                Work::Node { pos, b } => {
                    let cell = match self.cell(pos, b) {
                        Some(cell) => cell,
                        // Every budget in [1, min(size, K)] is feasible and
                        // stored choices only reference existing cells.
                        None => unreachable!("missing DP cell ({pos}, {b})"),
                    };
                    match &cell.choice {
                        None => pieces.push(Piece::Whole(pos)),
                        Some(picks) => {
                            pieces.push(Piece::Single(pos));
                            let children: Vec<usize> = model.children(pos).collect();
                            let members: Vec<usize> = children
                                .iter()
                                .zip(picks)
                                .filter(|(_, &pick)| pick == 0)
                                .map(|(&c, _)| c)
                                .collect();
                            if !members.is_empty() {
                                stack.push(Work::Other {
                                    parent: pos,
                                    members,
                                });
                            }
                            for (&child, &pick) in children.iter().zip(picks).rev() {
                                if pick > 0 {
                                    stack.push(Work::Node {
                                        pos: child,
                                        b: pick as usize,
                                    });
                                }
                            }
                        }
                    }
                }
                Work::Other { parent, members } => {
                    pieces.push(Piece::Other { parent, members });
                }
            }
        }
        debug_assert_eq!(pieces.len(), k);
        pieces
    }
}

/// Result of an optimal planner run.
#[derive(Debug)]
pub struct OptimalPlan {
    /// The completed DP table (exact or rounded weights).
    pub table: DpTable,
    /// One summary tree per k in [1, K].
    pub summaries: Vec<SummaryTree>,
    /// The K x 2 entropy table, computed from true weights.
    pub entropies: Vec<(usize, f64)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct MergeKey {
    used: u32,
    pool_bits: u64,
    pool_nonempty: bool,
}

#[derive(Debug, Clone)]
struct MergeState {
    gain: f64,
    picks: Vec<u32>,
}

/// The DP engine proper. `unit = None` runs on the weights as given;
/// `unit = Some(delta)` rounds every own weight up to a multiple of `delta`
/// first (the approximate planner's transform).
#[derive(Debug)]
pub(crate) struct DpEngine<'a> {
    model: &'a TreeModel,
    budget: usize,
    own: Vec<f64>,
    sub: Vec<f64>,
    total: f64,
}

impl<'a> DpEngine<'a> {
    pub(crate) fn new(model: &'a TreeModel, budget: usize, unit: Option<f64>) -> Self {
        let n = model.len();
        let own: Vec<f64> = (0..n)
            .map(|pos| {
                let w = model.node(pos).weight;
                match unit {
                    Some(delta) if w > 0.0 => (w / delta).ceil() * delta,
                    _ => w,
                }
            })
            .collect();
        // Transformed subtree sums: children sort after parents, so one
        // reverse sweep accumulates them (same trick as TreeModel::build).
        let mut sub = own.clone();
        for pos in (1..n).rev() {
            if let Some(pp) = model.node(pos).parent_pos {
                sub[pp as usize] += sub[pos];
            }
        }
        let total = sub[model.root()];
        Self {
            model,
            budget,
            own,
            sub,
            total,
        }
    }

    /// Run the bottom-up DP over the whole tree.
    pub(crate) fn solve(&self) -> DpTable {
        debug!(
            nodes = self.model.len(),
            budget = self.budget,
            total = self.total,
            "running summary-tree dp"
        );
        let mut cells: Vec<Vec<Option<DpCell>>> = vec![Vec::new(); self.model.len()];
        for pos in self.model.post_order() {
            cells[pos] = self.solve_node(pos, &cells);
        }
        DpTable { cells }
    }

    fn solve_node(&self, pos: usize, cells: &[Vec<Option<DpCell>>]) -> Vec<Option<DpCell>> {
        let node = self.model.node(pos);
        let cap = (node.subtree_size as usize).min(self.budget);
        let mut row: Vec<Option<DpCell>> = vec![None; cap];
        row[0] = Some(DpCell {
            gain: 0.0,
            choice: None,
        });
        if node.is_leaf() || cap == 1 {
            return row;
        }

        let local_total = self.sub[pos];
        let mut states: HashMap<MergeKey, MergeState> = HashMap::new();
        states.insert(
            MergeKey {
                used: 0,
                pool_bits: 0f64.to_bits(),
                pool_nonempty: false,
            },
            MergeState {
                gain: 0.0,
                picks: Vec::new(),
            },
        );

        for child in self.model.children(pos) {
            let child_mass = self.sub[child];
            let expose_term = piece_term(child_mass, local_total, self.total);
            let child_row = &cells[child];
            let mut next: HashMap<MergeKey, MergeState> =
                HashMap::with_capacity(states.len() * 2);

            for (key, state) in &states {
                // Fold the child into the other pool.
                let pool = f64::from_bits(key.pool_bits) + child_mass;
                let mut picks = state.picks.clone();
                picks.push(0);
                upsert(
                    &mut next,
                    MergeKey {
                        used: key.used,
                        pool_bits: pool.to_bits(),
                        pool_nonempty: true,
                    },
                    MergeState {
                        gain: state.gain,
                        picks,
                    },
                );

                // Or expose it with each feasible sub-budget.
                for (idx, cell) in child_row.iter().enumerate() {
                    let b_c = (idx + 1) as u32;
                    if key.used + b_c > (cap - 1) as u32 {
                        break;
                    }
                    if let Some(cell) = cell {
                        let mut picks = state.picks.clone();
                        picks.push(b_c);
                        upsert(
                            &mut next,
                            MergeKey {
                                used: key.used + b_c,
                                pool_bits: key.pool_bits,
                                pool_nonempty: key.pool_nonempty,
                            },
                            MergeState {
                                gain: state.gain + cell.gain + expose_term,
                                picks,
                            },
                        );
                    }
                }
            }
            states = next;
        }

        // Finalize: add the node's own term and the pool term. The state
        // with nothing exposed and nothing hidden is the running seed, not a
        // valid split (every child must be accounted for).
        let own_term = piece_term(self.own[pos], local_total, self.total);
        for (key, state) in &states {
            if key.used == 0 && !key.pool_nonempty {
                continue;
            }
            let b = 1 + key.used as usize + usize::from(key.pool_nonempty);
            if b > cap {
                continue;
            }
            let pool_mass = f64::from_bits(key.pool_bits);
            let gain = state.gain + own_term + piece_term(pool_mass, local_total, self.total);
            let slot = &mut row[b - 1];
            let replace = match slot {
                None => true,
                Some(cur) => {
                    gain > cur.gain
                        || (gain == cur.gain
                            && cur
                                .choice
                                .as_deref()
                                .is_some_and(|cur_picks| state.picks.as_slice() > cur_picks))
                }
            };
            if replace {
                *slot = Some(DpCell {
                    gain,
                    choice: Some(state.picks.clone()),
                });
            }
        }
        row
    }
}

// Keep the better state per key. Ties resolve to the lexicographically
// greatest pick vector (expose rather than hide, favor earlier siblings), a
// total order that makes the outcome independent of map iteration order.
fn upsert(map: &mut HashMap<MergeKey, MergeState>, key: MergeKey, cand: MergeState) {
    match map.entry(key) {
        Entry::Vacant(slot) => {
            slot.insert(cand);
        }
        Entry::Occupied(mut slot) => {
            let cur = slot.get();
            if cand.gain > cur.gain || (cand.gain == cur.gain && cand.picks > cur.picks) {
                slot.insert(cand);
            }
        }
    }
}

/// Reconstruct, materialize, and score every k in [1, K] from one table.
pub(crate) fn materialize(
    model: &TreeModel,
    table: &DpTable,
    budget: usize,
) -> (Vec<SummaryTree>, Vec<(usize, f64)>) {
    let builder = SummaryTreeBuilder::new(model);
    let total = model.total_weight();
    let mut summaries = Vec::with_capacity(budget);
    let mut entropies = Vec::with_capacity(budget);
    for k in 1..=budget {
        let tree = builder.build(&table.reconstruct(model, k));
        entropies.push((k, tree.entropy(total)));
        summaries.push(tree);
    }
    (summaries, entropies)
}
