//! Greedy heuristic planner
//!
//! Best-first expansion of the frontier: a max-heap holds, per frontier
//! node, the single best available expansion, keyed by its marginal entropy
//! gain. Entries go stale when a node's pool changes and are skipped via a
//! generation counter rather than removed. Each applied expansion grows the
//! frontier by exactly one piece, so the k-piece summary is the replay of
//! the first k - 1 logged expansions.
//!
//! Not globally optimal: a low-gain expansion can unlock a much larger gain
//! below it, and the myopic order may starve that subtree of budget. This is
//! the accepted trade-off for near-linear planning.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use tracing::{debug, trace};

use crate::builder::{SummaryTree, SummaryTreeBuilder};
use crate::entropy::piece_term;
use crate::frontier::{Expansion, FrontierState};
use crate::model::TreeModel;

/// Result of a greedy planner run.
#[derive(Debug)]
pub struct GreedyPlan {
    /// The applied expansions, in order (replay the first k - 1 for any k).
    pub expansions: Vec<Expansion>,
    /// One summary tree per k in [1, K].
    pub summaries: Vec<SummaryTree>,
    /// The K x 2 entropy table, computed from true weights.
    pub entropies: Vec<(usize, f64)>,
}

// Heap entry. Ordering: higher gain first, then the lower newly-exposed node
// id, then Open before Expose. f64::total_cmp keeps the order total.
#[derive(Debug)]
struct Candidate {
    gain: f64,
    exposed_id: u64,
    op: Expansion,
    generation: u64,
}

impl Candidate {
    fn is_open(&self) -> bool {
        matches!(self.op, Expansion::Open(_))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.gain
            .total_cmp(&other.gain)
            .then_with(|| other.exposed_id.cmp(&self.exposed_id))
            .then_with(|| self.is_open().cmp(&other.is_open()))
    }
}

/// Best-first heuristic planner.
#[derive(Debug)]
pub struct GreedyPlanner<'a> {
    model: &'a TreeModel,
}

impl<'a> GreedyPlanner<'a> {
    /// Planner over a validated model.
    pub fn new(model: &'a TreeModel) -> Self {
        Self { model }
    }

    /// Run K - 1 best-first expansions and materialize every prefix.
    pub fn plan(&self, budget: usize) -> GreedyPlan {
        debug!(nodes = self.model.len(), budget, "running greedy planner");
        let model = self.model;
        let mut state = FrontierState::new();
        let mut log: Vec<Expansion> = Vec::with_capacity(budget.saturating_sub(1));
        let mut heap: BinaryHeap<Candidate> = BinaryHeap::new();
        // Pool generation per opened node; stale Expose entries are skipped.
        let mut generation: HashMap<usize, u64> = HashMap::new();

        if !model.node(model.root()).is_leaf() {
            heap.push(self.open_candidate(model.root()));
        }

        while log.len() + 1 < budget {
            let cand = match heap.pop() {
                Some(cand) => cand,
                // K <= n guarantees an expansion exists for every step.
                None => break,
            };
            if let Expansion::Expose { parent, .. } = cand.op {
                if generation.get(&parent).copied().unwrap_or(0) != cand.generation {
                    continue;
                }
            }

            // Pool members exposed by this step (the pool dissolves at two).
            let newly: Vec<usize> = match cand.op {
                Expansion::Open(pos) => {
                    if model.node(pos).child_count() == 1 {
                        model.children(pos).collect()
                    } else {
                        Vec::new()
                    }
                }
                Expansion::Expose { parent, child } => match state.split(parent) {
                    Some(split) if split.hidden.len() == 2 => split.hidden.clone(),
                    _ => vec![child],
                },
            };

            trace!(gain = cand.gain, op = ?cand.op, "applying expansion");
            state.apply(model, cand.op);
            log.push(cand.op);

            for &exposed in &newly {
                if !model.node(exposed).is_leaf() {
                    heap.push(self.open_candidate(exposed));
                }
            }
            match cand.op {
                Expansion::Open(pos) => {
                    let gen = generation.entry(pos).or_insert(0);
                    if let Some(cand) = self.expose_candidate(&state, pos, *gen) {
                        heap.push(cand);
                    }
                }
                Expansion::Expose { parent, .. } => {
                    let gen = generation.entry(parent).or_insert(0);
                    *gen += 1;
                    if let Some(cand) = self.expose_candidate(&state, parent, *gen) {
                        heap.push(cand);
                    }
                }
            }
        }

        let (summaries, entropies) = self.materialize(&log, budget);
        GreedyPlan {
            expansions: log,
            summaries,
            entropies,
        }
    }

    // Gain of splitting a whole subtree into the node plus the rest.
    fn open_candidate(&self, pos: usize) -> Candidate {
        let node = self.model.node(pos);
        let total = self.model.total_weight();
        let local = node.subtree_weight;
        let gain = piece_term(node.weight, local, total)
            + piece_term(local - node.weight, local, total);
        Candidate {
            gain,
            exposed_id: node.id,
            op: Expansion::Open(pos),
            generation: 0,
        }
    }

    // Best single exposure out of `parent`'s pool, if the pool can shrink.
    fn expose_candidate(
        &self,
        state: &FrontierState,
        parent: usize,
        generation: u64,
    ) -> Option<Candidate> {
        let split = state.split(parent)?;
        let hidden = &split.hidden;
        if hidden.len() < 2 {
            return None;
        }
        let total = self.model.total_weight();
        let pool: f64 = hidden
            .iter()
            .map(|&h| self.model.node(h).subtree_weight)
            .sum();

        let (gain, child) = if hidden.len() == 2 {
            // Either choice dissolves the pool into the same two pieces.
            let first = self.model.node(hidden[0]).subtree_weight;
            let second = self.model.node(hidden[1]).subtree_weight;
            let gain = piece_term(first, pool, total) + piece_term(second, pool, total);
            (gain, hidden[0])
        } else {
            let mut best: Option<(f64, usize)> = None;
            for &c in hidden {
                let mass = self.model.node(c).subtree_weight;
                let gain =
                    piece_term(mass, pool, total) + piece_term(pool - mass, pool, total);
                // Strict improvement only: arena order already puts the
                // lowest sibling id first.
                if best.map_or(true, |(bg, _)| gain > bg) {
                    best = Some((gain, c));
                }
            }
            best?
        };

        Some(Candidate {
            gain,
            exposed_id: self.model.node(child).id,
            op: Expansion::Expose { parent, child },
            generation,
        })
    }

    fn materialize(
        &self,
        log: &[Expansion],
        budget: usize,
    ) -> (Vec<SummaryTree>, Vec<(usize, f64)>) {
        let builder = SummaryTreeBuilder::new(self.model);
        let total = self.model.total_weight();
        let mut summaries = Vec::with_capacity(budget);
        let mut entropies = Vec::with_capacity(budget);
        for k in 1..=budget {
            let mut state = FrontierState::new();
            for op in &log[..(k - 1).min(log.len())] {
                state.apply(self.model, *op);
            }
            let tree = builder.build(&state.pieces(self.model));
            entropies.push((k, tree.entropy(total)));
            summaries.push(tree);
        }
        (summaries, entropies)
    }
}
