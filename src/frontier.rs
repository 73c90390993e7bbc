//! Frontier state and expansions
//!
//! A frontier is the current set of exposed pieces representing the tree at
//! some budget. It is modeled as a replayable value type: planners log
//! [`Expansion`]s and rebuild the frontier for any prefix instead of mutating
//! one shared structure, which keeps per-k reconstruction trivial.

use crate::model::TreeModel;

/// One exposed element of a partial summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    /// A single original node shown with its own weight (a leaf, or an
    /// internal node whose children are displayed separately).
    Single(usize),
    /// A node retained with its entire subtree mass folded in.
    Whole(usize),
    /// Synthetic aggregator of unexposed sibling subtrees under one parent.
    Other {
        /// Arena position of the common parent.
        parent: usize,
        /// Aggregated child positions, in arena order.
        members: Vec<usize>,
    },
}

impl Piece {
    /// Displayed mass of the piece.
    pub fn weight(&self, model: &TreeModel) -> f64 {
        match self {
            Piece::Single(pos) => model.node(*pos).weight,
            Piece::Whole(pos) => model.node(*pos).subtree_weight,
            Piece::Other { members, .. } => members
                .iter()
                .map(|&m| model.node(m).subtree_weight)
                .sum(),
        }
    }
}

/// A single frontier refinement. Every expansion grows the frontier by
/// exactly one piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expansion {
    /// Split a `Whole` internal piece into the node itself plus its only
    /// child (single-child nodes) or an aggregator of all its children.
    Open(usize),
    /// Move one child out of its parent's other pool. When exactly one
    /// member would remain the pool dissolves and that member is exposed
    /// whole as well.
    Expose {
        /// Parent whose pool shrinks.
        parent: usize,
        /// Child to expose.
        child: usize,
    },
}

/// Split bookkeeping for one opened node.
#[derive(Debug, Clone, Default)]
pub struct SplitState {
    /// Exposed child positions, kept sorted (arena order).
    pub exposed: Vec<usize>,
    /// Children still aggregated in the other pool, kept sorted.
    pub hidden: Vec<usize>,
}

/// Frontier of a partial summary, rebuilt by applying expansions in order.
#[derive(Debug, Clone, Default)]
pub struct FrontierState {
    // Opened nodes only; any exposed position without an entry is `Whole`.
    splits: std::collections::HashMap<usize, SplitState>,
    pieces: usize,
}

impl FrontierState {
    /// Frontier of the 1-node summary: the root retained whole.
    pub fn new() -> Self {
        Self {
            splits: std::collections::HashMap::new(),
            pieces: 1,
        }
    }

    /// Current number of pieces.
    pub fn len(&self) -> usize {
        self.pieces
    }

    /// True only before any expansion is applied.
    pub fn is_empty(&self) -> bool {
        self.splits.is_empty()
    }

    /// Split bookkeeping for an opened node.
    pub fn split(&self, pos: usize) -> Option<&SplitState> {
        self.splits.get(&pos)
    }

    /// Apply one expansion; grows the frontier by exactly one piece.
    pub fn apply(&mut self, model: &TreeModel, expansion: Expansion) {
        match expansion {
            Expansion::Open(pos) => {
                debug_assert!(!self.splits.contains_key(&pos), "node already open");
                let children: Vec<usize> = model.children(pos).collect();
                debug_assert!(!children.is_empty(), "cannot open a leaf");
                let state = if children.len() == 1 {
                    SplitState {
                        exposed: children,
                        hidden: Vec::new(),
                    }
                } else {
                    SplitState {
                        exposed: Vec::new(),
                        hidden: children,
                    }
                };
                self.splits.insert(pos, state);
            }
            Expansion::Expose { parent, child } => {
                let state = self
                    .splits
                    .get_mut(&parent)
                    .unwrap_or_else(|| panic!("expose on unopened node {parent}"));
                debug_assert!(state.hidden.len() >= 2, "pool too small to expose from");
                let idx = state
                    .hidden
                    .binary_search(&child)
                    .unwrap_or_else(|_| panic!("child {child} not in pool"));
                state.hidden.remove(idx);
                let at = match state.exposed.binary_search(&child) {
                    Ok(i) | Err(i) => i,
                };
                state.exposed.insert(at, child);
                // Never leave a one-member aggregator behind.
                if state.hidden.len() == 1 {
                    let last = state.hidden.pop().unwrap_or_default();
                    let at = match state.exposed.binary_search(&last) {
                        Ok(i) | Err(i) => i,
                    };
                    state.exposed.insert(at, last);
                }
            }
        }
        self.pieces += 1;
    }

    /// Materialize the frontier as pieces in DFS order: each opened node
    /// first, exposed child subtrees in arena order, the other aggregator
    /// after them.
    pub fn pieces(&self, model: &TreeModel) -> Vec<Piece> {
        enum Work {
            Node(usize),
            Other(usize),
        }
        let mut out = Vec::with_capacity(self.pieces);
        let mut stack = vec![Work::Node(model.root())];
        while let Some(work) = stack.pop() {
            match work {
                Work::Node(pos) => match self.splits.get(&pos) {
                    None => out.push(Piece::Whole(pos)),
                    Some(state) => {
                        out.push(Piece::Single(pos));
                        if !state.hidden.is_empty() {
                            stack.push(Work::Other(pos));
                        }
                        for &child in state.exposed.iter().rev() {
                            stack.push(Work::Node(child));
                        }
                    }
                },
                Work::Other(pos) => {
                    // Entry exists: only opened nodes enqueue this work item.
                    if let Some(state) = self.splits.get(&pos) {
                        out.push(Piece::Other {
                            parent: pos,
                            members: state.hidden.clone(),
                        });
                    }
                }
            }
        }
        debug_assert_eq!(out.len(), self.pieces);
        out
    }
}
