//! Summary tree materialization
//!
//! Turns a planner's chosen pieces into the exported record schema. Row
//! order is the DFS order the pieces arrive in (root first), so every row's
//! parent row already exists when the row is emitted.

use std::collections::HashMap;

use crate::entropy::distribution_entropy;
use crate::frontier::Piece;
use crate::model::TreeModel;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Kind of an exported summary piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PieceKind {
    /// One original node displayed with its own weight.
    Singleton = 1,
    /// An internal node retained whole, descendants folded in.
    Subtree = 2,
    /// Aggregator of unexposed sibling subtrees.
    Other = 3,
}

impl PieceKind {
    /// Numeric code used by the exported record schema (1, 2, 3).
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// One exported summary tree row.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SummaryRow {
    /// Original node id, `None` for synthetic aggregators.
    pub node: Option<u64>,
    /// Index of the parent row within the same summary (`None` for the root).
    pub parent: Option<usize>,
    /// Displayed mass of the piece.
    pub weight: f64,
    /// Piece kind.
    pub kind: PieceKind,
    /// Display label (synthesized for aggregators).
    pub label: String,
}

/// A k-piece summary of the input tree, weight-conserving by construction.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SummaryTree {
    rows: Vec<SummaryRow>,
}

impl SummaryTree {
    /// Exported rows, root first.
    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    /// Number of pieces (the k this summary was built for).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// A summary always has at least the root piece.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of displayed weights; equals the input's total mass within
    /// floating tolerance.
    pub fn total_weight(&self) -> f64 {
        self.rows.iter().map(|r| r.weight).sum()
    }

    /// Shannon entropy (nats) of the displayed weight distribution,
    /// normalized by `total`.
    pub fn entropy(&self, total: f64) -> f64 {
        distribution_entropy(total, self.rows.iter().map(|r| r.weight))
    }
}

/// Materializes planner allocations into [`SummaryTree`] records.
#[derive(Debug)]
pub struct SummaryTreeBuilder<'a> {
    model: &'a TreeModel,
}

impl<'a> SummaryTreeBuilder<'a> {
    /// Builder over a validated model.
    pub fn new(model: &'a TreeModel) -> Self {
        Self { model }
    }

    /// Build the record set for one allocation.
    ///
    /// `pieces` must arrive in DFS order with every opened ancestor emitted
    /// as [`Piece::Single`] before its descendants, which both planners
    /// guarantee.
    pub fn build(&self, pieces: &[Piece]) -> SummaryTree {
        let mut rows = Vec::with_capacity(pieces.len());
        // Row index of each opened (Single) node, for parent resolution.
        let mut single_row: HashMap<usize, usize> = HashMap::new();

        for piece in pieces {
            let row = match piece {
                Piece::Single(pos) => {
                    let node = self.model.node(*pos);
                    single_row.insert(*pos, rows.len());
                    SummaryRow {
                        node: Some(node.id),
                        parent: self.parent_row(*pos, &single_row),
                        weight: node.weight,
                        kind: PieceKind::Singleton,
                        label: node.label.clone(),
                    }
                }
                Piece::Whole(pos) => {
                    let node = self.model.node(*pos);
                    SummaryRow {
                        node: Some(node.id),
                        parent: self.parent_row(*pos, &single_row),
                        weight: node.subtree_weight,
                        kind: if node.is_leaf() {
                            PieceKind::Singleton
                        } else {
                            PieceKind::Subtree
                        },
                        label: node.label.clone(),
                    }
                }
                Piece::Other { parent, members } => SummaryRow {
                    node: None,
                    parent: single_row.get(parent).copied(),
                    weight: piece.weight(self.model),
                    kind: PieceKind::Other,
                    label: format!("{} others", members.len()),
                },
            };
            rows.push(row);
        }

        debug_assert!(
            (rows.iter().map(|r| r.weight).sum::<f64>() - self.model.total_weight()).abs()
                <= 1e-6 * self.model.total_weight().max(1.0),
            "summary rows must conserve total mass"
        );
        SummaryTree { rows }
    }

    fn parent_row(&self, pos: usize, single_row: &HashMap<usize, usize>) -> Option<usize> {
        // If `pos` itself is opened it maps to its own row; its parent piece
        // is the nearest opened ancestor, which is exactly its tree parent.
        let parent_pos = self.model.node(pos).parent_pos?;
        single_row.get(&(parent_pos as usize)).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontier::{Expansion, FrontierState};

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    // root 1 with children 2 (leaf), 3 (two leaf children 4, 5)
    fn model() -> TreeModel {
        TreeModel::build(
            &[1, 2, 3, 4, 5],
            &[0, 1, 1, 3, 3],
            &[1.0, 4.0, 1.0, 8.0, 8.0],
            &labels(&["root", "x", "y", "y1", "y2"]),
        )
        .unwrap()
    }

    #[test]
    fn kinds_and_labels_are_derived() {
        let m = model();
        let c3 = m.position_of(3).unwrap();
        let mut state = FrontierState::new();
        state.apply(&m, Expansion::Open(0));
        state.apply(
            &m,
            Expansion::Expose {
                parent: 0,
                child: c3,
            },
        );
        // Frontier: root(single) + 2(whole leaf) + 3(whole subtree)... after
        // the two-member pool {2, 3} dissolves.
        let tree = SummaryTreeBuilder::new(&m).build(&state.pieces(&m));
        assert_eq!(tree.len(), 3);
        let rows = tree.rows();
        assert_eq!(rows[0].kind, PieceKind::Singleton);
        assert_eq!(rows[0].parent, None);
        assert_eq!(rows[1].node, Some(2));
        assert_eq!(rows[1].kind, PieceKind::Singleton); // leaf kept whole
        assert_eq!(rows[1].parent, Some(0));
        assert_eq!(rows[2].node, Some(3));
        assert_eq!(rows[2].kind, PieceKind::Subtree);
        assert!((rows[2].weight - 17.0).abs() < 1e-12);
    }

    #[test]
    fn aggregator_rows_synthesize_labels() {
        let m = model();
        let mut state = FrontierState::new();
        state.apply(&m, Expansion::Open(0));
        let tree = SummaryTreeBuilder::new(&m).build(&state.pieces(&m));
        let rows = tree.rows();
        assert_eq!(rows[1].node, None);
        assert_eq!(rows[1].kind, PieceKind::Other);
        assert_eq!(rows[1].label, "2 others");
        assert_eq!(rows[1].parent, Some(0));
        assert!((tree.total_weight() - m.total_weight()).abs() < 1e-12);
    }

    #[test]
    fn kind_codes_match_export_schema() {
        assert_eq!(PieceKind::Singleton.code(), 1);
        assert_eq!(PieceKind::Subtree.code(), 2);
        assert_eq!(PieceKind::Other.code(), 3);
    }
}
