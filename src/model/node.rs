//! Arena node records
//!
//! Nodes live in a contiguous array sorted by (depth, parent id, id), so the
//! children of every node occupy one contiguous position range. Parent and
//! child references are positions into that array, fixed at build time.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One validated tree node in arena order.
#[derive(Debug, Clone)]
pub struct Node {
    /// Caller-supplied unique positive id.
    pub id: u64,
    /// Parent id (the root carries the sentinel, see [`crate::model::ROOT_SENTINEL`]).
    pub parent: u64,
    /// Own (non-negative) weight.
    pub weight: f64,
    /// Opaque caller-supplied label.
    pub label: String,
    /// Distance from the root (root = 0).
    pub depth: u32,
    /// Own weight plus the subtree weights of all children.
    pub subtree_weight: f64,
    /// Number of nodes in this subtree, including the node itself.
    pub subtree_size: u32,
    /// Arena position of the parent (`None` for the root).
    pub parent_pos: Option<u32>,
    /// First and last child position (inclusive), `None` for leaves.
    pub children: Option<(u32, u32)>,
}

impl Node {
    /// Whether the node has no children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Number of direct children.
    #[inline]
    pub fn child_count(&self) -> usize {
        match self.children {
            Some((first, last)) => (last - first + 1) as usize,
            None => 0,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} ({}): {}", self.id, self.label, self.weight)
    }
}

/// Compact per-position record exported for downstream consumers.
///
/// Valid only because the arena is depth/parent sorted: the children of each
/// node form one contiguous run of positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CompactNode {
    /// Parent id (sentinel for the root).
    pub parent: u64,
    /// Position of the first child, if any.
    pub first_child: Option<u32>,
    /// Position of the last child, if any.
    pub last_child: Option<u32>,
}
