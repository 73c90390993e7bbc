//! Validated, immutable tree model
//!
//! All input validation happens here, once. Planners receive a [`TreeModel`]
//! and never re-check ids, weights, or connectivity. Nodes are stored in a
//! contiguous arena sorted by (depth, parent id, id); the permutation applied
//! by that sort is recorded so callers can reconcile results with their
//! original row order.

mod node;
mod traversal;

pub use node::{CompactNode, Node};
pub use traversal::PostOrder;

use std::collections::HashMap;

use crate::SummaryError;

/// Reserved parent id marking the single root. Node ids must differ from it.
pub const ROOT_SENTINEL: u64 = 0;

/// Immutable arena representation of a validated weighted rooted tree.
#[derive(Debug, Clone)]
pub struct TreeModel {
    nodes: Vec<Node>,
    // order[new_pos] = index into the caller's input arrays
    order: Vec<u32>,
    id_to_pos: HashMap<u64, u32>,
}

impl TreeModel {
    /// Validate and build a model from parallel input arrays.
    ///
    /// Fails fast with the specific [`SummaryError`] variant on the first
    /// violated invariant; no partial model is ever returned.
    pub fn build(
        ids: &[u64],
        parents: &[u64],
        weights: &[f64],
        labels: &[String],
    ) -> Result<Self, SummaryError> {
        let n = ids.len();
        if parents.len() != n || weights.len() != n || labels.len() != n {
            return Err(SummaryError::LengthMismatch {
                ids: n,
                parents: parents.len(),
                weights: weights.len(),
                labels: labels.len(),
            });
        }
        if n == 0 {
            return Err(SummaryError::EmptyTree);
        }

        let mut input_index: HashMap<u64, u32> = HashMap::with_capacity(n);
        for (i, &id) in ids.iter().enumerate() {
            if id == ROOT_SENTINEL {
                return Err(SummaryError::InvalidNodeId(id));
            }
            if input_index.insert(id, i as u32).is_some() {
                return Err(SummaryError::DuplicateNode(id));
            }
        }
        for (i, &w) in weights.iter().enumerate() {
            if !w.is_finite() || w < 0.0 {
                return Err(SummaryError::InvalidWeight {
                    node: ids[i],
                    weight: w,
                });
            }
        }

        let mut root_input = None;
        let mut roots = 0usize;
        for (i, &p) in parents.iter().enumerate() {
            if p == ROOT_SENTINEL {
                roots += 1;
                root_input = Some(i as u32);
            } else if !input_index.contains_key(&p) {
                return Err(SummaryError::DanglingReference {
                    node: ids[i],
                    parent: p,
                });
            }
        }
        let root_input = match (roots, root_input) {
            (1, Some(r)) => r,
            _ => return Err(SummaryError::MalformedTree { roots }),
        };

        // Adjacency over input indices, then iterative BFS for depths.
        let mut first_edge = vec![u32::MAX; n];
        let mut next_edge = vec![u32::MAX; n];
        for (i, &p) in parents.iter().enumerate() {
            if p == ROOT_SENTINEL {
                continue;
            }
            let pi = input_index[&p] as usize;
            next_edge[i] = first_edge[pi];
            first_edge[pi] = i as u32;
        }

        let mut depth = vec![u32::MAX; n];
        let mut queue = std::collections::VecDeque::with_capacity(n);
        depth[root_input as usize] = 0;
        queue.push_back(root_input);
        let mut reached = 0usize;
        while let Some(i) = queue.pop_front() {
            reached += 1;
            let mut e = first_edge[i as usize];
            while e != u32::MAX {
                depth[e as usize] = depth[i as usize] + 1;
                queue.push_back(e);
                e = next_edge[e as usize];
            }
        }
        if reached != n {
            // Every parent id resolves, so unreached nodes sit on a cycle.
            let culprit = (0..n)
                .filter(|&i| depth[i] == u32::MAX)
                .map(|i| ids[i])
                .min()
                .unwrap_or(ROOT_SENTINEL);
            return Err(SummaryError::CycleDetected(culprit));
        }

        // Level/parent sort; the id tie-break keeps child order deterministic.
        let mut order: Vec<u32> = (0..n as u32).collect();
        order.sort_by_key(|&i| (depth[i as usize], parents[i as usize], ids[i as usize]));

        let mut pos_of_input = vec![0u32; n];
        for (pos, &i) in order.iter().enumerate() {
            pos_of_input[i as usize] = pos as u32;
        }

        let mut nodes: Vec<Node> = order
            .iter()
            .map(|&i| {
                let i = i as usize;
                let parent_pos = if parents[i] == ROOT_SENTINEL {
                    None
                } else {
                    Some(pos_of_input[input_index[&parents[i]] as usize])
                };
                Node {
                    id: ids[i],
                    parent: parents[i],
                    weight: weights[i],
                    label: labels[i].clone(),
                    depth: depth[i],
                    subtree_weight: weights[i],
                    subtree_size: 1,
                    parent_pos,
                    children: None,
                }
            })
            .collect();

        // Children are contiguous after the sort; record each run.
        for pos in 1..n {
            if let Some(pp) = nodes[pos].parent_pos {
                let pp = pp as usize;
                match nodes[pp].children {
                    None => nodes[pp].children = Some((pos as u32, pos as u32)),
                    Some((first, _)) => nodes[pp].children = Some((first, pos as u32)),
                }
            }
        }

        // Children sort after parents, so one reverse sweep accumulates
        // subtree weights and sizes without recursion.
        for pos in (1..n).rev() {
            if let Some(pp) = nodes[pos].parent_pos {
                let (w, s) = (nodes[pos].subtree_weight, nodes[pos].subtree_size);
                let parent = &mut nodes[pp as usize];
                parent.subtree_weight += w;
                parent.subtree_size += s;
            }
        }

        let id_to_pos = nodes
            .iter()
            .enumerate()
            .map(|(pos, node)| (node.id, pos as u32))
            .collect();

        Ok(Self {
            nodes,
            order,
            id_to_pos,
        })
    }

    /// Number of nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A valid model is never empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Arena position of the root (always 0: the root alone has depth 0).
    #[inline]
    pub fn root(&self) -> usize {
        0
    }

    /// Node record at an arena position.
    #[inline]
    pub fn node(&self, pos: usize) -> &Node {
        &self.nodes[pos]
    }

    /// Total mass W = subtree weight of the root.
    #[inline]
    pub fn total_weight(&self) -> f64 {
        self.nodes[0].subtree_weight
    }

    /// Child positions of `pos`, in arena order.
    pub fn children(&self, pos: usize) -> impl Iterator<Item = usize> + '_ {
        let range = match self.nodes[pos].children {
            Some((first, last)) => first..=last,
            // Empty range; 1..=0 yields nothing.
            None => 1..=0,
        };
        range.map(|c| c as usize)
    }

    /// Arena position of a node id, if present.
    pub fn position_of(&self, id: u64) -> Option<usize> {
        self.id_to_pos.get(&id).map(|&p| p as usize)
    }

    /// Permutation applied by the depth/parent sort:
    /// `permutation()[new_pos]` = index into the caller's input arrays.
    pub fn permutation(&self) -> &[u32] {
        &self.order
    }

    /// Post-order traversal from the root (children before parents).
    pub fn post_order(&self) -> PostOrder<'_> {
        PostOrder::new(self, self.root())
    }

    /// Reordered node ids.
    pub fn ids(&self) -> Vec<u64> {
        self.nodes.iter().map(|node| node.id).collect()
    }

    /// Reordered parent ids (sentinel for the root).
    pub fn parents(&self) -> Vec<u64> {
        self.nodes.iter().map(|node| node.parent).collect()
    }

    /// Reordered own weights.
    pub fn weights(&self) -> Vec<f64> {
        self.nodes.iter().map(|node| node.weight).collect()
    }

    /// Reordered labels.
    pub fn labels(&self) -> Vec<String> {
        self.nodes.iter().map(|node| node.label.clone()).collect()
    }

    /// Compact per-position records (parent id + child range).
    pub fn compact(&self) -> Vec<CompactNode> {
        self.nodes
            .iter()
            .map(|node| CompactNode {
                parent: node.parent,
                first_child: node.children.map(|(first, _)| first),
                last_child: node.children.map(|(_, last)| last),
            })
            .collect()
    }
}
