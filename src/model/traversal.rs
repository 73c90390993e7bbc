//! Explicit-stack post-order traversal
//!
//! Input trees can be tens of thousands of levels deep (genealogies,
//! filesystem dumps), so nothing in this crate recurses on tree height. The
//! iterator below visits every position children-first using its own stack.

use super::TreeModel;

/// Post-order iterator over arena positions.
///
/// Children are visited in arena order before their parent; the root is
/// yielded last. Stack depth is bounded by the tree height but lives on the
/// heap.
#[derive(Debug)]
pub struct PostOrder<'a> {
    model: &'a TreeModel,
    // (position, children already pushed)
    stack: Vec<(u32, bool)>,
}

impl<'a> PostOrder<'a> {
    /// Create a traversal rooted at `root` (usually `model.root()`).
    pub fn new(model: &'a TreeModel, root: usize) -> Self {
        Self {
            model,
            stack: vec![(root as u32, false)],
        }
    }
}

impl<'a> Iterator for PostOrder<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while let Some((pos, expanded)) = self.stack.pop() {
            if expanded {
                return Some(pos as usize);
            }
            self.stack.push((pos, true));
            if let Some((first, last)) = self.model.node(pos as usize).children {
                // Push in reverse so the first child is processed first.
                for child in (first..=last).rev() {
                    self.stack.push((child, false));
                }
            }
        }
        None
    }
}
