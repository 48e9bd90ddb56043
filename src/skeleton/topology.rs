//! Structural queries over internode arrays.
//!
//! The skeleton is an arena: index 0 is the root, every other node hangs off
//! exactly one parent as either its medial child (same axis) or its lateral
//! child (new axis).

use crate::error::TopologyError;

use super::internode::{Internode, InternodeIndex};

/// Check the parent/child invariants of an internode array.
///
/// An empty array is trivially valid.
pub fn validate_internode_relationships(internodes: &[Internode]) -> Result<(), TopologyError> {
    let n = internodes.len();
    if n == 0 {
        return Ok(());
    }
    if let Some(p) = internodes[0].parent {
        return Err(TopologyError::RootHasParent(p));
    }

    let mut referenced_by: Vec<Option<usize>> = vec![None; n];
    for (i, inode) in internodes.iter().enumerate() {
        if inode.medial_child.is_some() && inode.medial_child == inode.lateral_child {
            return Err(TopologyError::MedialAndLateral(inode.medial_child.unwrap_or(i)));
        }
        for child in inode.children() {
            if child >= n {
                return Err(TopologyError::IndexOutOfRange { node: i, index: child });
            }
            if internodes[child].parent != Some(i) {
                return Err(TopologyError::NotAChildOfParent { child, parent: i });
            }
            if let Some(first) = referenced_by[child] {
                return Err(TopologyError::MultipleParents {
                    child,
                    first,
                    second: i,
                });
            }
            referenced_by[child] = Some(i);
        }
    }

    for (i, inode) in internodes.iter().enumerate().skip(1) {
        let parent = inode.parent.ok_or(TopologyError::ExtraRoot(i))?;
        if parent >= n {
            return Err(TopologyError::IndexOutOfRange { node: i, index: parent });
        }
        if referenced_by[i] != Some(parent) {
            return Err(TopologyError::NotAChildOfParent { child: i, parent });
        }
    }

    let mut visited = vec![false; n];
    for i in preorder(internodes) {
        visited[i] = true;
    }
    match visited.iter().position(|v| !v) {
        Some(i) => Err(TopologyError::Unreachable(i)),
        None => Ok(()),
    }
}

/// Assert topology in debug builds; compiled out in release.
#[inline]
pub fn debug_validate(internodes: &[Internode]) {
    if cfg!(debug_assertions) {
        if let Err(e) = validate_internode_relationships(internodes) {
            panic!("internode topology violated: {e}");
        }
    }
}

/// An axis root is the global root or a lateral child.
pub fn is_axis_root(internodes: &[Internode], index: InternodeIndex) -> bool {
    match internodes[index].parent {
        None => true,
        Some(p) => internodes[p].lateral_child == Some(index),
    }
}

/// Follow medial children from `index` to the end of its axis.
pub fn axis_tip(internodes: &[Internode], mut index: InternodeIndex) -> InternodeIndex {
    while let Some(next) = internodes[index].medial_child {
        index = next;
    }
    index
}

/// All axis roots, in storage order.
pub fn axis_roots(internodes: &[Internode]) -> Vec<InternodeIndex> {
    (0..internodes.len())
        .filter(|&i| is_axis_root(internodes, i))
        .collect()
}

/// Number of internodes along the longest root-to-leaf path.
pub fn max_axis_depth(internodes: &[Internode]) -> usize {
    if internodes.is_empty() {
        return 0;
    }
    let mut depth = vec![0usize; internodes.len()];
    let mut max_depth = 0;
    for i in preorder(internodes) {
        depth[i] = internodes[i].parent.map_or(1, |p| depth[p] + 1);
        max_depth = max_depth.max(depth[i]);
    }
    max_depth
}

/// Recompute branch orders: medial children inherit, lateral children add one.
pub fn assign_gravelius_orders(internodes: &mut [Internode]) {
    if internodes.is_empty() {
        return;
    }
    internodes[0].gravelius_order = 0;
    for i in preorder(internodes).collect::<Vec<_>>() {
        let order = internodes[i].gravelius_order;
        if let Some(m) = internodes[i].medial_child {
            internodes[m].gravelius_order = order;
        }
        if let Some(l) = internodes[i].lateral_child {
            internodes[l].gravelius_order = order + 1;
        }
    }
}

/// Re-derive every `render_position` from the root, following each parent's
/// animated tip.
pub fn update_render_positions(internodes: &mut [Internode]) {
    if internodes.is_empty() {
        return;
    }
    internodes[0].render_position = internodes[0].position;
    let mut stack = vec![0];
    while let Some(i) = stack.pop() {
        let tip = internodes[i].render_tip();
        for child in internodes[i].children() {
            internodes[child].render_position = tip;
            stack.push(child);
        }
    }
}

/// Indices in pre-order (parent first, medial subtree before lateral subtree).
pub fn preorder(internodes: &[Internode]) -> PreorderIter<'_> {
    PreorderIter {
        internodes,
        stack: if internodes.is_empty() { Vec::new() } else { vec![0] },
    }
}

/// Indices in post-order (children before parents).
pub fn postorder(internodes: &[Internode]) -> Vec<InternodeIndex> {
    let mut order: Vec<_> = preorder(internodes).collect();
    // Reversed pre-order puts every descendant before its ancestor.
    order.reverse();
    order
}

pub struct PreorderIter<'a> {
    internodes: &'a [Internode],
    stack: Vec<InternodeIndex>,
}

impl Iterator for PreorderIter<'_> {
    type Item = InternodeIndex;

    fn next(&mut self) -> Option<Self::Item> {
        let i = self.stack.pop()?;
        let inode = &self.internodes[i];
        if let Some(l) = inode.lateral_child {
            self.stack.push(l);
        }
        if let Some(m) = inode.medial_child {
            self.stack.push(m);
        }
        Some(i)
    }
}
