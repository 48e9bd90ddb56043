//! Compaction of an internode array under an accept/reject mask.

use crate::skeleton::{debug_validate, Internode, InternodeIndex};

/// A reindexed internode array and the source index of each entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrunedInternodes {
    pub internodes: Vec<Internode>,
    pub dst_to_src: Vec<InternodeIndex>,
}

impl PrunedInternodes {
    pub fn len(&self) -> usize {
        self.internodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.internodes.is_empty()
    }

    /// Remap a per-internode side array from source to destination order.
    pub fn remap<T: Clone>(&self, side: &[T]) -> Vec<T> {
        self.dst_to_src.iter().map(|&s| side[s].clone()).collect()
    }
}

/// Keep accepted internodes, cutting each axis at its first rejected node.
///
/// Everything past a rejected node is dropped with it, including lateral
/// axes hanging off the dropped part. A rejected root empties the tree. Bud
/// indices are copied unchanged; [`TreeNodeStore::apply_pruned`] rebuilds
/// them.
///
/// [`TreeNodeStore::apply_pruned`]: crate::skeleton::TreeNodeStore::apply_pruned
pub fn prune_rejected_axes(src: &[Internode], accepted: &[bool]) -> PrunedInternodes {
    let mut out = PrunedInternodes::default();
    let is_accepted = |i: InternodeIndex| accepted.get(i).copied().unwrap_or(false);
    if src.is_empty() || !is_accepted(0) {
        return out;
    }

    // (axis root in src, parent in dst)
    let mut stack: Vec<(InternodeIndex, Option<InternodeIndex>)> = vec![(0, None)];
    while let Some((axis_root, dst_parent)) = stack.pop() {
        let mut prev = dst_parent;
        let mut lateral = dst_parent.is_some();
        let mut node = Some(axis_root);

        while let Some(s) = node {
            if !is_accepted(s) {
                break;
            }
            let d = out.internodes.len();
            let mut inode = src[s];
            inode.parent = prev;
            inode.medial_child = None;
            inode.lateral_child = None;
            out.internodes.push(inode);
            out.dst_to_src.push(s);

            if let Some(p) = prev {
                if lateral {
                    out.internodes[p].lateral_child = Some(d);
                } else {
                    out.internodes[p].medial_child = Some(d);
                }
            }
            if let Some(l) = src[s].lateral_child {
                stack.push((l, Some(d)));
            }

            prev = Some(d);
            lateral = false;
            node = src[s].medial_child;
        }
    }

    debug_validate(&out.internodes);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize::codec::tests::branched_store;
    use crate::skeleton::topology::tests::branched_tree;
    use crate::skeleton::validate_internode_relationships;

    #[test]
    fn test_all_accepted_is_isomorphic() {
        let src = branched_tree();
        let pruned = prune_rejected_axes(&src, &[true; 5]);

        assert_eq!(pruned.len(), src.len());
        assert!(validate_internode_relationships(&pruned.internodes).is_ok());

        let mut seen = pruned.dst_to_src.clone();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), src.len());

        for (d, &s) in pruned.dst_to_src.iter().enumerate() {
            let inode = &pruned.internodes[d];
            assert_eq!(inode.id, src[s].id);
            assert_eq!(inode.parent.map(|p| pruned.dst_to_src[p]), src[s].parent);
            assert_eq!(inode.medial_child.map(|c| pruned.dst_to_src[c]), src[s].medial_child);
            assert_eq!(inode.lateral_child.map(|c| pruned.dst_to_src[c]), src[s].lateral_child);
        }
    }

    #[test]
    fn test_rejected_lateral_axis_is_removed() {
        let src = branched_tree();
        let pruned = prune_rejected_axes(&src, &[true, true, true, false, true]);

        assert_eq!(pruned.dst_to_src, vec![0, 1, 2]);
        assert_eq!(pruned.internodes[1].lateral_child, None);
        assert!(validate_internode_relationships(&pruned.internodes).is_ok());
    }

    #[test]
    fn test_rejection_cuts_everything_beyond() {
        let src = branched_tree();
        // Node 1 carries both the trunk continuation and the lateral axis.
        let pruned = prune_rejected_axes(&src, &[true, false, true, true, true]);

        assert_eq!(pruned.dst_to_src, vec![0]);
        assert_eq!(pruned.internodes[0].medial_child, None);
    }

    #[test]
    fn test_rejected_root_empties() {
        let src = branched_tree();
        assert!(prune_rejected_axes(&src, &[false, true, true, true, true]).is_empty());
        assert!(prune_rejected_axes(&[], &[]).is_empty());
    }

    #[test]
    fn test_remap_side_array() {
        let src = branched_tree();
        let pruned = prune_rejected_axes(&src, &[true, true, false, true, true]);
        let labels = ["a", "b", "c", "d", "e"];
        let remapped = pruned.remap(&labels);
        assert_eq!(remapped.len(), 4);
        assert!(!remapped.contains(&"c"));
    }

    #[test]
    fn test_grown_tree_keeps_valid_topology_under_any_mask() {
        let store = branched_store();
        for stride in 2..7 {
            let accepted: Vec<bool> = (0..store.internodes.len())
                .map(|i| i == 0 || i % stride != 0)
                .collect();
            let pruned = prune_rejected_axes(&store.internodes, &accepted);

            assert!(!pruned.is_empty());
            assert!(pruned.len() < store.internodes.len());
            assert!(validate_internode_relationships(&pruned.internodes).is_ok());
            assert!(pruned.dst_to_src.iter().all(|&s| accepted[s]));
        }
    }
}
