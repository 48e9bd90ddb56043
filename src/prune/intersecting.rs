//! Removal of branches that grow through other branches.

use std::collections::VecDeque;

use crate::geometry::Obb;
use crate::skeleton::{debug_validate, Internode, InternodeIndex};

use super::rejected_axes::{prune_rejected_axes, PrunedInternodes};

/// Reusable buffers for [`prune_intersecting_with_scratch`]. Sized to the
/// input on every call.
#[derive(Debug, Clone, Default)]
pub struct PruneScratch {
    obbs: Vec<Obb>,
    accepted: Vec<bool>,
    accepted_list: Vec<InternodeIndex>,
    /// (lateral axis root, source parent)
    pending_axes: Vec<(InternodeIndex, InternodeIndex)>,
    recent: VecDeque<InternodeIndex>,
}

impl PruneScratch {
    fn reset(&mut self, internodes: &[Internode], obb_diameter_override: Option<f32>) {
        self.obbs.clear();
        self.obbs.extend(
            internodes
                .iter()
                .map(|inode| Obb::from_internode(inode, obb_diameter_override)),
        );
        self.accepted.clear();
        self.accepted.resize(internodes.len(), false);
        self.accepted_list.clear();
        self.pending_axes.clear();
        self.recent.clear();
    }

    fn accept(&mut self, i: InternodeIndex) {
        self.accepted[i] = true;
        self.accepted_list.push(i);
    }

    /// Still inside the branch it sprouted from: the source parent or that
    /// parent's medial continuation.
    fn is_embedded(
        &self,
        internodes: &[Internode],
        i: InternodeIndex,
        parent: InternodeIndex,
    ) -> bool {
        let obb = &self.obbs[i];
        obb.intersects(&self.obbs[parent])
            || internodes[parent]
                .medial_child
                .is_some_and(|m| self.accepted[m] && obb.intersects(&self.obbs[m]))
    }

    fn collides(&self, i: InternodeIndex, prev: InternodeIndex) -> bool {
        let obb = &self.obbs[i];
        self.accepted_list
            .iter()
            .any(|&j| j != prev && !self.recent.contains(&j) && obb.intersects(&self.obbs[j]))
    }
}

/// Drop lateral axes from the point where they run into already accepted
/// geometry. See [`prune_intersecting_with_scratch`].
pub fn prune_intersecting(
    internodes: &[Internode],
    queue_size: usize,
    obb_diameter_override: Option<f32>,
) -> Vec<Internode> {
    prune_intersecting_with_map(internodes, queue_size, obb_diameter_override).internodes
}

/// [`prune_intersecting`], also returning the source index of each kept node.
pub fn prune_intersecting_with_map(
    internodes: &[Internode],
    queue_size: usize,
    obb_diameter_override: Option<f32>,
) -> PrunedInternodes {
    let mut scratch = PruneScratch::default();
    prune_intersecting_with_scratch(internodes, queue_size, obb_diameter_override, &mut scratch)
}

/// Collision pruning over internode OBBs.
///
/// The root axis is always kept. Every lateral axis is accepted as long as
/// it is still embedded in the branch it sprouted from. Once it emerges, a
/// node is rejected if its OBB touches any accepted OBB other than its
/// parent and the last `queue_size` nodes of its own axis. A rejected node
/// ends its axis; its subtree is never visited.
pub fn prune_intersecting_with_scratch(
    internodes: &[Internode],
    queue_size: usize,
    obb_diameter_override: Option<f32>,
    scratch: &mut PruneScratch,
) -> PrunedInternodes {
    if internodes.is_empty() {
        return PrunedInternodes::default();
    }
    scratch.reset(internodes, obb_diameter_override);

    let mut node = Some(0);
    while let Some(i) = node {
        scratch.accept(i);
        if let Some(l) = internodes[i].lateral_child {
            scratch.pending_axes.push((l, i));
        }
        node = internodes[i].medial_child;
    }

    while let Some((axis_root, source_parent)) = scratch.pending_axes.pop() {
        scratch.recent.clear();
        let mut emerged = false;
        let mut prev = source_parent;
        let mut node = Some(axis_root);

        while let Some(i) = node {
            if !emerged && !scratch.is_embedded(internodes, i, source_parent) {
                emerged = true;
            }
            if emerged && scratch.collides(i, prev) {
                break;
            }

            scratch.accept(i);
            scratch.recent.push_back(i);
            while scratch.recent.len() > queue_size {
                scratch.recent.pop_front();
            }
            if let Some(l) = internodes[i].lateral_child {
                scratch.pending_axes.push((l, i));
            }
            prev = i;
            node = internodes[i].medial_child;
        }
    }

    let pruned = prune_rejected_axes(internodes, &scratch.accepted);
    debug_validate(&pruned.internodes);
    log::debug!(
        "intersection prune kept {} of {} internodes",
        pruned.len(),
        internodes.len()
    );
    pruned
}
