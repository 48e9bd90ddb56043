//! Render death: retracts axes inward, highest branch order first.

use std::collections::{BTreeMap, HashSet};

use crate::skeleton::{
    axis_roots, axis_tip, is_axis_root, update_render_positions, Internode, InternodeIndex,
};

/// Death front of one animated tree or subtree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderAxisDeathContext {
    dying: Vec<InternodeIndex>,
    /// Axis roots not yet started, keyed by gravelius order
    pending_axes: BTreeMap<u32, Vec<InternodeIndex>>,
    /// Nodes that never shrink; the front passes straight through them
    preserve: HashSet<InternodeIndex>,
}

impl RenderAxisDeathContext {
    pub fn dying(&self) -> &[InternodeIndex] {
        &self.dying
    }

    pub fn preserve(&self) -> &HashSet<InternodeIndex> {
        &self.preserve
    }

    pub fn is_complete(&self) -> bool {
        self.dying.is_empty() && self.pending_axes.is_empty()
    }

    /// Start at the tips of the highest remaining order. Returns false when
    /// no axes are left.
    fn start_next_order(&mut self, internodes: &[Internode]) -> bool {
        match self.pending_axes.pop_last() {
            Some((_, roots)) => {
                self.dying = roots.iter().map(|&r| axis_tip(internodes, r)).collect();
                true
            }
            None => false,
        }
    }
}

/// Queue every axis for retraction, starting at the maximal-order axis tips.
pub fn begin_render_axis_death(
    internodes: &[Internode],
    preserve: HashSet<InternodeIndex>,
) -> RenderAxisDeathContext {
    let mut pending_axes: BTreeMap<u32, Vec<InternodeIndex>> = BTreeMap::new();
    for root in axis_roots(internodes) {
        pending_axes
            .entry(internodes[root].gravelius_order)
            .or_default()
            .push(root);
    }

    let mut context = RenderAxisDeathContext {
        dying: Vec::new(),
        pending_axes,
        preserve,
    };
    context.start_next_order(internodes);
    context
}

/// Retract the death front by `increment`. Returns true while still dying.
pub fn tick_render_axis_death(
    internodes: &mut [Internode],
    context: &mut RenderAxisDeathContext,
    increment: f32,
) -> bool {
    debug_assert!(increment > 0.0, "death increment must be positive");

    let mut next = Vec::with_capacity(context.dying.len());
    for &i in &context.dying {
        if !context.preserve.contains(&i) {
            let scale = (internodes[i].length_scale - increment).max(0.0);
            internodes[i].length_scale = scale;
            if scale > 0.0 {
                next.push(i);
                continue;
            }
        }
        // Dead (or preserved): an axis root finishes its axis, anything else
        // hands the front to its parent on the same axis.
        if !is_axis_root(internodes, i) {
            next.extend(internodes[i].parent);
        }
    }
    context.dying = next;

    while context.dying.is_empty() && context.start_next_order(internodes) {}

    update_render_positions(internodes);
    !context.dying.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::topology::tests::branched_tree;

    fn run_to_completion(
        nodes: &mut [Internode],
        ctx: &mut RenderAxisDeathContext,
        inc: f32,
    ) -> usize {
        let mut ticks = 0;
        while tick_render_axis_death(nodes, ctx, inc) {
            ticks += 1;
            assert!(ticks < 1000);
        }
        ticks + 1
    }

    #[test]
    fn test_death_starts_at_highest_order_tips() {
        let nodes = branched_tree();
        let ctx = begin_render_axis_death(&nodes, HashSet::new());
        assert_eq!(ctx.dying(), &[4]);
    }

    #[test]
    fn test_lateral_axis_dies_before_trunk() {
        let mut nodes = branched_tree();
        let mut ctx = begin_render_axis_death(&nodes, HashSet::new());

        for _ in 0..4 {
            tick_render_axis_death(&mut nodes, &mut ctx, 0.5);
            assert!(nodes[..3].iter().all(|n| n.length_scale == 1.0));
        }
        assert_eq!(nodes[3].length_scale, 0.0);
        assert_eq!(nodes[4].length_scale, 0.0);
        assert_eq!(ctx.dying(), &[2]);
    }

    #[test]
    fn test_death_retracts_toward_root() {
        let mut nodes = branched_tree();
        let mut ctx = begin_render_axis_death(&nodes, HashSet::new());

        let ticks = run_to_completion(&mut nodes, &mut ctx, 0.5);
        assert_eq!(ticks, 10);
        assert!(ctx.is_complete());
        assert!(nodes.iter().all(|n| n.length_scale == 0.0));
        assert_eq!(nodes[2].render_position, nodes[0].position);
    }

    #[test]
    fn test_preserved_nodes_keep_scale() {
        let mut nodes = branched_tree();
        let preserve: HashSet<_> = [3].into_iter().collect();
        let mut ctx = begin_render_axis_death(&nodes, preserve);

        run_to_completion(&mut nodes, &mut ctx, 0.5);
        assert_eq!(nodes[3].length_scale, 1.0);
        assert_eq!(nodes[4].length_scale, 0.0);
        assert_eq!(nodes[0].length_scale, 0.0);
    }

    #[test]
    fn test_sibling_axes_of_same_order_die_together() {
        let mut nodes = branched_tree();
        // Second lateral axis: a single internode hanging off node 0.
        let mut extra = Internode::new(nodes[0].tip(), glam::Vec3::Z, 1.0, 0.1);
        extra.parent = Some(0);
        extra.gravelius_order = 1;
        nodes[0].lateral_child = Some(5);
        nodes.push(extra);

        let mut ctx = begin_render_axis_death(&nodes, HashSet::new());
        assert_eq!(ctx.dying(), &[4, 5]);

        // Node 5 finishes first, but the trunk waits for the longer lateral axis.
        tick_render_axis_death(&mut nodes, &mut ctx, 1.0);
        assert_eq!(ctx.dying(), &[3]);
        tick_render_axis_death(&mut nodes, &mut ctx, 1.0);
        assert_eq!(ctx.dying(), &[2]);
    }
}
