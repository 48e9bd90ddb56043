//! Render growth: animates `length_scale` from 0 to 1 along a growth front.
//!
//! Structural growth can add many internodes in one step; this front reveals
//! them gradually, one internode per axis at a time, fanning out at branch
//! points.

use crate::skeleton::{update_render_positions, Internode, InternodeIndex};

/// Scales this close to 1.0 count as fully grown; keeps float drift from
/// costing an extra tick.
const FULLY_GROWN_EPSILON: f32 = 1e-5;

/// Growth front of one animated axis instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderAxisGrowthContext {
    growing: Vec<InternodeIndex>,
}

impl RenderAxisGrowthContext {
    /// Resume growth from the given nodes without touching their scales.
    pub fn new(growing: impl IntoIterator<Item = InternodeIndex>) -> Self {
        Self {
            growing: growing.into_iter().collect(),
        }
    }

    /// Nodes currently on the growth front.
    pub fn growing(&self) -> &[InternodeIndex] {
        &self.growing
    }

    pub fn is_complete(&self) -> bool {
        self.growing.is_empty()
    }
}

/// Hide the subtree under `root` and start growing it from `root`.
pub fn begin_render_axis_growth(
    internodes: &mut [Internode],
    root: InternodeIndex,
) -> RenderAxisGrowthContext {
    let mut stack = vec![root];
    while let Some(i) = stack.pop() {
        internodes[i].length_scale = 0.0;
        stack.extend(internodes[i].children());
    }
    update_render_positions(internodes);
    RenderAxisGrowthContext::new([root])
}

/// Advance the growth front by `increment`. Returns true while still growing.
pub fn tick_render_axis_growth(
    internodes: &mut [Internode],
    context: &mut RenderAxisGrowthContext,
    increment: f32,
) -> bool {
    debug_assert!(increment > 0.0, "growth increment must be positive");

    let mut next = Vec::with_capacity(context.growing.len());
    for &i in &context.growing {
        let inode = &mut internodes[i];
        inode.length_scale += increment;
        if inode.length_scale >= 1.0 - FULLY_GROWN_EPSILON {
            inode.length_scale = 1.0;
            next.extend(inode.children());
        } else {
            next.push(i);
        }
    }
    context.growing = next;

    update_render_positions(internodes);
    !context.growing.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::max_axis_depth;
    use crate::skeleton::topology::tests::branched_tree;
    use glam::Vec3;

    #[test]
    fn test_begin_hides_subtree() {
        let mut nodes = branched_tree();
        let ctx = begin_render_axis_growth(&mut nodes, 1);

        assert_eq!(ctx.growing(), &[1]);
        assert_eq!(nodes[0].length_scale, 1.0);
        assert!(nodes[1..].iter().all(|n| n.length_scale == 0.0));
        assert!((nodes[4].render_position - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn test_growth_fans_out_at_branch_points() {
        let mut nodes = branched_tree();
        let mut ctx = begin_render_axis_growth(&mut nodes, 0);

        assert!(tick_render_axis_growth(&mut nodes, &mut ctx, 1.0));
        assert_eq!(ctx.growing(), &[1]);
        assert!(tick_render_axis_growth(&mut nodes, &mut ctx, 1.0));
        assert_eq!(ctx.growing(), &[2, 3]);
    }

    #[test]
    fn test_partial_tick_moves_render_positions() {
        let mut nodes = branched_tree();
        let mut ctx = begin_render_axis_growth(&mut nodes, 0);
        tick_render_axis_growth(&mut nodes, &mut ctx, 0.5);

        assert_eq!(nodes[0].length_scale, 0.5);
        assert!((nodes[1].render_position - Vec3::new(0.0, 0.5, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_growth_terminates_fully_grown() {
        let mut nodes = branched_tree();
        let increment = 0.25;
        let bound = (1.0 / increment as f64).ceil() as usize * max_axis_depth(&nodes);

        let mut ctx = begin_render_axis_growth(&mut nodes, 0);
        let mut ticks = 0;
        while tick_render_axis_growth(&mut nodes, &mut ctx, increment) {
            ticks += 1;
            assert!(ticks <= bound, "growth did not terminate within {bound} ticks");
        }

        assert!(ctx.is_complete());
        assert!(nodes.iter().all(|n| n.length_scale == 1.0));
        for n in &nodes {
            assert!((n.render_position - n.position).length() < 1e-5);
        }
    }

    #[test]
    fn test_inexact_increment_does_not_overshoot() {
        let mut nodes = branched_tree();
        let mut ctx = begin_render_axis_growth(&mut nodes, 0);
        for _ in 0..10 {
            tick_render_axis_growth(&mut nodes, &mut ctx, 0.1);
        }
        assert_eq!(nodes[0].length_scale, 1.0);
        assert_eq!(ctx.growing(), &[1]);
    }
}
