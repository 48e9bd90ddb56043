use glam::Vec3;

use super::ids::TreeInternodeID;

/// Maximum number of buds a single internode can own.
pub const MAX_NUM_BUDS_PER_INTERNODE: usize = 4;

/// Index of an internode inside its owning array.
pub type InternodeIndex = usize;

/// A rigid segment of the branch skeleton.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Internode {
    pub id: TreeInternodeID,
    /// Base point in world space
    pub position: Vec3,
    /// Base point used for animation; follows the parent's animated tip
    pub render_position: Vec3,
    /// Unit growth direction
    pub direction: Vec3,
    /// Target length when fully grown
    pub length: f32,
    /// Fraction of `length` currently rendered (0.0 = hidden, 1.0 = grown)
    pub length_scale: f32,
    pub diameter: f32,
    pub parent: Option<InternodeIndex>,
    /// Continuation of the same axis
    pub medial_child: Option<InternodeIndex>,
    /// First internode of a new branch axis
    pub lateral_child: Option<InternodeIndex>,
    /// Branch order, 0 for the trunk axis
    pub gravelius_order: u32,
    pub bud_indices: [usize; MAX_NUM_BUDS_PER_INTERNODE],
    pub num_buds: usize,
}

impl Default for Internode {
    fn default() -> Self {
        Self {
            id: TreeInternodeID::null(),
            position: Vec3::ZERO,
            render_position: Vec3::ZERO,
            direction: Vec3::Y,
            length: 0.0,
            length_scale: 1.0,
            diameter: 0.0,
            parent: None,
            medial_child: None,
            lateral_child: None,
            gravelius_order: 0,
            bud_indices: [0; MAX_NUM_BUDS_PER_INTERNODE],
            num_buds: 0,
        }
    }
}

impl Internode {
    /// Create a detached internode with a fresh identity.
    pub fn new(position: Vec3, direction: Vec3, length: f32, diameter: f32) -> Self {
        Self {
            id: TreeInternodeID::create(),
            position,
            render_position: position,
            direction,
            length,
            diameter,
            ..Default::default()
        }
    }

    /// Structural tip of the internode.
    pub fn tip(&self) -> Vec3 {
        self.position + self.direction * self.length
    }

    /// Tip reached by the animated (render) segment.
    pub fn render_tip(&self) -> Vec3 {
        self.render_position + self.direction * (self.length * self.length_scale)
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.medial_child.is_none() && self.lateral_child.is_none()
    }

    /// Indices of the buds this internode still owns.
    pub fn buds(&self) -> &[usize] {
        &self.bud_indices[..self.num_buds]
    }

    /// Attach a bud; returns false when the internode is already full.
    pub fn push_bud(&mut self, bud_index: usize) -> bool {
        if self.num_buds >= MAX_NUM_BUDS_PER_INTERNODE {
            return false;
        }
        self.bud_indices[self.num_buds] = bud_index;
        self.num_buds += 1;
        true
    }

    pub fn clear_buds(&mut self) {
        self.num_buds = 0;
    }

    /// Children in medial-then-lateral order.
    pub fn children(&self) -> impl Iterator<Item = InternodeIndex> {
        self.medial_child.into_iter().chain(self.lateral_child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tip() {
        let inode = Internode::new(Vec3::ZERO, Vec3::Y, 2.0, 0.1);
        assert_eq!(inode.tip(), Vec3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn test_render_tip_uses_length_scale() {
        let mut inode = Internode::new(Vec3::ZERO, Vec3::X, 2.0, 0.1);
        inode.length_scale = 0.5;
        assert!((inode.render_tip() - Vec3::X).length() < 1e-6);
    }

    #[test]
    fn test_push_bud_capacity() {
        let mut inode = Internode::default();
        for i in 0..MAX_NUM_BUDS_PER_INTERNODE {
            assert!(inode.push_bud(i));
        }
        assert!(!inode.push_bud(99));
        assert_eq!(inode.buds().len(), MAX_NUM_BUDS_PER_INTERNODE);
    }

    #[test]
    fn test_children_order() {
        let inode = Internode {
            medial_child: Some(3),
            lateral_child: Some(5),
            ..Default::default()
        };
        assert_eq!(inode.children().collect::<Vec<_>>(), vec![3, 5]);
    }
}
