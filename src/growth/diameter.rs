//! Pipe-model diameter assignment.
//!
//! A parent's cross-section carries the combined flow of its children:
//! `d^p = d_medial^p + d_lateral^p`, floored at the leaf diameter.

use crate::skeleton::{postorder, Internode};

use super::params::SpawnInternodeParams;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipeModel {
    pub leaf_diameter: f32,
    pub diameter_power: f32,
    /// Scale each diameter by its `length_scale` so immature shoots look thin
    pub attenuate_by_length_scale: bool,
}

impl From<&SpawnInternodeParams> for PipeModel {
    fn from(params: &SpawnInternodeParams) -> Self {
        Self {
            leaf_diameter: params.leaf_diameter,
            diameter_power: params.diameter_power,
            attenuate_by_length_scale: params.attenuate_diameter_by_length_scale,
        }
    }
}

impl PipeModel {
    /// Recompute every diameter, children before parents.
    pub fn apply(&self, internodes: &mut [Internode]) {
        let power = self.diameter_power.max(f32::EPSILON);
        for i in postorder(internodes) {
            let flow: f32 = internodes[i]
                .children()
                .map(|c| internodes[c].diameter.powf(power))
                .sum();

            let mut diameter = self.leaf_diameter.max(flow.powf(power.recip()));
            if self.attenuate_by_length_scale {
                diameter *= internodes[i].length_scale;
            }
            internodes[i].diameter = diameter;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::topology::tests::branched_tree;

    fn model() -> PipeModel {
        PipeModel {
            leaf_diameter: 0.1,
            diameter_power: 2.0,
            attenuate_by_length_scale: false,
        }
    }

    #[test]
    fn test_leaves_get_leaf_diameter() {
        let mut nodes = branched_tree();
        model().apply(&mut nodes);
        assert!((nodes[2].diameter - 0.1).abs() < 1e-6);
        assert!((nodes[4].diameter - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_branch_point_combines_children() {
        let mut nodes = branched_tree();
        model().apply(&mut nodes);
        // Node 1 carries the trunk tip and the lateral axis: sqrt(0.1^2 + 0.1^2).
        let expected = (0.02f32).sqrt();
        assert!((nodes[1].diameter - expected).abs() < 1e-6);
        assert!((nodes[0].diameter - expected).abs() < 1e-6);
    }

    #[test]
    fn test_diameter_monotone_toward_root() {
        let mut nodes = branched_tree();
        model().apply(&mut nodes);
        for inode in &nodes {
            for c in inode.children() {
                assert!(inode.diameter >= nodes[c].diameter);
            }
        }
    }

    #[test]
    fn test_attenuation_by_length_scale() {
        let mut nodes = branched_tree();
        nodes[4].length_scale = 0.5;
        PipeModel {
            attenuate_by_length_scale: true,
            ..model()
        }
        .apply(&mut nodes);
        assert!((nodes[4].diameter - 0.05).abs() < 1e-6);
        assert!((nodes[3].diameter - 0.1).abs() < 1e-6);
    }
}
