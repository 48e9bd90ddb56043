//! Clean-up passes over a freshly projected skeleton.

use std::ops::{Add, Mul};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::growth::PipeModel;
use crate::prune::prune_intersecting_with_map;
use crate::skeleton::{
    assign_gravelius_orders, debug_validate, preorder, Internode, InternodeIndex, TreeInternodeID,
};

use super::surface::ProjectedInternodes;

/// Smoothing never looks further than this many nodes to either side.
pub const MAX_SMOOTHING_WINDOW: usize = 32;

/// Which post-processing stages run, and how.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionPostProcessParams {
    pub prune_intersecting: bool,
    /// Recent ancestors on an axis exempt from collision checks
    pub prune_queue_size: usize,
    pub obb_diameter_override: Option<f32>,

    pub reset_diameters: bool,
    pub leaf_diameter: f32,
    pub diameter_power: f32,

    pub smooth_diameters: bool,
    pub smooth_normals: bool,
    /// Window half-width in nodes, capped at `MAX_SMOOTHING_WINDOW`
    pub adjacent_count: usize,

    pub max_diameter: Option<f32>,
    /// Lift each internode off the surface by its radius
    pub offset_by_normal: bool,
    pub constrain_lateral_diameter: bool,
    pub preserve_source_internode_ids: bool,
}

impl Default for ProjectionPostProcessParams {
    fn default() -> Self {
        Self {
            prune_intersecting: true,
            prune_queue_size: 4,
            obb_diameter_override: None,
            reset_diameters: true,
            leaf_diameter: 0.05,
            diameter_power: 2.0,
            smooth_diameters: false,
            smooth_normals: true,
            adjacent_count: 4,
            max_diameter: None,
            offset_by_normal: true,
            constrain_lateral_diameter: true,
            preserve_source_internode_ids: false,
        }
    }
}

impl ProjectionPostProcessParams {
    /// Parse from YAML; omitted fields keep their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        let params: Self = if value.is_null() {
            Self::default()
        } else {
            serde_yaml::from_value(value)?
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.diameter_power <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "diameter_power",
                reason: format!("must be positive, got {}", self.diameter_power),
            });
        }
        if let Some(max) = self.max_diameter {
            if max <= 0.0 {
                return Err(ConfigError::Invalid {
                    field: "max_diameter",
                    reason: format!("must be positive, got {max}"),
                });
            }
        }
        Ok(())
    }
}

/// Run the enabled post-processing stages in order:
/// prune, diameter reset, smoothing, clamp, normal offset, lateral diameter
/// constraint, gravelius orders, ID regeneration.
pub fn post_process_projected_internodes(
    projected: &mut ProjectedInternodes,
    params: &ProjectionPostProcessParams,
) {
    if projected.is_empty() {
        return;
    }

    if params.prune_intersecting {
        let pruned = prune_intersecting_with_map(
            &projected.internodes,
            params.prune_queue_size,
            params.obb_diameter_override,
        );
        projected.ray_result_index = pruned.remap(&projected.ray_result_index);
        projected.normals = pruned.remap(&projected.normals);
        projected.internodes = pruned.internodes;
    }
    let internodes = &mut projected.internodes;

    if params.reset_diameters {
        PipeModel {
            leaf_diameter: params.leaf_diameter,
            diameter_power: params.diameter_power,
            attenuate_by_length_scale: false,
        }
        .apply(internodes);
    }

    let window = params.adjacent_count.min(MAX_SMOOTHING_WINDOW);
    if params.smooth_diameters && window > 0 {
        let diameters: Vec<f32> = internodes.iter().map(|n| n.diameter).collect();
        for i in 0..internodes.len() {
            let smoothed = windowed_mean(internodes, &diameters, i, window);
            internodes[i].diameter = smoothed;
        }
    }
    if params.smooth_normals && window > 0 {
        let normals = projected.normals.clone();
        for (i, normal) in projected.normals.iter_mut().enumerate() {
            *normal = windowed_mean(internodes, &normals, i, window).normalize_or(normals[i]);
        }
    }

    if let Some(max) = params.max_diameter {
        for inode in internodes.iter_mut() {
            inode.diameter = inode.diameter.min(max);
        }
    }

    if params.offset_by_normal {
        for (inode, normal) in internodes.iter_mut().zip(&projected.normals) {
            let lift = *normal * (inode.diameter * 0.5);
            inode.position += lift;
            inode.render_position += lift;
        }
    }

    if params.constrain_lateral_diameter {
        let order: Vec<InternodeIndex> = preorder(internodes).collect();
        for i in order {
            if let Some(l) = internodes[i].lateral_child {
                internodes[l].diameter = internodes[l].diameter.min(internodes[i].diameter);
            }
        }
    }

    assign_gravelius_orders(internodes);

    if !params.preserve_source_internode_ids {
        for inode in internodes.iter_mut() {
            inode.id = TreeInternodeID::create();
        }
    }

    debug_validate(internodes);
    log::debug!("post-processed projected skeleton: {} internodes", internodes.len());
}

/// Mean of `values` over node `i`, up to `window` ancestors and up to
/// `window` medial descendants.
fn windowed_mean<T>(internodes: &[Internode], values: &[T], i: InternodeIndex, window: usize) -> T
where
    T: Copy + Add<Output = T> + Mul<f32, Output = T>,
{
    let mut sum = values[i];
    let mut count = 1usize;

    let mut node = internodes[i].parent;
    for _ in 0..window {
        let Some(p) = node else { break };
        sum = sum + values[p];
        count += 1;
        node = internodes[p].parent;
    }

    let mut node = internodes[i].medial_child;
    for _ in 0..window {
        let Some(c) = node else { break };
        sum = sum + values[c];
        count += 1;
        node = internodes[c].medial_child;
    }

    sum * (count as f32).recip()
}
