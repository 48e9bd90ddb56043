//! Built-in shoot, lateral bud and spawn policies.

use glam::{Quat, Vec3};

use super::params::{
    AllowSpawnPolicy, LateralBudDirectionPolicy, ShootDirectionPolicy, SpawnInternodeParams,
};
use crate::skeleton::{Bud, Internode, InternodeIndex};

impl ShootDirectionPolicy {
    pub fn evaluate(
        &self,
        origin: &Internode,
        bud: &Bud,
        environment_direction: Vec3,
        params: &SpawnInternodeParams,
    ) -> Vec3 {
        let fallback = bud.direction.normalize_or(origin.direction.normalize_or(Vec3::Y));
        match self {
            ShootDirectionPolicy::Blended => {
                blended_direction(
                    origin,
                    environment_direction,
                    fallback,
                    params.tropism_weight,
                    params,
                )
            }
            ShootDirectionPolicy::Pine => {
                if bud.is_terminal {
                    let tropism = params.tropism_weight * 3.0;
                    blended_direction(origin, environment_direction, fallback, tropism, params)
                } else {
                    let d = blended_direction(origin, environment_direction, fallback, 0.0, params);
                    flatten(d, 0.25).normalize_or(fallback)
                }
            }
            ShootDirectionPolicy::Straight => {
                let tropism = params.tropism_direction.normalize_or_zero() * params.tropism_weight;
                (fallback + tropism).normalize_or(fallback)
            }
            ShootDirectionPolicy::Custom(f) => f(origin, bud, environment_direction, params),
        }
    }
}

impl LateralBudDirectionPolicy {
    pub fn evaluate(
        &self,
        internode: &Internode,
        index: InternodeIndex,
        params: &SpawnInternodeParams,
    ) -> Vec3 {
        match self {
            LateralBudDirectionPolicy::Phyllotaxis => {
                let roll = index as f32 * params.phyllotaxis_angle;
                tilted_direction(internode.direction, roll, params.lateral_bud_angle)
            }
            LateralBudDirectionPolicy::Alternate => {
                let roll = if index % 2 == 0 { 0.0 } else { std::f32::consts::PI };
                tilted_direction(internode.direction, roll, params.lateral_bud_angle)
            }
            LateralBudDirectionPolicy::Horizontal => {
                let roll = index as f32 * params.phyllotaxis_angle;
                let d = tilted_direction(internode.direction, roll, params.lateral_bud_angle);
                flatten(d, 0.2).normalize_or(d)
            }
            LateralBudDirectionPolicy::Custom(f) => f(internode, index, params),
        }
    }
}

impl AllowSpawnPolicy {
    pub fn evaluate(
        &self,
        origin: &Internode,
        bud: &Bud,
        shoot_direction: Vec3,
        params: &SpawnInternodeParams,
    ) -> bool {
        match self {
            AllowSpawnPolicy::MedialAngle => {
                !bud.is_terminal
                    || shoot_direction.dot(origin.direction) >= params.medial_bud_angle_criterion
            }
            AllowSpawnPolicy::Always => true,
            AllowSpawnPolicy::Custom(f) => f(origin, bud, shoot_direction, params),
        }
    }
}

fn blended_direction(
    origin: &Internode,
    environment_direction: Vec3,
    fallback: Vec3,
    tropism_weight: f32,
    params: &SpawnInternodeParams,
) -> Vec3 {
    let environment = environment_direction.normalize_or(fallback);
    let blended = environment * params.environment_weight
        + origin.direction.normalize_or_zero() * params.axis_persistence_weight
        + params.tropism_direction.normalize_or_zero() * tropism_weight;
    blended.normalize_or(fallback)
}

/// Rotate a perpendicular of `axis` by `roll` around it, then tilt it away
/// from the axis by `tilt`.
fn tilted_direction(axis: Vec3, roll: f32, tilt: f32) -> Vec3 {
    let axis = axis.normalize_or(Vec3::Y);
    let radial = Quat::from_axis_angle(axis, roll) * axis.any_orthonormal_vector();
    (axis * tilt.cos() + radial * tilt.sin()).normalize_or(axis)
}

fn flatten(d: Vec3, vertical_keep: f32) -> Vec3 {
    Vec3::new(d.x, d.y * vertical_keep, d.z)
}
