use glam::Vec3;

use super::ids::TreeBudID;
use super::internode::InternodeIndex;

/// A growth point capable of producing new internodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bud {
    pub id: TreeBudID,
    pub position: Vec3,
    /// Preferred growth direction
    pub direction: Vec3,
    /// Apical (true) or lateral (false)
    pub is_terminal: bool,
    /// Owning internode
    pub parent: InternodeIndex,
    /// Accumulated resource signal; its floor is the metamer count
    pub v: f32,
    /// Resource allocation coefficient; zero starves the bud
    pub q: f32,
    /// Perception cone half-angle (radians), read by the environment model
    pub perception_angle: f32,
    /// Perception distance, read by the environment model
    pub perception_distance: f32,
    /// Occupancy radius, read by the environment model
    pub occupancy_radius: f32,
}

impl Default for Bud {
    fn default() -> Self {
        Self {
            id: TreeBudID::null(),
            position: Vec3::ZERO,
            direction: Vec3::Y,
            is_terminal: false,
            parent: 0,
            v: 0.0,
            q: 1.0,
            perception_angle: std::f32::consts::FRAC_PI_4,
            perception_distance: 4.0,
            occupancy_radius: 2.0,
        }
    }
}

impl Bud {
    pub fn new(parent: InternodeIndex, position: Vec3, direction: Vec3, is_terminal: bool) -> Self {
        Self {
            id: TreeBudID::create(),
            position,
            direction,
            is_terminal,
            parent,
            ..Default::default()
        }
    }

    /// Copy the environment-model perception parameters from `params`.
    pub fn with_perception(mut self, params: &BudPerception) -> Self {
        self.perception_angle = params.angle;
        self.perception_distance = params.distance;
        self.occupancy_radius = params.occupancy_radius;
        self
    }
}

/// Perception settings stamped onto newly created buds.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BudPerception {
    pub angle: f32,
    pub distance: f32,
    pub occupancy_radius: f32,
}

impl Default for BudPerception {
    fn default() -> Self {
        let bud = Bud::default();
        Self {
            angle: bud.perception_angle,
            distance: bud.perception_distance,
            occupancy_radius: bud.occupancy_radius,
        }
    }
}
