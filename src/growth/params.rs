use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::skeleton::{Bud, BudPerception, Internode, InternodeIndex};

/// Custom shoot direction: `(origin internode, bud, environment direction, params)`.
pub type ShootDirectionFn = fn(&Internode, &Bud, Vec3, &SpawnInternodeParams) -> Vec3;
/// Custom lateral bud direction: `(new internode, its index, params)`.
pub type LateralBudDirectionFn = fn(&Internode, InternodeIndex, &SpawnInternodeParams) -> Vec3;
/// Custom spawn predicate: `(origin internode, bud, shoot direction, params)`.
pub type AllowSpawnFn = fn(&Internode, &Bud, Vec3, &SpawnInternodeParams) -> bool;

/// How a bud picks the direction of the shoot it spawns.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShootDirectionPolicy {
    /// Weighted blend of environment pull, parent axis and tropism
    #[default]
    Blended,
    /// Blended, with strong apical tropism and flattened side shoots
    Pine,
    /// Ignores the environment: bud direction plus tropism
    Straight,
    #[serde(skip)]
    Custom(ShootDirectionFn),
}

/// How lateral buds are oriented around a freshly grown internode.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LateralBudDirectionPolicy {
    /// Spiral around the axis by the phyllotaxis angle
    #[default]
    Phyllotaxis,
    /// Alternate sides, 180 degrees apart
    Alternate,
    /// Spiral, pressed toward the horizontal plane
    Horizontal,
    #[serde(skip)]
    Custom(LateralBudDirectionFn),
}

/// Whether a bud may spawn along a proposed shoot direction.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllowSpawnPolicy {
    /// Terminal buds may not bend past `medial_bud_angle_criterion`
    #[default]
    MedialAngle,
    Always,
    #[serde(skip)]
    Custom(AllowSpawnFn),
}

macro_rules! policy_eq {
    ($name:ident { $($unit:ident),* }) => {
        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                match (self, other) {
                    $((Self::$unit, Self::$unit) => true,)*
                    (Self::Custom(a), Self::Custom(b)) => *a as usize == *b as usize,
                    _ => false,
                }
            }
        }
    };
}

policy_eq!(ShootDirectionPolicy { Blended, Pine, Straight });
policy_eq!(LateralBudDirectionPolicy { Phyllotaxis, Alternate, Horizontal });
policy_eq!(AllowSpawnPolicy { MedialAngle, Always });

/// Configuration for one bud-fate growth step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnInternodeParams {
    /// Hard cap on the number of internodes in a tree
    pub max_num_internodes: usize,
    pub max_num_metamers_per_growth_cycle: u32,
    /// Multiplier applied to `bud.v / num_metamers` to get internode length
    pub internode_length_scale: f32,
    pub min_internode_length: f32,
    pub max_internode_length: f32,
    pub leaf_diameter: f32,
    /// Pipe model exponent
    pub diameter_power: f32,
    /// Lateral buds below this height neither spawn nor get created
    pub min_lateral_branch_y: f32,
    /// Minimum dot(shoot, parent direction) for a terminal bud to spawn
    pub medial_bud_angle_criterion: f32,
    pub attenuate_diameter_by_length_scale: bool,
    /// `length_scale` given to new internodes (0.0 when growth is animated)
    pub initial_length_scale: f32,
    pub environment_weight: f32,
    pub axis_persistence_weight: f32,
    pub tropism_weight: f32,
    pub tropism_direction: Vec3,
    /// Angle between a lateral bud and its internode's axis (radians)
    pub lateral_bud_angle: f32,
    /// Rotation between successive lateral buds around the axis (radians)
    pub phyllotaxis_angle: f32,
    pub bud_perception: BudPerception,
    pub shoot_direction: ShootDirectionPolicy,
    pub lateral_bud_direction: LateralBudDirectionPolicy,
    pub allow_spawn: AllowSpawnPolicy,
}

impl Default for SpawnInternodeParams {
    fn default() -> Self {
        Self {
            max_num_internodes: 4096,
            max_num_metamers_per_growth_cycle: 3,
            internode_length_scale: 1.0,
            min_internode_length: 0.25,
            max_internode_length: 1.0,
            leaf_diameter: 0.05,
            diameter_power: 2.0,
            min_lateral_branch_y: 0.0,
            medial_bud_angle_criterion: 0.0, // at most 90 degrees
            attenuate_diameter_by_length_scale: false,
            initial_length_scale: 1.0,
            environment_weight: 1.0,
            axis_persistence_weight: 0.5,
            tropism_weight: 0.2,
            tropism_direction: Vec3::Y,
            lateral_bud_angle: std::f32::consts::FRAC_PI_4,
            phyllotaxis_angle: 137.5_f32.to_radians(), // golden angle
            bud_perception: BudPerception::default(),
            shoot_direction: ShootDirectionPolicy::default(),
            lateral_bud_direction: LateralBudDirectionPolicy::default(),
            allow_spawn: AllowSpawnPolicy::default(),
        }
    }
}

/// Named tree archetypes with ready-made growth parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeArchetype {
    #[default]
    Broadleaf,
    Pine,
    Thin,
    Thick,
    Debug,
}

impl TreeArchetype {
    pub fn spawn_params(self) -> SpawnInternodeParams {
        let base = SpawnInternodeParams::default();
        match self {
            TreeArchetype::Broadleaf => base,
            TreeArchetype::Pine => SpawnInternodeParams {
                max_num_metamers_per_growth_cycle: 4,
                min_internode_length: 0.4,
                diameter_power: 2.5,
                tropism_weight: 0.4,
                medial_bud_angle_criterion: 0.5, // at most 60 degrees
                lateral_bud_angle: 70.0_f32.to_radians(),
                shoot_direction: ShootDirectionPolicy::Pine,
                lateral_bud_direction: LateralBudDirectionPolicy::Horizontal,
                ..base
            },
            TreeArchetype::Thin => SpawnInternodeParams {
                leaf_diameter: 0.02,
                diameter_power: 3.0,
                lateral_bud_direction: LateralBudDirectionPolicy::Alternate,
                ..base
            },
            TreeArchetype::Thick => SpawnInternodeParams {
                leaf_diameter: 0.1,
                axis_persistence_weight: 0.8,
                min_internode_length: 0.5,
                ..base
            },
            TreeArchetype::Debug => SpawnInternodeParams {
                min_internode_length: 1.0,
                max_internode_length: 1.0,
                tropism_weight: 0.0,
                shoot_direction: ShootDirectionPolicy::Straight,
                allow_spawn: AllowSpawnPolicy::Always,
                ..base
            },
        }
    }
}

impl SpawnInternodeParams {
    /// Parse from YAML.
    ///
    /// An optional `archetype` key picks the base preset; every other key
    /// overrides a field of that preset.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let mut value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        if value.is_null() {
            value = serde_yaml::Value::Mapping(Default::default());
        }

        let archetype = match value
            .as_mapping_mut()
            .and_then(|m| m.remove("archetype"))
        {
            Some(a) => serde_yaml::from_value::<TreeArchetype>(a)?,
            None => TreeArchetype::default(),
        };

        let mut merged = serde_yaml::to_value(archetype.spawn_params())?;
        if let (Some(base), Some(overrides)) = (merged.as_mapping_mut(), value.as_mapping()) {
            for (k, v) in overrides {
                base.insert(k.clone(), v.clone());
            }
        }

        let params: Self = serde_yaml::from_value(merged)?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_internode_length > self.max_internode_length {
            return Err(ConfigError::Invalid {
                field: "min_internode_length",
                reason: format!(
                    "{} exceeds max_internode_length {}",
                    self.min_internode_length, self.max_internode_length
                ),
            });
        }
        if self.diameter_power <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "diameter_power",
                reason: format!("must be positive, got {}", self.diameter_power),
            });
        }
        if !(0.0..=1.0).contains(&self.initial_length_scale) {
            return Err(ConfigError::Invalid {
                field: "initial_length_scale",
                reason: format!("must lie in [0, 1], got {}", self.initial_length_scale),
            });
        }
        Ok(())
    }
}
