//! Structural growth: bud fate, growth policies and pipe-model diameters.

pub mod bud_fate;
pub mod diameter;
mod direction;
pub mod params;

pub use bud_fate::{bud_fate, remove_grown_buds, BudFateReport, EnvironmentInput, EnvironmentInputs};
pub use diameter::PipeModel;
pub use params::{
    AllowSpawnFn, AllowSpawnPolicy, LateralBudDirectionFn, LateralBudDirectionPolicy,
    ShootDirectionFn, ShootDirectionPolicy, SpawnInternodeParams, TreeArchetype,
};
