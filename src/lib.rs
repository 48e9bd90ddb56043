//! Woody plant skeleton growth.
//!
//! A tree is an arena of [`Internode`]s (rigid branch segments) and [`Bud`]s
//! (growth points) owned by a [`TreeNodeStore`]. Each growth tick,
//! [`bud_fate`] turns buds into new internodes. The render animators then move
//! `length_scale` toward the new structure over many frames. Pruning and
//! surface projection build replacement internode arrays that callers splice
//! back into the store.

pub mod animation;
pub mod error;
pub mod geometry;
pub mod growth;
pub mod projection;
pub mod prune;
pub mod serialize;
pub mod skeleton;

pub use animation::{
    begin_render_axis_death, begin_render_axis_growth, tick_render_axis_death,
    tick_render_axis_growth, RenderAxisDeathContext, RenderAxisGrowthContext,
};
pub use error::{ConfigError, StoreFileError, TopologyError};
pub use growth::{
    bud_fate, BudFateReport, EnvironmentInput, EnvironmentInputs, SpawnInternodeParams,
    TreeArchetype,
};
pub use projection::{
    post_process_projected_internodes, project_internodes_onto_mesh, ProjectedInternodes,
    ProjectionPostProcessParams,
};
pub use prune::{prune_intersecting, prune_rejected_axes, PrunedInternodes};
pub use serialize::{deserialize, read_tree_node_store, serialize, write_tree_node_store};
pub use skeleton::{
    validate_internode_relationships, Bud, Internode, InternodeIndex, TreeBudID, TreeID,
    TreeInternodeID, TreeNodeStore,
};
