//! Skeleton data model: internodes, buds and the store that owns them.

pub mod bud;
pub mod ids;
pub mod internode;
pub mod store;
pub mod topology;

pub use bud::{Bud, BudPerception};
pub use ids::{TreeBudID, TreeID, TreeInternodeID};
pub use internode::{Internode, InternodeIndex, MAX_NUM_BUDS_PER_INTERNODE};
pub use store::TreeNodeStore;
pub use topology::{
    assign_gravelius_orders, axis_roots, axis_tip, debug_validate, is_axis_root, max_axis_depth,
    postorder, preorder, update_render_positions, validate_internode_relationships,
};
