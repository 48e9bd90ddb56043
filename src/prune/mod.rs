//! Topology repair: mask compaction and collision pruning.
//!
//! Both passes return a new, fully reindexed internode array; the caller
//! splices it back with [`TreeNodeStore::apply_pruned`].
//!
//! [`TreeNodeStore::apply_pruned`]: crate::skeleton::TreeNodeStore::apply_pruned

pub mod intersecting;
pub mod rejected_axes;

pub use intersecting::{
    prune_intersecting, prune_intersecting_with_map, prune_intersecting_with_scratch, PruneScratch,
};
pub use rejected_axes::{prune_rejected_axes, PrunedInternodes};
