//! Process-unique identities for trees, internodes and buds.
//!
//! Indices into the store arrays change whenever buds are consumed or a tree is
//! pruned; these IDs stay attached to the element they were minted for.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_INTERNODE_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_BUD_ID: AtomicU64 = AtomicU64::new(1);

macro_rules! unique_id {
    ($(#[$meta:meta])* $name:ident, $counter:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl $name {
            /// Mint a fresh identity, never handed out before in this process.
            pub fn create() -> Self {
                Self($counter.fetch_add(1, Ordering::Relaxed))
            }

            /// The null identity; never produced by `create`.
            pub const fn null() -> Self {
                Self(0)
            }

            pub fn is_null(&self) -> bool {
                self.0 == 0
            }
        }
    };
}

unique_id!(
    /// Identity of a tree instance.
    TreeID,
    NEXT_TREE_ID
);
unique_id!(
    /// Identity of an internode.
    TreeInternodeID,
    NEXT_INTERNODE_ID
);
unique_id!(
    /// Identity of a bud; keys the environment inputs.
    TreeBudID,
    NEXT_BUD_ID
);
