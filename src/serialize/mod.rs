//! Flat binary persistence of tree node stores.

pub mod codec;
pub mod file;

pub use codec::{deserialize, serialize, BudRecord, InternodeRecord};
pub use file::{read_tree_node_store, write_tree_node_store};
