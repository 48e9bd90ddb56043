//! Error types shared across the crate.

use std::path::PathBuf;
use thiserror::Error;

/// A violated parent/child relationship in an internode array.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    #[error("root internode 0 has parent {0}")]
    RootHasParent(usize),
    #[error("internode {0} has no parent but is not the root")]
    ExtraRoot(usize),
    #[error("internode {node} references out-of-range index {index}")]
    IndexOutOfRange { node: usize, index: usize },
    #[error("internode {child} is not a child of its parent {parent}")]
    NotAChildOfParent { child: usize, parent: usize },
    #[error("internode {0} is both the medial and lateral child of its parent")]
    MedialAndLateral(usize),
    #[error("internode {child} is referenced by {first} and {second}")]
    MultipleParents {
        child: usize,
        first: usize,
        second: usize,
    },
    #[error("internode {0} is not reachable from the root")]
    Unreachable(usize),
    #[error("internode {node} references bud {bud} owned by internode {owner}")]
    BudOwnership { node: usize, bud: usize, owner: usize },
}

/// Failure to load configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Failure to read or write a serialized tree node store.
#[derive(Error, Debug)]
pub enum StoreFileError {
    #[error("failed to access tree node store file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("tree node store file {0:?} is truncated or malformed")]
    Malformed(PathBuf),
}
