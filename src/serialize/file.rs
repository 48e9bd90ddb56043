//! Reading and writing serialized stores on disk.

use std::fs;
use std::path::Path;

use crate::error::StoreFileError;
use crate::skeleton::TreeNodeStore;

use super::codec::{deserialize, serialize};

pub fn write_tree_node_store(
    path: impl AsRef<Path>,
    store: &TreeNodeStore,
) -> Result<(), StoreFileError> {
    let path = path.as_ref();
    let bytes = serialize(store);
    fs::write(path, &bytes).map_err(|source| {
        log::warn!("failed to write tree node store to {}: {}", path.display(), source);
        StoreFileError::Io {
            path: path.to_path_buf(),
            source,
        }
    })?;

    log::info!(
        "wrote tree {:?} to {} ({} internodes, {} buds, {} bytes)",
        store.id,
        path.display(),
        store.internodes.len(),
        store.buds.len(),
        bytes.len()
    );
    Ok(())
}

/// Load a store written by [`write_tree_node_store`]. Identities are fresh.
pub fn read_tree_node_store(path: impl AsRef<Path>) -> Result<TreeNodeStore, StoreFileError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| {
        log::warn!("failed to read tree node store from {}: {}", path.display(), source);
        StoreFileError::Io {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let store = deserialize(&bytes).ok_or_else(|| {
        log::warn!("tree node store {} is malformed ({} bytes)", path.display(), bytes.len());
        StoreFileError::Malformed(path.to_path_buf())
    })?;

    log::info!(
        "read tree {:?} from {} ({} internodes, {} buds)",
        store.id,
        path.display(),
        store.internodes.len(),
        store.buds.len()
    );
    Ok(store)
}
