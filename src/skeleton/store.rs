use glam::Vec3;

use crate::error::TopologyError;
use crate::growth::SpawnInternodeParams;

use super::bud::Bud;
use super::ids::TreeID;
use super::internode::{Internode, InternodeIndex};
use super::topology::validate_internode_relationships;

/// Owns the internodes and buds of one tree instance.
///
/// Pruning and projection build new internode arrays; callers swap them in
/// through [`TreeNodeStore::apply_pruned`] so the store is never observed in a
/// half-updated state.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNodeStore {
    pub id: TreeID,
    pub internodes: Vec<Internode>,
    pub buds: Vec<Bud>,
}

impl Default for TreeNodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeNodeStore {
    /// Empty store with a fresh tree identity.
    pub fn new() -> Self {
        Self {
            id: TreeID::create(),
            internodes: Vec::new(),
            buds: Vec::new(),
        }
    }

    /// A freshly planted tree: one root internode carrying a terminal bud at its tip.
    pub fn plant(position: Vec3, direction: Vec3, params: &SpawnInternodeParams) -> Self {
        let direction = direction.normalize_or(Vec3::Y);
        let mut root = Internode::new(
            position,
            direction,
            params.max_internode_length,
            params.leaf_diameter,
        );
        let bud = Bud::new(0, root.tip(), direction, true).with_perception(&params.bud_perception);
        root.push_bud(0);

        Self {
            id: TreeID::create(),
            internodes: vec![root],
            buds: vec![bud],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.internodes.is_empty()
    }

    pub fn num_terminal_buds(&self) -> usize {
        self.buds.iter().filter(|b| b.is_terminal).count()
    }

    pub fn num_lateral_buds(&self) -> usize {
        self.buds.iter().filter(|b| !b.is_terminal).count()
    }

    /// Validate internode topology and the two-way internode/bud ownership links.
    pub fn validate(&self) -> Result<(), TopologyError> {
        validate_internode_relationships(&self.internodes)?;

        let mut owners: Vec<Option<usize>> = vec![None; self.buds.len()];
        for (i, inode) in self.internodes.iter().enumerate() {
            for &b in inode.buds() {
                let bud = self.buds.get(b).ok_or(TopologyError::IndexOutOfRange {
                    node: i,
                    index: b,
                })?;
                if bud.parent != i || owners[b].is_some() {
                    return Err(TopologyError::BudOwnership {
                        node: i,
                        bud: b,
                        owner: bud.parent,
                    });
                }
                owners[b] = Some(i);
            }
        }
        for (b, owner) in owners.iter().enumerate() {
            if owner.is_none() {
                let parent = self.buds[b].parent;
                return Err(TopologyError::BudOwnership {
                    node: parent,
                    bud: b,
                    owner: parent,
                });
            }
        }
        Ok(())
    }

    /// Replace the internodes with a pruned/reindexed array.
    ///
    /// `dst_to_src[d]` names the old index of new internode `d`. Buds follow
    /// their internode; buds whose internode was dropped are discarded. Bud
    /// order is preserved.
    pub fn apply_pruned(&mut self, mut internodes: Vec<Internode>, dst_to_src: &[InternodeIndex]) {
        let mut src_to_dst = vec![None; self.internodes.len()];
        for (dst, &src) in dst_to_src.iter().enumerate() {
            if let Some(slot) = src_to_dst.get_mut(src) {
                *slot = Some(dst);
            }
        }

        for inode in internodes.iter_mut() {
            inode.clear_buds();
        }

        let old_buds = std::mem::take(&mut self.buds);
        for mut bud in old_buds {
            let Some(dst) = src_to_dst.get(bud.parent).copied().flatten() else {
                continue;
            };
            if internodes[dst].push_bud(self.buds.len()) {
                bud.parent = dst;
                self.buds.push(bud);
            }
        }

        log::debug!(
            "tree {:?}: spliced pruned skeleton ({} -> {} internodes, {} buds kept)",
            self.id,
            self.internodes.len(),
            internodes.len(),
            self.buds.len()
        );
        self.internodes = internodes;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plant() {
        let params = SpawnInternodeParams::default();
        let store = TreeNodeStore::plant(Vec3::ZERO, Vec3::Y, &params);

        assert_eq!(store.internodes.len(), 1);
        assert_eq!(store.buds.len(), 1);
        assert!(store.buds[0].is_terminal);
        assert_eq!(store.internodes[0].buds(), &[0]);
        assert!((store.buds[0].position - store.internodes[0].tip()).length() < 1e-6);
        assert_eq!(store.validate(), Ok(()));
    }

    #[test]
    fn test_validate_detects_orphan_bud() {
        let params = SpawnInternodeParams::default();
        let mut store = TreeNodeStore::plant(Vec3::ZERO, Vec3::Y, &params);
        store.internodes[0].clear_buds();
        assert!(store.validate().is_err());
    }

    #[test]
    fn test_apply_pruned_drops_buds_of_removed_internodes() {
        let params = SpawnInternodeParams::default();
        let mut store = TreeNodeStore::plant(Vec3::ZERO, Vec3::Y, &params);

        // Second internode with a terminal bud; prune it away again.
        let tip = store.internodes[0].tip();
        let mut child = Internode::new(tip, Vec3::Y, 1.0, 0.1);
        child.parent = Some(0);
        store.internodes[0].medial_child = Some(1);
        store.internodes.push(child);
        store.buds[0].is_terminal = false;
        store.buds.push(Bud::new(1, tip + Vec3::Y, Vec3::Y, true));
        store.internodes[1].push_bud(1);
        assert_eq!(store.validate(), Ok(()));

        let mut root = store.internodes[0];
        root.medial_child = None;
        store.apply_pruned(vec![root], &[0]);

        assert_eq!(store.internodes.len(), 1);
        assert_eq!(store.buds.len(), 1);
        assert!(!store.buds[0].is_terminal);
        assert_eq!(store.validate(), Ok(()));
    }
}
