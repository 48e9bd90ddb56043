//! Flat binary codec for [`TreeNodeStore`].
//!
//! Layout, with every scalar little-endian:
//!
//! ```text
//! u64 internode count | InternodeRecord * count
//! u64 bud count       | BudRecord * count
//! ```
//!
//! Records are built from 4-byte words only, so the byte layout is the same
//! on every target. There is no header or version field.

use std::mem::size_of;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::skeleton::{
    Bud, Internode, InternodeIndex, TreeBudID, TreeID, TreeInternodeID, TreeNodeStore,
    MAX_NUM_BUDS_PER_INTERNODE,
};

const NO_INDEX: i32 = -1;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct InternodeRecord {
    pub id_lo: u32,
    pub id_hi: u32,
    pub position: [f32; 3],
    pub render_position: [f32; 3],
    pub direction: [f32; 3],
    pub length: f32,
    pub length_scale: f32,
    pub diameter: f32,
    /// -1 when absent
    pub parent: i32,
    pub medial_child: i32,
    pub lateral_child: i32,
    pub gravelius_order: u32,
    pub bud_indices: [u32; MAX_NUM_BUDS_PER_INTERNODE],
    pub num_buds: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct BudRecord {
    pub id_lo: u32,
    pub id_hi: u32,
    pub position: [f32; 3],
    pub direction: [f32; 3],
    pub is_terminal: u32,
    pub parent: u32,
    pub v: f32,
    pub q: f32,
    pub perception_angle: f32,
    pub perception_distance: f32,
    pub occupancy_radius: f32,
}

fn split_id(id: u64) -> (u32, u32) {
    (id as u32, (id >> 32) as u32)
}

fn encode_index(index: Option<InternodeIndex>) -> i32 {
    index.map_or(NO_INDEX, |i| i32::try_from(i).unwrap_or(i32::MAX))
}

/// `Some(None)` for the absent marker, `None` when out of range.
fn decode_index(raw: i32, bound: usize) -> Option<Option<InternodeIndex>> {
    if raw == NO_INDEX {
        return Some(None);
    }
    let index = usize::try_from(raw).ok()?;
    (index < bound).then_some(Some(index))
}

impl From<&Internode> for InternodeRecord {
    fn from(inode: &Internode) -> Self {
        let (id_lo, id_hi) = split_id(inode.id.0);
        let mut bud_indices = [0u32; MAX_NUM_BUDS_PER_INTERNODE];
        for (slot, &b) in bud_indices.iter_mut().zip(inode.buds()) {
            *slot = u32::try_from(b).unwrap_or(u32::MAX);
        }
        Self {
            id_lo,
            id_hi,
            position: inode.position.to_array(),
            render_position: inode.render_position.to_array(),
            direction: inode.direction.to_array(),
            length: inode.length,
            length_scale: inode.length_scale,
            diameter: inode.diameter,
            parent: encode_index(inode.parent),
            medial_child: encode_index(inode.medial_child),
            lateral_child: encode_index(inode.lateral_child),
            gravelius_order: inode.gravelius_order,
            bud_indices,
            num_buds: inode.buds().len() as u32,
        }
    }
}

impl InternodeRecord {
    /// Rebuild an internode with a fresh identity, checking indices against
    /// the array sizes.
    fn to_internode(&self, num_internodes: usize, num_buds: usize) -> Option<Internode> {
        let count = self.num_buds as usize;
        if count > MAX_NUM_BUDS_PER_INTERNODE {
            return None;
        }
        let mut bud_indices = [0usize; MAX_NUM_BUDS_PER_INTERNODE];
        for (slot, &b) in bud_indices.iter_mut().zip(&self.bud_indices[..count]) {
            let b = b as usize;
            if b >= num_buds {
                return None;
            }
            *slot = b;
        }

        Some(Internode {
            id: TreeInternodeID::create(),
            position: Vec3::from_array(self.position),
            render_position: Vec3::from_array(self.render_position),
            direction: Vec3::from_array(self.direction),
            length: self.length,
            length_scale: self.length_scale,
            diameter: self.diameter,
            parent: decode_index(self.parent, num_internodes)?,
            medial_child: decode_index(self.medial_child, num_internodes)?,
            lateral_child: decode_index(self.lateral_child, num_internodes)?,
            gravelius_order: self.gravelius_order,
            bud_indices,
            num_buds: count,
        })
    }
}

impl From<&Bud> for BudRecord {
    fn from(bud: &Bud) -> Self {
        let (id_lo, id_hi) = split_id(bud.id.0);
        Self {
            id_lo,
            id_hi,
            position: bud.position.to_array(),
            direction: bud.direction.to_array(),
            is_terminal: bud.is_terminal as u32,
            parent: u32::try_from(bud.parent).unwrap_or(u32::MAX),
            v: bud.v,
            q: bud.q,
            perception_angle: bud.perception_angle,
            perception_distance: bud.perception_distance,
            occupancy_radius: bud.occupancy_radius,
        }
    }
}

impl BudRecord {
    fn to_bud(&self, num_internodes: usize) -> Option<Bud> {
        let parent = self.parent as usize;
        if parent >= num_internodes || self.is_terminal > 1 {
            return None;
        }
        Some(Bud {
            id: TreeBudID::create(),
            position: Vec3::from_array(self.position),
            direction: Vec3::from_array(self.direction),
            is_terminal: self.is_terminal == 1,
            parent,
            v: self.v,
            q: self.q,
            perception_angle: self.perception_angle,
            perception_distance: self.perception_distance,
            occupancy_radius: self.occupancy_radius,
        })
    }
}

fn write_array<R: Pod>(out: &mut Vec<u8>, mut records: Vec<R>) {
    out.extend_from_slice(&(records.len() as u64).to_le_bytes());
    for word in bytemuck::cast_slice_mut::<R, u32>(&mut records) {
        *word = word.to_le();
    }
    out.extend_from_slice(bytemuck::cast_slice(&records));
}

fn read_array<R: Pod>(bytes: &[u8], cursor: &mut usize) -> Option<Vec<R>> {
    let body_start = cursor.checked_add(8)?;
    let count_bytes: [u8; 8] = bytes.get(*cursor..body_start)?.try_into().ok()?;
    let count = usize::try_from(u64::from_le_bytes(count_bytes)).ok()?;
    let body_end = body_start.checked_add(count.checked_mul(size_of::<R>())?)?;
    let body = bytes.get(body_start..body_end)?;

    let mut records: Vec<R> = body
        .chunks_exact(size_of::<R>())
        .map(bytemuck::pod_read_unaligned)
        .collect();
    for word in bytemuck::cast_slice_mut::<R, u32>(&mut records) {
        *word = u32::from_le(*word);
    }
    *cursor = body_end;
    Some(records)
}

/// Encode a store: internode array, then bud array.
pub fn serialize(store: &TreeNodeStore) -> Vec<u8> {
    let internodes: Vec<InternodeRecord> =
        store.internodes.iter().map(InternodeRecord::from).collect();
    let buds: Vec<BudRecord> = store.buds.iter().map(BudRecord::from).collect();

    let mut bytes = Vec::with_capacity(
        16 + internodes.len() * size_of::<InternodeRecord>() + buds.len() * size_of::<BudRecord>(),
    );
    write_array(&mut bytes, internodes);
    write_array(&mut bytes, buds);
    bytes
}

/// Decode a store written by [`serialize`].
///
/// Persisted IDs are discarded: the tree, every internode and every bud get
/// fresh identities. Returns `None` on truncated or trailing bytes, on
/// out-of-range indices and on inconsistent topology.
pub fn deserialize(bytes: &[u8]) -> Option<TreeNodeStore> {
    let mut cursor = 0;
    let internode_records: Vec<InternodeRecord> = read_array(bytes, &mut cursor)?;
    let bud_records: Vec<BudRecord> = read_array(bytes, &mut cursor)?;
    if cursor != bytes.len() {
        return None;
    }

    let num_internodes = internode_records.len();
    let num_buds = bud_records.len();
    let internodes = internode_records
        .iter()
        .map(|r| r.to_internode(num_internodes, num_buds))
        .collect::<Option<Vec<_>>>()?;
    let buds = bud_records
        .iter()
        .map(|r| r.to_bud(num_internodes))
        .collect::<Option<Vec<_>>>()?;

    let store = TreeNodeStore {
        id: TreeID::create(),
        internodes,
        buds,
    };
    store.validate().ok()?;
    Some(store)
}
