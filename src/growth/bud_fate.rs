//! Bud-fate growth step.
//!
//! Each bud turns its accumulated signal `v` into a number of metamers and,
//! when allowed, grows a shoot of that many internodes. Consumed buds are
//! removed in one batch afterwards, then diameters are recomputed.

use std::collections::HashMap;

use glam::Vec3;

use super::diameter::PipeModel;
use super::params::SpawnInternodeParams;
use crate::skeleton::{
    debug_validate, update_render_positions, Bud, Internode, InternodeIndex, TreeBudID,
    TreeNodeStore,
};

/// Environment-model output for one bud.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnvironmentInput {
    /// Preferred growth direction; zero means no preference
    pub direction: Vec3,
}

pub type EnvironmentInputs = HashMap<TreeBudID, EnvironmentInput>;

/// What one growth step changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BudFateReport {
    pub spawned_internodes: usize,
    pub consumed_buds: usize,
    pub created_buds: usize,
}

/// Perform one discrete growth step in place.
pub fn bud_fate(
    store: &mut TreeNodeStore,
    inputs: &EnvironmentInputs,
    params: &SpawnInternodeParams,
) -> BudFateReport {
    let mut report = BudFateReport::default();
    let mut consumed = Vec::new();
    let num_existing = store.internodes.len();

    for i in 0..num_existing {
        // Shoots never attach buds to their origin, so this list is stable.
        let num_buds = store.internodes[i].num_buds;
        for k in 0..num_buds {
            let bud_index = store.internodes[i].bud_indices[k];
            let bud = store.buds[bud_index];
            let remaining = params
                .max_num_internodes
                .saturating_sub(store.internodes.len());
            let num_metamers = num_metamers(&bud, params, remaining);

            if num_metamers == 0 || bud.q == 0.0 {
                continue;
            }
            if !bud.is_terminal && bud.position.y < params.min_lateral_branch_y {
                continue;
            }

            let origin = store.internodes[i];
            let slot_taken = if bud.is_terminal {
                origin.medial_child.is_some()
            } else {
                origin.lateral_child.is_some()
            };
            debug_assert!(!slot_taken, "bud {bud_index} would overwrite a child of internode {i}");
            if slot_taken {
                continue;
            }

            let environment_direction = inputs.get(&bud.id).map_or(bud.direction, |e| e.direction);
            let shoot_dir =
                params
                    .shoot_direction
                    .evaluate(&origin, &bud, environment_direction, params);
            if !params.allow_spawn.evaluate(&origin, &bud, shoot_dir, params) {
                continue;
            }

            report.created_buds += grow_shoot(store, i, &bud, num_metamers, shoot_dir, params);
            report.spawned_internodes += num_metamers;
            consumed.push(bud_index);
        }
    }

    report.consumed_buds = consumed.len();
    remove_grown_buds(store, &mut consumed);
    PipeModel::from(params).apply(&mut store.internodes);
    update_render_positions(&mut store.internodes);

    debug_validate(&store.internodes);
    debug_assert!(store.validate().is_ok());
    log::debug!(
        "tree {:?}: bud fate spawned {} internodes, consumed {} buds, created {} buds",
        store.id,
        report.spawned_internodes,
        report.consumed_buds,
        report.created_buds
    );
    report
}

/// `floor(v)`, clamped to the per-cycle limit and the remaining budget.
fn num_metamers(bud: &Bud, params: &SpawnInternodeParams, remaining: usize) -> usize {
    // NaN and negative signals saturate to zero.
    let wanted = bud.v.floor().max(0.0) as usize;
    wanted
        .min(params.max_num_metamers_per_growth_cycle as usize)
        .min(remaining)
}

/// Append `num_metamers` internodes along `shoot_dir`, starting at the bud.
///
/// Returns the number of buds created.
fn grow_shoot(
    store: &mut TreeNodeStore,
    origin: InternodeIndex,
    bud: &Bud,
    num_metamers: usize,
    shoot_dir: Vec3,
    params: &SpawnInternodeParams,
) -> usize {
    let inode_len = (bud.v / num_metamers as f32 * params.internode_length_scale)
        .max(params.min_internode_length)
        .min(params.max_internode_length);
    let gravelius_order =
        store.internodes[origin].gravelius_order + if bud.is_terminal { 0 } else { 1 };

    let mut created = 0;
    let mut parent = origin;
    let mut position = bud.position;

    for m in 0..num_metamers {
        let index = store.internodes.len();
        let mut inode = Internode::new(position, shoot_dir, inode_len, params.leaf_diameter);
        inode.parent = Some(parent);
        inode.gravelius_order = gravelius_order;
        inode.length_scale = params.initial_length_scale;

        if m == 0 && !bud.is_terminal {
            store.internodes[parent].lateral_child = Some(index);
        } else {
            store.internodes[parent].medial_child = Some(index);
        }

        let tip = inode.tip();
        if tip.y >= params.min_lateral_branch_y {
            let direction = params.lateral_bud_direction.evaluate(&inode, index, params);
            let lateral = Bud::new(index, tip, direction, false)
                .with_perception(&params.bud_perception);
            inode.push_bud(store.buds.len());
            store.buds.push(lateral);
            created += 1;
        }
        if m + 1 == num_metamers {
            let terminal = Bud::new(index, tip, shoot_dir, true)
                .with_perception(&params.bud_perception);
            inode.push_bud(store.buds.len());
            store.buds.push(terminal);
            created += 1;
        }

        store.internodes.push(inode);
        parent = index;
        position = tip;
    }
    created
}

/// Remove consumed buds, preserving the order of the survivors.
///
/// Every remaining bud reference drops by the number of removed indices below
/// it; references to removed buds disappear from their internode.
pub fn remove_grown_buds(store: &mut TreeNodeStore, consumed: &mut Vec<usize>) {
    consumed.sort_unstable();
    consumed.dedup();
    if consumed.is_empty() {
        return;
    }

    let mut removed = vec![false; store.buds.len()];
    for &b in consumed.iter() {
        removed[b] = true;
    }
    let mut removed_below = Vec::with_capacity(store.buds.len());
    let mut count = 0;
    for &r in &removed {
        removed_below.push(count);
        count += usize::from(r);
    }

    for inode in store.internodes.iter_mut() {
        let old = inode.bud_indices;
        let old_count = inode.num_buds;
        inode.clear_buds();
        for &b in &old[..old_count] {
            if !removed[b] {
                inode.push_bud(b - removed_below[b]);
            }
        }
    }

    let mut k = 0;
    store.buds.retain(|_| {
        let keep = !removed[k];
        k += 1;
        keep
    });
    consumed.clear();
}
