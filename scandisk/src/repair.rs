//! Repairer (spec §4.7): mutates the FAT and directory entries to
//! restore the invariants of spec §3 from the anomaly records the
//! tracer collected and the cross-reference events the validator
//! reports.

use crate::cluster_info::{self, ClusterInfo};
use crate::dirent::{self, DirEntryRef};
use crate::error::ScandiskError;
use crate::fat;
use crate::tracer::AnomalyRecord;
use crate::volume::Volume;

/// Repairs a single file's anomaly, dispatching on the tie-break order
/// of spec §4.5: DEAD and DUPE terminate the chain at a specific
/// cluster and the splice/truncate they perform already yields a
/// consistent size, so they take priority over LESS (mutually
/// exclusive with them by construction) and over a bare MORE, which
/// only applies when none of the other three fired.
pub fn repair_file_anomaly(
    volume: &mut Volume,
    cluster_info: &mut ClusterInfo,
    record: &AnomalyRecord,
) -> Result<(), ScandiskError> {
    if record.has(cluster_info::DEAD) {
        repair_dead(volume, cluster_info, record)
    } else if record.has(cluster_info::DUPE) {
        repair_dupe(volume, cluster_info, record)
    } else if record.has(cluster_info::LESS) {
        repair_less(volume, record)
    } else if record.has(cluster_info::MORE) {
        repair_more(volume, cluster_info, record)
    } else {
        Ok(())
    }
}

/// MORE (spec §4.7): truncate the chain at the E-th cluster and free
/// everything after it, stopping at (but not freeing) a BAD marker.
fn repair_more(volume: &mut Volume, cluster_info: &mut ClusterInfo, record: &AnomalyRecord) -> Result<(), ScandiskError> {
    let entry = &record.entry;
    let steps = entry.expected_clusters(volume.cluster_bytes()).max(1);

    let mut c = entry.start_cluster as u32;
    for _ in 1..steps {
        c = volume.fat_get(c)? as u32;
    }

    let mut tail = volume.fat_get(c)?;
    volume.fat_set(c, fat::EOF_MAX)?;

    loop {
        if volume.is_end_of_file(tail) || volume.is_bad(tail) || !volume.is_valid_cluster(tail) {
            break;
        }
        let cluster = tail as u32;
        let next = volume.fat_get(cluster)?;
        volume.fat_set(cluster, fat::FREE)?;
        cluster_info.clear(cluster, cluster_info::POINTED | cluster_info::USED);
        tail = next;
    }

    Ok(())
}

/// LESS (spec §4.7): the chain already ends where the FAT says it
/// does; only the declared size was wrong.
fn repair_less(volume: &mut Volume, record: &AnomalyRecord) -> Result<(), ScandiskError> {
    let entry = &record.entry;
    let count = volume.chain_clusters(entry.start_cluster as u32, volume.num_clusters() as usize)?.len() as u32;
    volume.rewrite_size(entry.location, count * volume.cluster_bytes() as u32);
    Ok(())
}

/// DUPE (spec §4.7): truncate the chain right before it re-enters a
/// cluster some other (or its own earlier) traversal already pointed.
fn repair_dupe(volume: &mut Volume, cluster_info: &ClusterInfo, record: &AnomalyRecord) -> Result<(), ScandiskError> {
    let entry = &record.entry;
    let mut c = entry.start_cluster as u32;
    let mut count = 0u32;

    loop {
        count += 1;
        if cluster_info.has(c, cluster_info::DUPE) {
            volume.fat_set(c, fat::EOF_MAX)?;
            break;
        }
        c = volume.fat_get(c)? as u32;
    }

    volume.rewrite_size(entry.location, count * volume.cluster_bytes() as u32);
    Ok(())
}

/// DEAD (spec §4.7): conservative recovery. Finds the last cluster `p`
/// whose FAT successor is invalid, scans forward over any contiguous
/// BAD clusters looking for a free tail to splice in, and falls back to
/// truncation if no such tail exists or it is already claimed.
///
/// Sizing (spec §8 S5, §9): the splice count used for the rewritten size
/// is the number of clusters walked to reach `p` plus one for the
/// spliced-in `q`, not the full length of the resulting chain — S5's
/// `50->51->52->53->EOF` splice reports `3 * 512`, even though four
/// clusters (including `53`) end up POINTED and reachable. This is the
/// same "splice count as written, may not match the chain" quirk spec §9
/// calls out and instructs implementations to preserve rather than fix.
fn repair_dead(volume: &mut Volume, cluster_info: &mut ClusterInfo, record: &AnomalyRecord) -> Result<(), ScandiskError> {
    let entry = &record.entry;

    let mut p = entry.start_cluster as u32;
    let mut steps_to_p = 0u32;
    loop {
        steps_to_p += 1;
        if cluster_info.has(p, cluster_info::DEAD) {
            break;
        }
        p = volume.fat_get(p)? as u32;
    }

    let num_clusters = volume.num_clusters();
    let mut candidate = p + 1;
    let mut splice_target = None;
    while candidate < num_clusters {
        if volume.is_bad(volume.fat_get(candidate)?) {
            candidate += 1;
            continue;
        }
        splice_target = Some(candidate);
        break;
    }

    let count = match splice_target {
        Some(q) if !cluster_info.has(q, cluster_info::POINTED) => {
            volume.fat_set(p, q as u16)?;
            for cluster in volume.chain_clusters(q, num_clusters as usize)? {
                cluster_info.set(cluster, cluster_info::POINTED);
            }
            steps_to_p + 1
        }
        _ => {
            volume.fat_set(p, fat::EOF_MAX)?;
            steps_to_p
        }
    };

    volume.rewrite_size(entry.location, count * volume.cluster_bytes() as u32);
    Ok(())
}

/// Orphan adoption (spec §4.7): isolates `cluster` as a one-cluster
/// chain and allocates a `FOUNDnnn.DAT` root entry for it. Returns
/// `false` (no mutation) if the root directory has no free slot.
pub fn adopt_orphan(
    volume: &mut Volume,
    cluster_info: &mut ClusterInfo,
    cluster: u32,
    index: u32,
) -> Result<bool, ScandiskError> {
    let Some((offset, was_terminator)) = find_free_dir_slot(volume) else {
        return Ok(false);
    };

    volume.fat_set(cluster, fat::EOF_MAX)?;
    volume.write_found_entry(offset, index, cluster as u16, volume.cluster_bytes() as u32);
    if was_terminator {
        let next = offset + dirent::ENTRY_SIZE;
        if next < volume.root_dir_end_byte() {
            volume.plant_end_marker(next);
        }
    }
    cluster_info.set(cluster, cluster_info::POINTED);

    Ok(true)
}

/// Ghost-pointer sweep (spec §4.7): a cluster the FAT says is free but
/// some chain still points to gets isolated as its own EOF chain.
pub fn fix_ghost_pointer(volume: &mut Volume, cluster: u32) -> Result<(), ScandiskError> {
    volume.fat_set(cluster, fat::EOF_MAX)
}

/// Finds the first EMPTY or DELETED root-directory slot, per spec
/// §4.7's "the new dirent occupies the first available root-directory
/// slot". Returns whether the slot used to be the EMPTY terminator, so
/// the caller knows whether to re-plant it one slot forward.
fn find_free_dir_slot(volume: &Volume) -> Option<(usize, bool)> {
    for offset in volume.root_dir_slot_offsets() {
        match volume.classify_slot(offset) {
            crate::dirent::SlotKind::EndOfDirectory => return Some((offset, true)),
            crate::dirent::SlotKind::Deleted => return Some((offset, false)),
            _ => {}
        }
    }
    None
}
