//! Driver (spec §4.8): sequences mark-used -> walk-and-trace -> validate
//! -> repair over a mapped FAT12 image, matching `main`'s
//! `check_free_cluster` / `dos_ls` / `validify_cluster_info` ordering in
//! `examples/original_source/scandisk.c`, extended with the repair pass
//! the original never implemented.

use crate::cluster_info::{self, ClusterInfo};
use crate::error::ScandiskError;
use crate::repair;
use crate::tracer;
use crate::validator::{self, ValidationEvent};
use crate::volume::Volume;
use crate::walker;

/// Counts of every anomaly kind handled during one run. New ambient
/// observability (SPEC_FULL §4.8) for the CLI to report on completion;
/// does not change repair behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub less: u32,
    pub more: u32,
    pub dead: u32,
    pub dupe: u32,
    pub orphans_adopted: u32,
    pub ghost_pointers_fixed: u32,
    pub bad_but_pointed: u32,
}

impl RunReport {
    /// True when the run found (and therefore fixed) nothing at all —
    /// the expected result of a second run over an already-repaired
    /// image (P5, idempotence).
    pub fn is_clean(&self) -> bool {
        *self == RunReport::default()
    }
}

/// Runs every pass over `image` in place.
///
/// Ordering (spec §5): mark-used completes before tracing; tracing
/// completes for every directory entry before any repair runs; orphan
/// adoption and the ghost-pointer sweep run last, after per-file
/// repairs, so clusters MORE just freed and clusters DEAD recovery just
/// reconnected are accounted for correctly.
pub fn run(image: &mut [u8]) -> Result<RunReport, ScandiskError> {
    let mut volume = Volume::new(image)?;
    let mut cluster_info = ClusterInfo::new(volume.num_clusters());

    mark_used(&volume, &mut cluster_info)?;

    let entries = walker::walk(&volume, &mut cluster_info)?;

    let mut anomalies = Vec::new();
    for walked in &entries {
        if walked.entry.is_file() {
            if let Some(record) = tracer::trace(&volume, &mut cluster_info, &walked.entry)? {
                anomalies.push(record);
            }
        }
    }

    let mut report = RunReport::default();
    for record in &anomalies {
        repair::repair_file_anomaly(&mut volume, &mut cluster_info, record)?;
        if record.has(cluster_info::LESS) {
            report.less += 1;
        }
        if record.has(cluster_info::DEAD) {
            report.dead += 1;
        }
        if record.has(cluster_info::DUPE) {
            report.dupe += 1;
        }
        if record.has(cluster_info::MORE) {
            report.more += 1;
        }
    }

    let mut next_found_index = 1u32;
    for event in validator::validate(&cluster_info) {
        match event {
            ValidationEvent::BadButPointed(cluster) => {
                log::warn!("cluster {cluster} is marked bad but reachable from a directory entry");
                report.bad_but_pointed += 1;
            }
            ValidationEvent::UsedButNotPointed(cluster) => {
                if repair::adopt_orphan(&mut volume, &mut cluster_info, cluster, next_found_index)? {
                    log::info!("adopted orphan cluster {cluster} as FOUND{next_found_index}.DAT");
                    report.orphans_adopted += 1;
                    next_found_index += 1;
                } else {
                    log::warn!("orphan cluster {cluster} found but no free root directory slot to adopt it");
                }
            }
            ValidationEvent::PointedButFree(cluster) => {
                repair::fix_ghost_pointer(&mut volume, cluster)?;
                report.ghost_pointers_fixed += 1;
            }
        }
    }

    Ok(report)
}

/// Mark-used pass: sets USED (and BAD, for clusters whose own FAT entry
/// is the BAD sentinel) ahead of tracing, per spec §2 item 8's
/// sequencing and `check_free_cluster` in the original.
fn mark_used(volume: &Volume, cluster_info: &mut ClusterInfo) -> Result<(), ScandiskError> {
    for cluster in 2..volume.num_clusters() {
        let entry = volume.fat_get(cluster)?;
        if !volume.is_free(entry) {
            cluster_info.set(cluster, cluster_info::USED);
            if volume.is_bad(entry) {
                cluster_info.set(cluster, cluster_info::BAD);
            }
        }
    }
    Ok(())
}
