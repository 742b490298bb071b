//! Chain Tracer (spec §4.5): walks a file's FAT chain from its recorded
//! start cluster, marking clusters POINTED along the way and detecting
//! the LESS/DEAD/DUPE/MORE anomalies in the tie-break order spec §4.5
//! specifies (at most one of LESS/DEAD/DUPE terminates a chain; MORE is
//! orthogonal and recorded in addition).

use crate::cluster_info::{self, ClusterInfo};
use crate::dirent::DirEntry;
use crate::error::ScandiskError;
use crate::volume::Volume;

/// A dirent reference plus the union of anomaly flags the tracer
/// observed while walking its chain (spec §3's anomaly record).
#[derive(Debug, Clone)]
pub struct AnomalyRecord {
    pub entry: DirEntry,
    pub flags: u8,
}

impl AnomalyRecord {
    pub fn has(&self, mask: u8) -> bool {
        self.flags & mask != 0
    }
}

/// Traces `entry`'s FAT chain, mutating `cluster_info` as it goes.
///
/// Returns `None` for a clean chain, and also for a NULL (empty, zero
/// start-cluster) file: per spec §4.5, "a NULL-only file yields no
/// repair action", so no anomaly record is created for it even though
/// the NULL condition is real.
pub fn trace(
    volume: &Volume,
    cluster_info: &mut ClusterInfo,
    entry: &DirEntry,
) -> Result<Option<AnomalyRecord>, ScandiskError> {
    if entry.start_cluster == 0 {
        return Ok(None);
    }

    let expected = entry.expected_clusters(volume.cluster_bytes());

    let mut flags = 0u8;
    let mut count = 0u32;
    let mut c = entry.start_cluster as u32;

    loop {
        count += 1;
        cluster_info.set(c, cluster_info::POINTED);
        let next = volume.fat_get(c)?;

        if count < expected && volume.is_end_of_file(next) {
            cluster_info.set(c, cluster_info::LESS);
            flags |= cluster_info::LESS;
            break;
        } else if !volume.is_end_of_file(next) && !volume.is_valid_cluster(next) {
            cluster_info.set(c, cluster_info::DEAD);
            flags |= cluster_info::DEAD;
            break;
        } else if volume.is_valid_cluster(next) && cluster_info.has(next, cluster_info::POINTED) {
            cluster_info.set(c, cluster_info::DUPE);
            flags |= cluster_info::DUPE;
            break;
        } else if volume.is_end_of_file(next) {
            break;
        } else {
            c = next as u32;
        }
    }

    if count > expected {
        flags |= cluster_info::MORE;
    }

    if flags == 0 {
        Ok(None)
    } else {
        Ok(Some(AnomalyRecord {
            entry: entry.clone(),
            flags,
        }))
    }
}
