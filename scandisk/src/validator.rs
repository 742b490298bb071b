//! Validator (spec §4.6): cross-references the Cluster Info Map's
//! POINTED/USED/BAD bits against each other over `[2, N)`.

use crate::cluster_info::{self, ClusterInfo};

/// One cross-reference finding, consumed by the repairer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationEvent {
    /// BAD and POINTED: some chain reaches a cluster marked bad.
    /// Informational only; spec §4.6 takes no repair action here.
    BadButPointed(u32),
    /// POINTED but not USED: the FAT never marked this cluster
    /// allocated even though some chain reaches it.
    PointedButFree(u32),
    /// USED but not POINTED: an orphan, to be adopted.
    UsedButNotPointed(u32),
}

/// Scans `[2, N)` and reports every cross-reference anomaly.
///
/// A BAD cluster that is not also POINTED is a silent orphan and
/// produces no event, matching spec §4.6 exactly.
pub fn validate(cluster_info: &ClusterInfo) -> Vec<ValidationEvent> {
    let mut out = Vec::new();
    for i in 2..cluster_info.len() {
        let v = cluster_info.get(i);
        if v & cluster_info::BAD != 0 {
            if v & cluster_info::POINTED != 0 {
                out.push(ValidationEvent::BadButPointed(i));
            }
            continue;
        }
        if v & cluster_info::POINTED != 0 && v & cluster_info::USED == 0 {
            out.push(ValidationEvent::PointedButFree(i));
        } else if v & cluster_info::USED != 0 && v & cluster_info::POINTED == 0 {
            out.push(ValidationEvent::UsedButNotPointed(i));
        }
    }
    out
}
