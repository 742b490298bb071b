//! Directory Walker: depth-first traversal of the root directory and
//! every reachable subdirectory.
//!
//! Each yielded entry also drives the listing printer, a side channel
//! routed through `log` rather than raw `printf`.

use crate::cluster_info::{self, ClusterInfo};
use crate::dirent::{DirEntry, SlotKind};
use crate::error::ScandiskError;
use crate::volume::Volume;

/// Subdirectory recursion depth bound (spec §9: "bounded at ~256").
const MAX_DEPTH: usize = 256;

/// A directory entry plus the path depth it was found at.
#[derive(Debug, Clone)]
pub struct WalkedEntry {
    pub entry: DirEntry,
    pub depth: usize,
}

/// Walks the root directory and every reachable subdirectory,
/// depth-first, returning every non-deleted, non-volume, non-LFN,
/// non-hidden-directory entry.
///
/// Marks each subdirectory's start cluster POINTED on discovery but
/// does not trace its cluster chain further: a multi-cluster
/// subdirectory's 2nd+ cluster will therefore be reported as an orphan
/// by the validator. This replicates the original tool's behavior
/// verbatim (spec §9 Open Question 1) rather than fixing it.
pub fn walk(volume: &Volume, cluster_info: &mut ClusterInfo) -> Result<Vec<WalkedEntry>, ScandiskError> {
    let mut out = Vec::new();
    let root_offsets: Vec<usize> = volume.root_dir_slot_offsets().collect();
    walk_slots(volume, cluster_info, &root_offsets, 0, &mut out)?;
    Ok(out)
}

fn walk_slots(
    volume: &Volume,
    cluster_info: &mut ClusterInfo,
    offsets: &[usize],
    depth: usize,
    out: &mut Vec<WalkedEntry>,
) -> Result<(), ScandiskError> {
    for &off in offsets {
        match volume.classify_slot(off) {
            SlotKind::EndOfDirectory => break,
            SlotKind::Deleted | SlotKind::DotEntry | SlotKind::LongFileName => continue,
            SlotKind::VolumeLabel(name) => {
                log::info!("Volume: {name}");
            }
            SlotKind::Entry(entry) => {
                if entry.is_dir() && entry.attrs.hidden {
                    // Non-goal: hidden directories are not supported (spec §1).
                    continue;
                }

                log_entry(&entry, depth, volume.cluster_bytes());

                if entry.is_dir() {
                    let start = entry.start_cluster;
                    out.push(WalkedEntry { entry, depth });

                    if start != 0 {
                        cluster_info.set(start as u32, cluster_info::POINTED);
                        if depth + 1 < MAX_DEPTH {
                            let sub_offsets = volume.dir_cluster_slot_offsets(start as u32)?;
                            walk_slots(volume, cluster_info, &sub_offsets, depth + 1, out)?;
                        } else {
                            log::warn!("directory recursion depth limit reached at cluster {start}, not descending further");
                        }
                    }
                } else {
                    out.push(WalkedEntry { entry, depth });
                }
            }
        }
    }
    Ok(())
}

fn log_entry(entry: &DirEntry, depth: usize, cluster_bytes: usize) {
    let indent = "    ".repeat(depth);
    if entry.is_dir() {
        log::info!("{indent}{}/ (directory)", entry.name);
    } else {
        let a = &entry.attrs;
        log::info!(
            "{indent}{} ({} bytes) (starting cluster {}) {}{}{}{}",
            entry.name,
            entry.size,
            entry.start_cluster,
            if a.read_only { "r" } else { " " },
            if a.hidden { "h" } else { " " },
            if a.system { "s" } else { " " },
            if a.archive { "a" } else { " " },
        );
        log::debug!(
            "{indent}    expected clusters: {}",
            entry.expected_clusters(cluster_bytes)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch_u16(buf: &mut [u8], off: usize, v: u16) {
        buf[off..off + 2].copy_from_slice(&v.to_le_bytes());
    }

    fn build_image(num_data_sectors: usize) -> Vec<u8> {
        let mut image = vec![0u8; 512 * (1 + 1 + 1 + num_data_sectors)];
        patch_u16(&mut image, 11, 512);
        image[13] = 1;
        patch_u16(&mut image, 14, 1);
        image[16] = 1;
        patch_u16(&mut image, 17, 16);
        patch_u16(&mut image, 19, (3 + num_data_sectors) as u16);
        patch_u16(&mut image, 22, 1);
        image
    }

    fn write_entry(image: &mut [u8], offset: usize, name: &[u8; 8], ext: &[u8; 3], attr: u8, start: u16, size: u32) {
        image[offset..offset + 8].copy_from_slice(name);
        image[offset + 8..offset + 11].copy_from_slice(ext);
        image[offset + 11] = attr;
        image[offset + 26..offset + 28].copy_from_slice(&start.to_le_bytes());
        image[offset + 28..offset + 32].copy_from_slice(&size.to_le_bytes());
    }

    #[test]
    fn walks_root_files_and_skips_deleted_and_dot() {
        let mut image = build_image(8);
        let root_start = 512 + 512;
        write_entry(&mut image, root_start, b"HELLO   ", b"TXT", 0x20, 2, 5);
        image[root_start + 32] = 0xE5; // deleted
        image[root_start + 64] = 0x2E; // dot entry

        let vol = Volume::new(&mut image).unwrap();
        let mut info = ClusterInfo::new(vol.num_clusters());
        let entries = walk(&vol, &mut info).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].entry.name, "HELLO.TXT");
        assert_eq!(entries[0].depth, 0);
    }

    #[test]
    fn subdirectory_start_cluster_is_pointed_without_tracing_chain() {
        let mut image = build_image(8);
        let root_start = 512 + 512;
        write_entry(&mut image, root_start, b"SUBDIR  ", b"   ", 0x10, 2, 0);

        let vol = Volume::new(&mut image).unwrap();
        let mut info = ClusterInfo::new(vol.num_clusters());
        let entries = walk(&vol, &mut info).unwrap();

        assert_eq!(entries.len(), 1);
        assert!(entries[0].entry.is_dir());
        assert!(info.has(2, cluster_info::POINTED));
    }

    #[test]
    fn hidden_directory_is_skipped_entirely() {
        let mut image = build_image(8);
        let root_start = 512 + 512;
        write_entry(&mut image, root_start, b"TRASH   ", b"   ", 0x10 | 0x02, 2, 0);

        let vol = Volume::new(&mut image).unwrap();
        let mut info = ClusterInfo::new(vol.num_clusters());
        let entries = walk(&vol, &mut info).unwrap();

        assert!(entries.is_empty());
        assert!(!info.has(2, cluster_info::POINTED));
    }
}
