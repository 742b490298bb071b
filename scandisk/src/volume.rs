//! A mapped FAT12 volume: the BPB-derived geometry plus every low-level
//! read/write operation the core passes need, all on one struct.
//!
//! This mirrors the teacher's `Fat32Mut<'a> { disk: &'a mut [u8], .. }`,
//! which keeps its FAT accessor methods and its directory-entry accessor
//! methods side by side on the same type rather than splitting them
//! across structs that would otherwise have to fight the borrow checker
//! over who holds the mutable image.

use crate::bpb::{self, BpbParams};
use crate::dirent::{self, DirEntry, DirEntryRef, SlotKind, ENTRY_SIZE};
use crate::error::FatError;
use crate::fat;

/// Read/write view over an entire mapped FAT12 volume.
pub struct Volume<'a> {
    image: &'a mut [u8],
    bpb: BpbParams,
}

impl<'a> Volume<'a> {
    pub fn new(image: &'a mut [u8]) -> Result<Self, FatError> {
        let bpb = bpb::parse_bpb(image)?;
        Ok(Self { image, bpb })
    }

    pub fn bpb(&self) -> &BpbParams {
        &self.bpb
    }

    pub fn cluster_bytes(&self) -> usize {
        self.bpb.cluster_bytes()
    }

    /// Exclusive upper bound on valid data-cluster numbers (`N`, spec §3).
    pub fn num_clusters(&self) -> u32 {
        self.bpb.total_sectors
    }

    // ---------- FAT ----------

    pub fn fat_get(&self, cluster: u32) -> Result<u16, FatError> {
        fat::get(self.image, self.bpb.fat_start_byte(), self.bpb.fat_bytes_len(), cluster)
    }

    /// Writes `entry` at `cluster` in every FAT copy kept in sync; per
    /// spec §6 ("writes go to the first FAT only in this tool") only the
    /// first copy is actually written.
    pub fn fat_set(&mut self, cluster: u32, entry: u16) -> Result<(), FatError> {
        fat::set(self.image, self.bpb.fat_start_byte(), self.bpb.fat_bytes_len(), cluster, entry)
    }

    pub fn is_free(&self, entry: u16) -> bool {
        fat::is_free(entry)
    }

    pub fn is_bad(&self, entry: u16) -> bool {
        fat::is_bad(entry)
    }

    pub fn is_end_of_file(&self, entry: u16) -> bool {
        fat::is_end_of_file(entry)
    }

    pub fn is_valid_cluster(&self, entry: u16) -> bool {
        fat::is_valid_cluster(entry, self.num_clusters())
    }

    /// Byte offset into the image for the data of `cluster` (spec §4.2).
    pub fn cluster_to_addr(&self, cluster: u32) -> Result<usize, FatError> {
        if cluster < fat::FIRST_DATA_CLUSTER {
            return Err(FatError::InvalidCluster(cluster));
        }
        let index = (cluster - fat::FIRST_DATA_CLUSTER) as usize;
        Ok(self.bpb.data_start_byte() + index * self.bpb.cluster_bytes())
    }

    // ---------- directory entries ----------

    /// Byte range of the root directory region.
    fn root_dir_range(&self) -> (usize, usize) {
        let start = self.bpb.root_dir_start_byte();
        (start, start + self.bpb.root_dir_bytes_len())
    }

    /// Byte offset one past the end of the root directory region.
    pub fn root_dir_end_byte(&self) -> usize {
        self.root_dir_range().1
    }

    /// Re-plants the 0x00 end-of-directory terminator at `offset`
    /// (spec §4.7's slot-allocation invariant).
    pub fn plant_end_marker(&mut self, offset: usize) {
        dirent::plant_end_marker(self.image, offset);
    }

    /// Iterates root-directory slot offsets in order.
    pub fn root_dir_slot_offsets(&self) -> impl Iterator<Item = usize> {
        let (start, end) = self.root_dir_range();
        (start..end).step_by(ENTRY_SIZE)
    }

    /// Iterates slot offsets of a subdirectory's cluster chain, in chain
    /// order. Each cluster contributes `cluster_bytes / 32` slots.
    pub fn dir_cluster_slot_offsets(&self, first_cluster: u32) -> Result<Vec<usize>, FatError> {
        let mut offsets = Vec::new();
        for cluster in self.chain_clusters(first_cluster, 4096)? {
            let off = self.cluster_to_addr(cluster)?;
            let len = self.cluster_bytes();
            for slot in (off..off + len).step_by(ENTRY_SIZE) {
                offsets.push(slot);
            }
        }
        Ok(offsets)
    }

    /// Classifies the 32-byte slot at `offset`.
    pub fn classify_slot(&self, offset: usize) -> SlotKind {
        dirent::classify_slot(&self.image[offset..offset + ENTRY_SIZE], offset)
    }

    pub fn rewrite_size(&mut self, entry: DirEntryRef, size: u32) {
        dirent::rewrite_size(self.image, entry, size);
    }

    pub fn write_found_entry(&mut self, offset: usize, index: u32, start_cluster: u16, size: u32) {
        dirent::write_found_entry(self.image, offset, index, start_cluster, size);
    }

    // ---------- FAT chain traversal (read-only helper shared by walker/tracer) ----------

    /// Follows a FAT chain from `start_cluster`, returning every visited
    /// cluster up to (but not including) the terminating EOF marker, or
    /// stopping at `max_clusters` as a loop guard.
    pub fn chain_clusters(&self, start_cluster: u32, max_clusters: usize) -> Result<Vec<u32>, FatError> {
        if start_cluster < fat::FIRST_DATA_CLUSTER {
            return Err(FatError::InvalidCluster(start_cluster));
        }

        let mut out = Vec::new();
        let mut current = start_cluster;
        for _ in 0..max_clusters {
            out.push(current);
            let next = self.fat_get(current)?;
            if self.is_end_of_file(next) {
                break;
            }
            if !self.is_valid_cluster(next) {
                break;
            }
            current = next as u32;
        }
        Ok(out)
    }

    /// Parses every non-end, non-deleted, non-dot entry in the root
    /// directory. Convenience for tests and the listing printer.
    pub fn list_root(&self) -> Result<Vec<DirEntry>, FatError> {
        let mut out = Vec::new();
        for off in self.root_dir_slot_offsets() {
            match self.classify_slot(off) {
                SlotKind::EndOfDirectory => break,
                SlotKind::Entry(e) => out.push(e),
                _ => {}
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch_u16(buf: &mut [u8], off: usize, v: u16) {
        buf[off..off + 2].copy_from_slice(&v.to_le_bytes());
    }

    /// A tiny hand-built FAT12 volume: 1 boot sector, 1 FAT sector (9
    /// usable 12-bit entries given FAT12 packing means entries 0/1 are
    /// reserved), 1 root-dir sector (16 entries), then data clusters.
    fn build_test_image(num_data_sectors: usize) -> Vec<u8> {
        let mut image = vec![0u8; 512 * (1 + 1 + 1 + num_data_sectors)];

        patch_u16(&mut image, 11, 512);
        image[13] = 1; // sectors per cluster
        patch_u16(&mut image, 14, 1); // reserved sectors
        image[16] = 1; // num fats
        patch_u16(&mut image, 17, 16); // root dir entries
        patch_u16(&mut image, 19, (3 + num_data_sectors) as u16);
        patch_u16(&mut image, 22, 1); // sectors per fat

        image
    }

    #[test]
    fn opens_and_derives_offsets() {
        let mut image = build_test_image(8);
        let vol = Volume::new(&mut image).unwrap();
        assert_eq!(vol.bpb().fat_start_byte(), 512);
        assert_eq!(vol.bpb().root_dir_start_byte(), 512 + 512);
        assert_eq!(vol.bpb().data_start_byte(), 512 + 512 + 16 * 32);
    }

    #[test]
    fn fat_round_trips_through_volume() {
        let mut image = build_test_image(8);
        let mut vol = Volume::new(&mut image).unwrap();
        vol.fat_set(2, 0xFFF).unwrap();
        assert_eq!(vol.fat_get(2).unwrap(), 0xFFF);
    }

    #[test]
    fn root_dir_entries_parse_until_end_marker() {
        let mut image = build_test_image(8);
        {
            let root_start = 512 + 512;
            image[root_start] = b'A';
            image[root_start + 8] = b'T';
            image[root_start + 9] = b'X';
            image[root_start + 10] = b'T';
            image[root_start + 11] = 0x20;
            image[root_start + 26] = 2;
            image[root_start + 28] = 5;
        }
        let vol = Volume::new(&mut image).unwrap();
        let root = vol.list_root().unwrap();
        assert_eq!(root.len(), 1);
        assert_eq!(root[0].name, "A.TXT");
        assert_eq!(root[0].start_cluster, 2);
        assert_eq!(root[0].size, 5);
    }
}
