//! Image Mapper (spec §4.1): opens a disk image read/write and exposes
//! it as a contiguous, mutable byte buffer backed by a memory mapping.
//!
//! Mirrors `mmap_file`/`unmmap_file` from the original C tool, built on
//! `memmap2` the way the pack's other disk-image tooling does.

use std::fs::OpenOptions;
use std::ops::{Deref, DerefMut};
use std::path::Path;

use memmap2::MmapMut;

use crate::error::ScandiskError;

/// A disk image mapped read/write into this process's address space.
///
/// Dereferences to `&[u8]`/`&mut [u8]` so the rest of the core can treat
/// the whole volume as one mutable byte slice, the way the teacher's
/// `Fat32Mut<'a> { disk: &'a mut [u8], .. }` does over a `Vec<u8>`.
/// Dropping flushes the mapping back to the file.
pub struct MappedImage {
    mmap: MmapMut,
}

impl MappedImage {
    /// Opens `path` read/write and maps the whole file.
    pub fn open(path: &Path) -> Result<Self, ScandiskError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| ScandiskError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        // SAFETY: the image file is not expected to be modified by any
        // other process while this tool runs (spec §5: "the image is the
        // sole shared resource... the tool does not lock it beyond the
        // operating system's default mapping semantics").
        let mmap = unsafe { MmapMut::map_mut(&file) }.map_err(|source| ScandiskError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self { mmap })
    }

    /// Flushes pending writes to the backing file without unmapping.
    pub fn flush(&self) -> Result<(), ScandiskError> {
        self.mmap.flush().map_err(|source| ScandiskError::Io {
            path: std::path::PathBuf::new(),
            source,
        })
    }
}

impl Deref for MappedImage {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.mmap
    }
}

impl DerefMut for MappedImage {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.mmap
    }
}
