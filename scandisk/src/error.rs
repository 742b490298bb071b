//! Error taxonomy for the scan-and-repair engine.
//!
//! `FatError` covers the volume-geometry/bounds failures the core needs
//! internally; `ScandiskError` is the thin shell the CLI maps onto exit
//! codes, per the taxonomy in spec §7.

use std::path::PathBuf;

use thiserror::Error;

/// Failures from parsing the BPB or indexing into the mapped image.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FatError {
    /// The buffer is smaller than a single sector; no BPB can be read.
    #[error("buffer too small to contain a boot sector")]
    BufferTooSmall,

    /// BPB fields imply a geometry this tool cannot be bit-exact about
    /// (zero bytes-per-sector, zero FATs, zero sectors-per-FAT, etc.).
    #[error("boot sector geometry is not a valid FAT12 volume")]
    BadGeometry,

    /// A computed byte range falls outside the mapped image.
    #[error("access at offset {offset} (len {len}) is out of bounds")]
    OutOfBounds { offset: usize, len: usize },

    /// A cluster number is below 2, the first valid data cluster.
    #[error("cluster {0} is not a valid data cluster")]
    InvalidCluster(u32),
}

/// Top-level error surface returned by the CLI entry point.
#[derive(Debug, Error)]
pub enum ScandiskError {
    /// Missing or malformed command-line invocation.
    #[error("{0}")]
    Usage(String),

    /// Failure opening, mapping, or flushing the image file.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The boot sector / BPB is structurally impossible to work with.
    #[error("structural error: {0}")]
    Structural(#[from] FatError),
}
