//! A FAT12 filesystem consistency checker and repair tool.
//!
//! This crate walks a memory-mapped FAT12 volume's directory tree and
//! File Allocation Table, classifies every file's cluster chain into a
//! set of anomaly categories, cross-references cluster reachability
//! against the FAT's own allocation state, and writes corrections back
//! into the image so the resulting volume is internally consistent.
//!
//! The core passes run in a fixed order (see [`driver::run`]):
//! mark-used, walk-and-trace, validate, repair.

pub mod bpb;
pub mod cluster_info;
pub mod dirent;
pub mod driver;
pub mod error;
pub mod fat;
pub mod mapper;
pub mod repair;
pub mod tracer;
pub mod validator;
pub mod volume;
pub mod walker;

pub use driver::{run, RunReport};
pub use error::{FatError, ScandiskError};
pub use mapper::MappedImage;
pub use volume::Volume;
