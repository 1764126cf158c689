//! SFS: a small, single-threaded, single-user file system kept in one
//! host file treated as a fixed-size block device.
//!
//! The on-disk layout (superblock, free-space bitmap, descriptor table,
//! packed directory entries, single-level indirect data blocks) matches
//! the original `uvNikita/sfs` exactly; this crate is the core storage
//! engine only — the interactive shell, its argument parsing, and its
//! help text are out of scope (the format is meant to be driven by an
//! external caller).

mod bitmap;
mod descriptor;
mod device;
mod dir;
mod dirent;
mod error;
mod fs;
mod ops;
mod param;
mod path;
mod resolve;
mod superblock;

pub use error::{Result, SfsError};
pub use fs::{FsStats, Sfs};
pub use ops::{DirEntryView, Fid, Stat};
pub use param::{BLOCK_SIZE, FILENAME_SIZE, MAX_PATH_SIZE, MAX_SYMLINK_DEPTH};
pub use descriptor::DescriptorType;
