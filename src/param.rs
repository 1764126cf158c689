//! Compile-time layout constants.
//!
//! The on-disk format has no runtime configuration surface: block size and
//! record shapes are fixed by construction, exactly as the original's
//! `#define`s fixed them. Mirrors the teacher's own `param.rs` in spirit
//! (a flat module of `pub const`s consumed throughout the crate).

/// Size of a block, in bytes.
pub const BLOCK_SIZE: usize = 512;

/// Fraction of the device reserved for the descriptor table.
pub const DESCRIPTORS_PART: f64 = 0.05;

/// Bytes reserved for a packed filename in a directory entry.
pub const FILENAME_SIZE: usize = 20;

/// Number of open-file-handle slots.
pub const FIDS_NUM: usize = 512;

/// Maximum length of an absolute path kept in `work_dir`.
pub const MAX_PATH_SIZE: usize = 512;

/// Descriptor id of the file system root directory.
pub const ROOT_ID: u32 = 0;

/// Maximum symlink-following depth before `lookup` gives up.
///
/// The original has no loop detection at all; this is the crate's own
/// addition (see SPEC_FULL.md, Design Notes).
pub const MAX_SYMLINK_DEPTH: u32 = 40;

static_assertions::const_assert!(BLOCK_SIZE % 2 == 0);
