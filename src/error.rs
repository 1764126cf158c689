//! The closed status-code vocabulary, expressed as a Rust error enum.
//!
//! Every variant here corresponds 1:1 to one `STATUS_*` code of the
//! original `sfs.h`. Operations that used to return a bare status code
//! now return `Result<T, SfsError>`; operations that returned a pointer
//! or an `fid`/`-1` pair now return `Result<T, SfsError>` with `T` carrying
//! the success payload instead of overloading a sentinel.

use thiserror::Error;

/// Everything that can go wrong while using a mounted (or not-yet-mounted)
/// file system.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SfsError {
    /// The backing file could not be opened, mapped, flushed, or is
    /// malformed (wrong size, bad magic-equivalent layout).
    #[error("device error: {0}")]
    Device(#[from] std::io::Error),

    /// An operation that requires a mounted file system was attempted
    /// before `mount` or after `umount`.
    #[error("file system is not mounted")]
    NotMount,

    /// The descriptor table has no free slot left.
    #[error("maximum number of files reached")]
    MaxFilesReached,

    /// The block allocator has no free block left.
    #[error("no space left on device")]
    NoSpaceLeft,

    /// A path, fid, or descriptor id did not resolve to anything.
    #[error("not found")]
    NotFound,

    /// `create_file`/`make_dir`/`mksymlink` targeted a path that already
    /// exists.
    #[error("already exists")]
    Exists,

    /// An operation that requires a regular file or symlink was given a
    /// directory.
    #[error("not a file")]
    NotFile,

    /// An operation that requires a directory was given a non-directory.
    #[error("not a directory")]
    NotDir,

    /// A read/write offset or length falls outside the valid range.
    #[error("invalid size or offset")]
    SizeErr,

    /// `remove_dir` targeted a directory that still has entries besides
    /// `.` and `..`.
    #[error("directory not empty")]
    NotEmpty,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, SfsError>;
