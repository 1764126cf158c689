//! The packed directory entry: a 20-byte filename plus a 4-byte
//! descriptor id.
//!
//! Grounded on the original's `file_struct` and on the teacher's
//! `Dirent` (`fs/ufs/inode.rs`), whose `set_name`/`get_name` NUL-handling
//! this keeps: a name exactly `FILENAME_SIZE` bytes long carries no
//! terminator, anything shorter is NUL-padded.

use zerocopy::{AsBytes, FromBytes};

use crate::param::FILENAME_SIZE;

/// Host-endian, bit-exact mirror of one packed directory entry.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, AsBytes, FromBytes)]
pub struct RawDirEntry {
    pub filename: [u8; FILENAME_SIZE],
    pub descr_id: i32,
}

static_assertions::const_assert_eq!(core::mem::size_of::<RawDirEntry>(), FILENAME_SIZE + 4);

impl RawDirEntry {
    pub fn new(name: &str, descr_id: u32) -> Self {
        let bytes = name.as_bytes();
        debug_assert!(bytes.len() <= FILENAME_SIZE, "filename too long: {name}");
        let mut filename = [0u8; FILENAME_SIZE];
        let len = bytes.len().min(FILENAME_SIZE);
        filename[..len].copy_from_slice(&bytes[..len]);
        RawDirEntry {
            filename,
            descr_id: descr_id as i32,
        }
    }

    /// Returns the entry's packed filename with the trailing NUL padding
    /// stripped, or `None` if it isn't valid UTF-8.
    pub fn name(&self) -> Option<&str> {
        let len = self
            .filename
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(FILENAME_SIZE);
        core::str::from_utf8(&self.filename[..len]).ok()
    }

    pub fn descr_id(&self) -> u32 {
        self.descr_id as u32
    }

    pub fn is_empty_slot(&self) -> bool {
        self.filename == [0u8; FILENAME_SIZE] && self.descr_id == 0
    }

    pub fn clear(&mut self) {
        self.filename = [0u8; FILENAME_SIZE];
        self.descr_id = 0;
    }
}
