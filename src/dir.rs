//! The directory engine: packed directory entries addressed per-block,
//! not as a flat byte stream.
//!
//! Grounded on the original's `add_to_dir`/`rm_from_dir`/`list`'s shared
//! `bf_id`/`block_id` walk. Entries never straddle a block boundary:
//! each block holds `FILES_IN_BLOCK = floor(block_size / sizeof(entry))`
//! whole entries and wastes the remainder, so entry `idx` lives at
//! `(idx / FILES_IN_BLOCK, idx % FILES_IN_BLOCK)` — this is *not* the
//! same addressing the generic [`crate::fs::Sfs::read_at`]/`write_at`
//! byte stream gives (24 doesn't evenly divide 512, so a flat stream
//! would split an entry across two blocks and corrupt it).

use zerocopy::{AsBytes, FromBytes};

use crate::descriptor::Descriptor;
use crate::dirent::RawDirEntry;
use crate::error::{Result, SfsError};
use crate::fs::{Sfs, RAW_DIRENT_SIZE};

impl Sfs {
    fn files_in_block(&self) -> u32 {
        (self.block_size() / RAW_DIRENT_SIZE) as u32
    }

    fn entries_num(&self, dir: &Descriptor) -> u32 {
        dir.size / RAW_DIRENT_SIZE as u32
    }

    fn entry_at(&self, dir: &Descriptor, idx: u32) -> Result<RawDirEntry> {
        let fib = self.files_in_block();
        let block_id = self.index_entry(dir.blocks_id, idx / fib)?;
        let within = (idx % fib) as usize * RAW_DIRENT_SIZE;
        let block = self.device()?.block(block_id)?;
        Ok(RawDirEntry::read_from(&block[within..within + RAW_DIRENT_SIZE])
            .expect("slice is exactly sizeof(RawDirEntry)"))
    }

    fn set_entry_at(&mut self, dir: &Descriptor, idx: u32, entry: &RawDirEntry) -> Result<()> {
        let fib = self.files_in_block();
        let block_id = self.index_entry(dir.blocks_id, idx / fib)?;
        let within = (idx % fib) as usize * RAW_DIRENT_SIZE;
        let block = self.device_mut()?.block_mut(block_id)?;
        entry
            .write_to(&mut block[within..within + RAW_DIRENT_SIZE])
            .expect("slice is exactly sizeof(RawDirEntry)");
        Ok(())
    }

    /// Appends one `(filename, descr_id)` entry to `dir_id`'s entry list.
    /// Mirrors the original's `add_to_dir`: if the current last block
    /// has no room for a whole entry, a new block is allocated and the
    /// entry is written at its start, wasting whatever was left in the
    /// old block (accounted for in `size`, never revisited).
    pub(crate) fn add_to_dir(&mut self, dir_id: u32, file_id: u32, filename: &str) -> Result<()> {
        let mut dir = self.read_descriptor(dir_id)?;
        let bs = self.block_size() as u32;
        let blocks_num = dir.blocks_num(self.block_size());
        let space_left = blocks_num * bs - dir.size;
        let entry_size = RAW_DIRENT_SIZE as u32;

        let idx = self.entries_num(&dir);
        if space_left < entry_size {
            self.grow(&dir, blocks_num)?;
            dir.size += space_left;
        }
        let entry = RawDirEntry::new(filename, file_id);
        self.set_entry_at(&dir, idx, &entry)?;
        dir.size += entry_size;
        self.write_descriptor(&dir)
    }

    /// Finds the entry named `filename` directly inside `dir_id`,
    /// returning its descriptor id. Mirrors the shared entry-scan loop
    /// in the original's `lookup`/`rm_from_dir`/`list`.
    pub(crate) fn find_in_dir(&self, dir_id: u32, filename: &str) -> Result<Option<u32>> {
        let dir = self.read_descriptor(dir_id)?;
        for idx in 0..self.entries_num(&dir) {
            let entry = self.entry_at(&dir, idx)?;
            if entry.name() == Some(filename) {
                return Ok(Some(entry.descr_id()));
            }
        }
        Ok(None)
    }

    /// Lists `dir_id`'s entries as `(name, descr_id)` pairs, in on-disk
    /// order. Mirrors the original's `list`.
    pub(crate) fn list_dir(&self, dir_id: u32) -> Result<Vec<(String, u32)>> {
        let dir = self.read_descriptor(dir_id)?;
        let mut out = Vec::new();
        for idx in 0..self.entries_num(&dir) {
            let entry = self.entry_at(&dir, idx)?;
            if let Some(name) = entry.name() {
                out.push((name.to_string(), entry.descr_id()));
            }
        }
        Ok(out)
    }

    /// Removes the entry named `filename` from `dir_id` by swapping in
    /// the last entry and shrinking, matching the original's
    /// `rm_from_dir` with the index-block-slot fix (see DESIGN.md): when
    /// the removal drops a whole block, the slot cleared in the index
    /// block is the *position* that became vacant (`old_blocks_num - 1`),
    /// not a slot numbered by the freed block's id.
    pub(crate) fn remove_from_dir(&mut self, dir_id: u32, filename: &str) -> Result<()> {
        let mut dir = self.read_descriptor(dir_id)?;
        let count = self.entries_num(&dir);
        let mut del_index = None;
        for idx in 0..count {
            if self.entry_at(&dir, idx)?.name() == Some(filename) {
                del_index = Some(idx);
                break;
            }
        }
        let del_index = del_index.ok_or(SfsError::NotFound)?;
        let last_index = count - 1;
        let last_entry = self.entry_at(&dir, last_index)?;

        if del_index != last_index {
            self.set_entry_at(&dir, del_index, &last_entry)?;
        }
        self.set_entry_at(&dir, last_index, &RawDirEntry::default())?;

        let old_blocks_num = dir.blocks_num(self.block_size());
        dir.size -= RAW_DIRENT_SIZE as u32;
        let new_blocks_num = dir.blocks_num(self.block_size());
        if old_blocks_num != new_blocks_num {
            self.shrink(&dir, old_blocks_num - 1)?;
        }

        self.write_descriptor(&dir)
    }

    /// True if `dir_id` has only the mandatory `.`/`..` entries left.
    pub(crate) fn dir_is_empty(&self, dir_id: u32) -> Result<bool> {
        let dir = self.read_descriptor(dir_id)?;
        Ok(dir.size <= 2 * RAW_DIRENT_SIZE as u32)
    }

    /// Initializes `dir_id` as a directory: sets up `.`/`..`. Used by
    /// `mkfs` for the root and by `create` for every subsequently
    /// created directory.
    pub(crate) fn init_dir(&mut self, dir_id: u32, parent_id: u32) -> Result<()> {
        self.add_to_dir(dir_id, dir_id, ".")?;
        self.add_to_dir(dir_id, parent_id, "..")
    }
}
