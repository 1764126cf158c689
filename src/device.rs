//! The device layer: a bounds-checked, block-addressed view over a
//! memory-mapped backing file.
//!
//! Grounded on the original's `map_fs`/`umap_fs`/`msync`/`munmap`. The
//! teacher's own block layer (`bio.rs`, `hal.rs`) sits in front of a
//! disk *driver* and a buffer *cache* — both irrelevant here (no caching
//! layer per spec Non-goals; there is exactly one in-memory view, the
//! mapping itself). What's kept from the teacher's shape is a typed,
//! range-checked accessor in place of raw pointer arithmetic (Design
//! Notes, SPEC_FULL.md §9): every access goes through [`Device::block`]
//! / [`Device::block_mut`], which panics on an out-of-range block id
//! rather than reading past the mapping.

use std::fs::{File, OpenOptions};
use std::path::Path;

use memmap2::MmapMut;

use crate::error::{Result, SfsError};
use crate::param::BLOCK_SIZE;

/// A memory-mapped view of the backing file, sliced into fixed-size
/// blocks.
pub struct Device {
    map: MmapMut,
    file: File,
}

impl Device {
    /// Opens `path` as a backing file.
    ///
    /// Fails with [`SfsError::Device`] unless the path exists and its
    /// size is a non-zero multiple of [`BLOCK_SIZE`].
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let len = file.metadata()?.len();
        if len == 0 || len % BLOCK_SIZE as u64 != 0 {
            return Err(SfsError::Device(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("backing file size {len} is not a non-zero multiple of {BLOCK_SIZE}"),
            )));
        }
        // SAFETY: the file is opened for exclusive use by this `Device`
        // for its whole lifetime; no other process is assumed to touch it
        // concurrently (multi-process concurrency is a spec Non-goal).
        let map = unsafe { MmapMut::map_mut(&file)? };
        Ok(Device { map, file })
    }

    pub fn total_size(&self) -> usize {
        self.map.len()
    }

    pub fn blocks_num(&self) -> u32 {
        (self.total_size() / BLOCK_SIZE) as u32
    }

    fn check_block(&self, block_id: u32) -> Result<()> {
        if (block_id as u64) * (BLOCK_SIZE as u64) >= self.total_size() as u64 {
            return Err(SfsError::Device(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("block {block_id} is out of range"),
            )));
        }
        Ok(())
    }

    fn check_range(&self, offset: usize, len: usize) -> Result<()> {
        if offset.checked_add(len).map_or(true, |end| end > self.total_size()) {
            return Err(SfsError::Device(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("range {offset}..{offset}+{len} is out of range"),
            )));
        }
        Ok(())
    }

    /// Returns a read-only view of block `block_id`.
    pub fn block(&self, block_id: u32) -> Result<&[u8]> {
        self.check_block(block_id)?;
        let start = block_id as usize * BLOCK_SIZE;
        Ok(&self.map[start..start + BLOCK_SIZE])
    }

    /// Returns a mutable view of block `block_id`.
    pub fn block_mut(&mut self, block_id: u32) -> Result<&mut [u8]> {
        self.check_block(block_id)?;
        let start = block_id as usize * BLOCK_SIZE;
        Ok(&mut self.map[start..start + BLOCK_SIZE])
    }

    /// Returns a read-only byte range, unaligned to block boundaries.
    ///
    /// Used for the descriptor table and superblock, whose records don't
    /// necessarily land on block boundaries (`sizeof(Descriptor)` is 20
    /// bytes, which doesn't evenly divide [`BLOCK_SIZE`]).
    pub fn slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.check_range(offset, len)?;
        Ok(&self.map[offset..offset + len])
    }

    /// Returns a mutable byte range, unaligned to block boundaries.
    pub fn slice_mut(&mut self, offset: usize, len: usize) -> Result<&mut [u8]> {
        self.check_range(offset, len)?;
        Ok(&mut self.map[offset..offset + len])
    }

    /// Requests a best-effort sync of the mapping to the backing file.
    pub fn flush(&self) -> Result<()> {
        self.map.flush()?;
        Ok(())
    }

    /// Flushes and tears down the mapping.
    pub fn release(self) -> Result<()> {
        self.flush()?;
        drop(self.map);
        drop(self.file);
        Ok(())
    }
}
