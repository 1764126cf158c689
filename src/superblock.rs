//! The on-disk superblock: block 0 of the device.
//!
//! Grounded on the original's `fs_struct` and on the teacher's own
//! `Superblock` (`fs/superblock.rs`, `fs/ufs/mod.rs`'s `superblock.rs`),
//! generalized from a magic-checked, log-aware record to this format's
//! plain fixed layout (no magic number, no log fields — the original
//! carries none either).

use static_assertions::const_assert;
use zerocopy::{AsBytes, FromBytes};

use crate::param::BLOCK_SIZE;

/// Host-endian, bit-exact mirror of block 0.
///
/// All fields are `i32`, matching the original's `int` fields exactly
/// (including the sign — this port keeps signed fields rather than
/// "fixing" them to `u32`, since the on-disk layout must stay bit-exact
/// and nothing here is ever negative in practice).
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, AsBytes, FromBytes)]
pub struct Superblock {
    pub block_size: i32,
    pub blocks_num: i32,
    pub size: i32,
    pub mask_offset: i32,
    pub max_files: i32,
    pub descr_table_offset: i32,
}

const_assert!(core::mem::size_of::<Superblock>() <= BLOCK_SIZE);

impl Superblock {
    /// Reads the superblock out of block 0's raw bytes.
    pub fn from_block(block: &[u8]) -> Self {
        Self::read_from_prefix(block).expect("block is at least sizeof(Superblock) bytes")
    }

    /// Serializes the superblock into block 0's raw bytes, zeroing the
    /// remainder of the block.
    pub fn write_to_block(&self, block: &mut [u8]) {
        block.fill(0);
        self.write_to_prefix(block)
            .expect("block is at least sizeof(Superblock) bytes");
    }

    pub fn block_size(&self) -> usize {
        self.block_size as usize
    }

    pub fn size_bytes(&self) -> usize {
        self.size as usize
    }

    pub fn blocks_num(&self) -> u32 {
        self.blocks_num as u32
    }

    pub fn max_files(&self) -> u32 {
        self.max_files as u32
    }

    pub fn mask_offset(&self) -> u32 {
        self.mask_offset as u32
    }

    pub fn descr_table_offset(&self) -> u32 {
        self.descr_table_offset as u32
    }
}
