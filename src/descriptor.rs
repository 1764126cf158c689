//! The descriptor table: a fixed-size array of inode-like records.
//!
//! Grounded on the original's `descr_struct`/`find_descr`, generalized
//! from the teacher's `Dinode`/`DInodeType` (`fs/ufs/inode.rs`) — same
//! idea (a typed on-disk record plus a lightweight in-memory type tag),
//! minus the major/minor device fields this format has no use for.

use zerocopy::{AsBytes, FromBytes};

/// What a descriptor currently holds.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DescriptorType {
    Free,
    Dir,
    File,
    Link,
}

impl DescriptorType {
    const FREE: i32 = 0;
    const DIR: i32 = 1;
    const FILE: i32 = 2;
    const LINK: i32 = 3;

    fn from_raw(raw: i32) -> Self {
        match raw {
            Self::DIR => DescriptorType::Dir,
            Self::FILE => DescriptorType::File,
            Self::LINK => DescriptorType::Link,
            // Any unrecognized value is treated as free, matching the
            // original's convention that `type == 0` means free and
            // mkfs never writes anything else into a vacant slot.
            _ => DescriptorType::Free,
        }
    }

    fn to_raw(self) -> i32 {
        match self {
            DescriptorType::Free => Self::FREE,
            DescriptorType::Dir => Self::DIR,
            DescriptorType::File => Self::FILE,
            DescriptorType::Link => Self::LINK,
        }
    }
}

/// Host-endian, bit-exact mirror of one descriptor-table slot.
///
/// Fixed at 20 bytes (5 × i32), per spec §6.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, AsBytes, FromBytes)]
pub struct RawDescriptor {
    pub id: i32,
    pub type_: i32,
    pub links_num: i32,
    pub size: i32,
    pub blocks_id: i32,
}

/// A convenience, type-checked view over a [`RawDescriptor`].
///
/// Mutating methods operate on the raw record directly; callers are
/// expected to read a `Descriptor`, mutate it, and write it back through
/// [`crate::device::Device`] — there is no write-through cache (no
/// caching layer per spec Non-goals).
#[derive(Copy, Clone, Debug)]
pub struct Descriptor {
    pub id: u32,
    pub type_: DescriptorType,
    pub links_num: i32,
    pub size: u32,
    pub blocks_id: u32,
}

impl From<RawDescriptor> for Descriptor {
    fn from(raw: RawDescriptor) -> Self {
        Descriptor {
            id: raw.id as u32,
            type_: DescriptorType::from_raw(raw.type_),
            links_num: raw.links_num,
            size: raw.size as u32,
            blocks_id: raw.blocks_id as u32,
        }
    }
}

impl From<Descriptor> for RawDescriptor {
    fn from(descr: Descriptor) -> Self {
        RawDescriptor {
            id: descr.id as i32,
            type_: descr.type_.to_raw(),
            links_num: descr.links_num,
            size: descr.size as i32,
            blocks_id: descr.blocks_id as i32,
        }
    }
}

impl Descriptor {
    pub fn is_free(&self) -> bool {
        self.type_ == DescriptorType::Free
    }

    pub fn is_dir(&self) -> bool {
        self.type_ == DescriptorType::Dir
    }

    pub fn is_file_or_link(&self) -> bool {
        matches!(self.type_, DescriptorType::File | DescriptorType::Link)
    }

    /// Number of data blocks referenced from this descriptor's index
    /// block: `ceil(size / block_size)`.
    pub fn blocks_num(&self, block_size: usize) -> u32 {
        (self.size as usize).div_ceil(block_size) as u32
    }

    /// Free bytes left in the last allocated data block:
    /// `ceil(size/bs)*bs - size`.
    pub fn space_left(&self, block_size: usize) -> u32 {
        self.blocks_num(block_size) * block_size as u32 - self.size
    }
}
