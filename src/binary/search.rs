//! Binary search over 12-byte super-index entries.
//!
//! Both search strategies end in the same fine search: memory mode runs it
//! over the whole super-index, disk mode over the slice picked by the
//! coarse header block.

use super::format::{FileHeader, HeaderIndex, IndexEntry, INDEX_ENTRY_SIZE};
use crate::{Error, Result};

/// A run of consecutive super-index entries.
#[derive(Debug, Clone, Copy)]
pub struct IndexBlock<'a> {
    bytes: &'a [u8],
}

impl<'a> IndexBlock<'a> {
    /// Wrap a byte slice holding whole 12-byte entries.
    ///
    /// Trailing bytes that do not form a full entry are ignored.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Number of complete entries in the block.
    pub fn len(&self) -> usize {
        self.bytes.len() / INDEX_ENTRY_SIZE
    }

    /// Whether the block holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decode entry `i`.
    pub fn entry(&self, i: usize) -> Result<IndexEntry> {
        IndexEntry::read(self.bytes, i * INDEX_ENTRY_SIZE)
            .ok_or_else(|| Error::corrupt(format!("index entry {} is truncated", i)))
    }

    /// Iterate over all entries in order.
    pub fn iter(&self) -> impl Iterator<Item = IndexEntry> + 'a {
        self.bytes
            .chunks_exact(INDEX_ENTRY_SIZE)
            .filter_map(|chunk| IndexEntry::read(chunk, 0))
    }

    /// Find the entry whose `[start_ip, end_ip]` range contains `key`.
    ///
    /// Comparisons are on `u32`, so keys above `127.255.255.255` order
    /// correctly.
    pub fn find(&self, key: u32) -> Result<Option<IndexEntry>> {
        let mut lo = 0usize;
        let mut hi = self.len();

        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let entry = self.entry(mid)?;

            if key < entry.start_ip {
                hi = mid;
            } else if key > entry.end_ip {
                lo = mid + 1;
            } else {
                return Ok(Some(entry));
            }
        }

        Ok(None)
    }
}

/// Slice of the super-index selected by the coarse search.
///
/// Both bounds are entry offsets and both entries are part of the slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRange {
    /// Offset of the first candidate entry
    pub first: u32,
    /// Offset of the last candidate entry
    pub last: u32,
}

impl BlockRange {
    /// Number of bytes to read to cover every entry in the range.
    pub fn byte_len(&self) -> usize {
        (self.last - self.first) as usize + INDEX_ENTRY_SIZE
    }

    /// Check that the range lies on entry boundaries inside the super-index.
    pub fn validate(&self, header: &FileHeader) -> Result<()> {
        let aligned = |ptr: u32| (ptr - header.first_index_ptr) as usize % INDEX_ENTRY_SIZE == 0;

        if self.first > self.last
            || self.first < header.first_index_ptr
            || self.last > header.last_index_ptr
            || !aligned(self.first)
            || !aligned(self.last)
        {
            return Err(Error::corrupt(format!(
                "header block points outside the super-index: {}..={}",
                self.first, self.last
            )));
        }
        Ok(())
    }
}

/// Pick the super-index slice that must hold any entry covering `key`.
///
/// Starts are strictly ascending across the super-index, so the covering
/// entry is the last one whose start is `<= key`. It lies between the last
/// header entry with `start_ip <= key` and the header entry after it. Keys
/// below the first header entry or above the last one fall back to the
/// head or tail of the super-index, and an empty header block falls back to
/// the whole of it.
pub fn locate_block(header: &FileHeader, index: &HeaderIndex, key: u32) -> BlockRange {
    let whole = BlockRange {
        first: header.first_index_ptr,
        last: header.last_index_ptr,
    };
    if index.is_empty() {
        return whole;
    }

    let upper = index.start_ips.partition_point(|&sip| sip <= key);
    if upper == 0 {
        return BlockRange {
            first: header.first_index_ptr,
            last: index.block_ptrs[0].max(header.first_index_ptr),
        };
    }

    let m = upper - 1;
    let first = index.block_ptrs[m];
    let last = match index.block_ptrs.get(m + 1) {
        Some(&next) => next,
        None => header.last_index_ptr.max(first),
    };

    BlockRange { first, last }
}
