//! Binary format constants and structures.
//!
//! Every integer stored in the file is little-endian. The IP keys they are
//! compared against come from [`crate::normalize_ip`], which reads the
//! dotted quad as a big-endian number. Both conventions are part of the
//! file contract and must stay as they are.

use crate::{Error, Result};

/// Size of the file header (`first_index_ptr`, `last_index_ptr`).
pub const HEADER_SIZE: usize = 8;

/// Size of the coarse header block that follows the file header.
pub const HEADER_BLOCK_SIZE: usize = 8192;

/// Size of one header block entry (`start_ip`, `block_ptr`).
pub const HEADER_ENTRY_SIZE: usize = 8;

/// Maximum number of header block entries.
pub const MAX_HEADER_ENTRIES: usize = HEADER_BLOCK_SIZE / HEADER_ENTRY_SIZE;

/// Size of one super-index entry (`start_ip`, `end_ip`, `data_ptr`).
pub const INDEX_ENTRY_SIZE: usize = 12;

/// Smallest valid record: the 4-byte city id with an empty region.
pub const MIN_RECORD_LEN: usize = 4;

/// Largest offset a data pointer can address (24 bits).
pub const MAX_DATA_OFFSET: u32 = 0x00FF_FFFF;

/// Read a little-endian `u32` at `offset`.
///
/// Returns `None` when fewer than four bytes remain.
#[inline]
pub fn read_u32_le(buf: &[u8], offset: usize) -> Option<u32> {
    let bytes = buf.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// File header: bounds of the super-index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// Byte offset of the first super-index entry
    pub first_index_ptr: u32,
    /// Byte offset of the last super-index entry
    pub last_index_ptr: u32,
}

impl FileHeader {
    /// Decode the header from the first 8 bytes of `buf`.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(Error::InvalidHeaderSize {
                expected: HEADER_SIZE,
                actual: buf.len(),
            });
        }

        Ok(Self {
            first_index_ptr: read_u32_le(buf, 0).unwrap_or_default(),
            last_index_ptr: read_u32_le(buf, 4).unwrap_or_default(),
        })
    }

    /// Check the super-index bounds against the file size.
    pub fn validate(&self, file_len: u64) -> Result<()> {
        let first = self.first_index_ptr as u64;
        let last = self.last_index_ptr as u64;

        if first < HEADER_SIZE as u64 || first > last {
            return Err(Error::corrupt(format!(
                "super-index bounds out of order: first={} last={}",
                first, last
            )));
        }
        if (last - first) % INDEX_ENTRY_SIZE as u64 != 0 {
            return Err(Error::corrupt(format!(
                "super-index span {} is not a multiple of {}",
                last - first,
                INDEX_ENTRY_SIZE
            )));
        }
        if last + INDEX_ENTRY_SIZE as u64 > file_len {
            return Err(Error::corrupt(format!(
                "super-index ends at {} past end of file ({} bytes)",
                last + INDEX_ENTRY_SIZE as u64,
                file_len
            )));
        }
        Ok(())
    }

    /// Number of entries in the super-index.
    pub fn total_blocks(&self) -> usize {
        self.last_index_ptr.saturating_sub(self.first_index_ptr) as usize / INDEX_ENTRY_SIZE + 1
    }

    /// Byte range of the super-index, end exclusive.
    pub fn index_range(&self) -> std::ops::Range<usize> {
        self.first_index_ptr as usize..self.last_index_ptr as usize + INDEX_ENTRY_SIZE
    }
}

/// Packed record pointer: length in the top byte, offset in the low 24 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataPointer {
    /// Record length in bytes
    pub length: u8,
    /// Absolute record offset in the file
    pub offset: u32,
}

impl DataPointer {
    /// Split a raw word without any validation.
    #[inline]
    pub fn from_raw(word: u32) -> Self {
        Self {
            length: ((word >> 24) & 0xFF) as u8,
            offset: word & MAX_DATA_OFFSET,
        }
    }

    /// Split a raw word and check it against a database of `db_len` bytes.
    pub fn decode(word: u32, db_len: u64) -> Result<Self> {
        let ptr = Self::from_raw(word);

        if (ptr.length as usize) < MIN_RECORD_LEN {
            return Err(Error::corrupt(format!(
                "record at {} has length {}, below the {}-byte minimum",
                ptr.offset, ptr.length, MIN_RECORD_LEN
            )));
        }
        if ptr.end() > db_len {
            return Err(Error::corrupt(format!(
                "record {}..{} exceeds database size {}",
                ptr.offset,
                ptr.end(),
                db_len
            )));
        }
        Ok(ptr)
    }

    /// Pack back into a raw word. `offset` is truncated to 24 bits.
    #[inline]
    pub fn encode(self) -> u32 {
        ((self.length as u32) << 24) | (self.offset & MAX_DATA_OFFSET)
    }

    /// End of the record, exclusive.
    #[inline]
    pub fn end(&self) -> u64 {
        self.offset as u64 + self.length as u64
    }
}

/// One decoded super-index entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub start_ip: u32,
    pub end_ip: u32,
    pub data_ptr: u32,
}

impl IndexEntry {
    /// Decode the entry at `offset`, or `None` if it is truncated.
    #[inline]
    pub fn read(buf: &[u8], offset: usize) -> Option<Self> {
        Some(Self {
            start_ip: read_u32_le(buf, offset)?,
            end_ip: read_u32_le(buf, offset + 4)?,
            data_ptr: read_u32_le(buf, offset + 8)?,
        })
    }

    /// Whether `key` falls inside `[start_ip, end_ip]`.
    #[inline]
    pub fn contains(&self, key: u32) -> bool {
        self.start_ip <= key && key <= self.end_ip
    }

    /// Unvalidated view of the data pointer.
    pub fn pointer(&self) -> DataPointer {
        DataPointer::from_raw(self.data_ptr)
    }
}

/// Coarse header block held as two parallel arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderIndex {
    /// First start IP covered by each block
    pub start_ips: Vec<u32>,
    /// Offset of the super-index entry each block starts at
    pub block_ptrs: Vec<u32>,
}

impl HeaderIndex {
    /// Parse header entries in 8-byte strides.
    ///
    /// Stops at the first zero `block_ptr`, at the end of `buf`, or after
    /// [`MAX_HEADER_ENTRIES`].
    pub fn parse(buf: &[u8]) -> Self {
        let mut index = Self::default();

        for chunk in buf.chunks_exact(HEADER_ENTRY_SIZE).take(MAX_HEADER_ENTRIES) {
            let start_ip = read_u32_le(chunk, 0).unwrap_or_default();
            let block_ptr = read_u32_le(chunk, 4).unwrap_or_default();
            if block_ptr == 0 {
                break;
            }
            index.start_ips.push(start_ip);
            index.block_ptrs.push(block_ptr);
        }

        index
    }

    /// Number of header entries.
    pub fn len(&self) -> usize {
        self.start_ips.len()
    }

    /// Whether the header block holds no entries.
    pub fn is_empty(&self) -> bool {
        self.start_ips.is_empty()
    }
}
