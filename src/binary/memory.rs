//! In-memory searcher over a fully loaded database.

use memmap2::Mmap;
use std::fs::{self, File};
use std::ops::Deref;
use std::path::Path;

use super::format::*;
use super::record::Record;
use super::search::IndexBlock;
use crate::Result;

/// Backing storage for a loaded database.
enum Storage {
    Owned(Vec<u8>),
    Mapped(Mmap),
}

impl Deref for Storage {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Storage::Owned(data) => data.as_slice(),
            Storage::Mapped(mmap) => &mmap[..],
        }
    }
}

/// Single-level searcher over the whole super-index held in memory.
///
/// Once built it never performs I/O and is freely shared between threads.
pub struct MemorySearcher {
    data: Storage,
    header: FileHeader,
}

impl MemorySearcher {
    /// Read a database file fully into memory.
    pub fn open(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        log::debug!("Loaded {} bytes from {:?}", data.len(), path);
        Self::new(Storage::Owned(data))
    }

    /// Memory-map a database file.
    pub fn open_mmap(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        // The database is never written while mapped.
        let mmap = unsafe { Mmap::map(&file)? };
        log::debug!("Mapped {} bytes from {:?}", mmap.len(), path);
        Self::new(Storage::Mapped(mmap))
    }

    /// Use an in-memory database image.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::new(Storage::Owned(data))
    }

    fn new(data: Storage) -> Result<Self> {
        let header = FileHeader::parse(&data)?;
        header.validate(data.len() as u64)?;
        Ok(Self { data, header })
    }

    /// The decoded file header.
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Whether the database is memory-mapped rather than owned.
    pub fn is_mapped(&self) -> bool {
        matches!(self.data, Storage::Mapped(_))
    }

    /// Size of the database in bytes.
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    /// Whether the database image is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw database bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// The full super-index.
    pub fn index(&self) -> IndexBlock<'_> {
        IndexBlock::new(&self.data[self.header.index_range()])
    }

    /// Look up the record covering `key`.
    pub fn search(&self, key: u32) -> Result<Option<Record>> {
        let entry = match self.index().find(key)? {
            Some(entry) => entry,
            None => return Ok(None),
        };
        if entry.pointer().offset == 0 {
            return Ok(None);
        }

        let ptr = DataPointer::decode(entry.data_ptr, self.len())?;
        let start = ptr.offset as usize;
        Record::decode(&self.data[start..start + ptr.length as usize]).map(Some)
    }
}
