//! Two-level searcher that keeps the database on disk.

use parking_lot::Mutex;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use super::format::*;
use super::record::Record;
use super::search::{locate_block, IndexBlock};
use crate::Result;

/// Disk-backed searcher.
///
/// Only the 8-byte file header and the coarse header block are held in
/// memory. Each lookup costs two reads: the candidate super-index slice
/// and the record itself. Seek and read pairs go through one lock, so a
/// single instance can be shared between threads.
pub struct DiskSearcher {
    file: Mutex<File>,
    file_len: u64,
    header: FileHeader,
    header_index: HeaderIndex,
}

impl DiskSearcher {
    /// Open a database file and load its header block.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let searcher = Self::from_file(file)?;
        log::debug!(
            "Opened {:?} for disk search: {} index entries, {} header entries",
            path,
            searcher.header.total_blocks(),
            searcher.header_index.len()
        );
        Ok(searcher)
    }

    /// Build a searcher over an already open file.
    pub fn from_file(mut file: File) -> Result<Self> {
        let file_len = file.metadata()?.len();

        let mut head = [0u8; HEADER_SIZE];
        let read = read_at(&mut file, 0, &mut head, file_len)?;
        let header = FileHeader::parse(&head[..read])?;
        header.validate(file_len)?;

        let available = file_len.saturating_sub(HEADER_SIZE as u64) as usize;
        let mut block = vec![0u8; HEADER_BLOCK_SIZE.min(available)];
        read_at(&mut file, HEADER_SIZE as u64, &mut block, file_len)?;
        let header_index = HeaderIndex::parse(&block);

        Ok(Self {
            file: Mutex::new(file),
            file_len,
            header,
            header_index,
        })
    }

    /// The decoded file header.
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// The coarse header block.
    pub fn header_index(&self) -> &HeaderIndex {
        &self.header_index
    }

    /// Size of the database file in bytes.
    pub fn len(&self) -> u64 {
        self.file_len
    }

    /// Whether the database file is empty.
    pub fn is_empty(&self) -> bool {
        self.file_len == 0
    }

    /// Look up the record covering `key`.
    pub fn search(&self, key: u32) -> Result<Option<Record>> {
        let range = locate_block(&self.header, &self.header_index, key);
        range.validate(&self.header)?;

        let mut index = vec![0u8; range.byte_len()];
        self.read_exact_at(range.first as u64, &mut index)?;

        let entry = match IndexBlock::new(&index).find(key)? {
            Some(entry) => entry,
            None => return Ok(None),
        };
        if entry.pointer().offset == 0 {
            return Ok(None);
        }

        let ptr = DataPointer::decode(entry.data_ptr, self.file_len)?;
        let mut data = vec![0u8; ptr.length as usize];
        self.read_exact_at(ptr.offset as u64, &mut data)?;

        Record::decode(&data).map(Some)
    }

    /// Read `buf.len()` bytes at `offset` as one seek+read pair.
    pub fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(buf)?;
        Ok(())
    }
}

/// Read up to `buf.len()` bytes at `offset`, clamped to the file length.
fn read_at(file: &mut File, offset: u64, buf: &mut [u8], file_len: u64) -> Result<usize> {
    let len = (buf.len() as u64).min(file_len.saturating_sub(offset)) as usize;
    file.seek(SeekFrom::Start(offset))?;
    file.read_exact(&mut buf[..len])?;
    Ok(len)
}
