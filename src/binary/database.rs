//! Opened database handle.

use std::path::Path;

use super::disk::DiskSearcher;
use super::format::FileHeader;
use super::memory::MemorySearcher;
use super::record::Record;
use crate::config::SearchMode;
use crate::ip::IntoIpKey;
use crate::Result;

/// An open region database.
///
/// Opening is the only step that touches the file system for memory and
/// mapped modes. The handle is immutable afterwards and can be shared
/// through an `Arc`. Dropping it closes the file.
///
/// # Example
///
/// ```ignore
/// use ipcity::{Database, SearchMode};
/// use std::path::Path;
///
/// let db = Database::open(Path::new("ip2region.db"), SearchMode::Disk)?;
/// if let Some(record) = db.lookup("1.2.3.4")? {
///     println!("{} {}", record.city_id, record.region);
/// }
/// ```
pub enum Database {
    Memory(MemorySearcher),
    Disk(DiskSearcher),
}

impl Database {
    /// Open a database file with the given search mode.
    pub fn open(path: &Path, mode: SearchMode) -> Result<Self> {
        let db = match mode {
            SearchMode::Memory => Database::Memory(MemorySearcher::open(path)?),
            SearchMode::Mapped => Database::Memory(MemorySearcher::open_mmap(path)?),
            SearchMode::Disk => Database::Disk(DiskSearcher::open(path)?),
        };
        log::debug!(
            "Opened {:?} in {} mode ({} index entries)",
            path,
            mode,
            db.header().total_blocks()
        );
        Ok(db)
    }

    /// Search an in-memory database image.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        MemorySearcher::from_bytes(data).map(Database::Memory)
    }

    /// Look up an address given as a string, `u32` key or `Ipv4Addr`.
    ///
    /// Returns `Ok(None)` when no range covers the address.
    pub fn lookup<K: IntoIpKey>(&self, ip: K) -> Result<Option<Record>> {
        self.search(ip.into_ip_key()?)
    }

    /// Look up a normalized key.
    pub fn search(&self, key: u32) -> Result<Option<Record>> {
        match self {
            Database::Memory(searcher) => searcher.search(key),
            Database::Disk(searcher) => searcher.search(key),
        }
    }

    /// The decoded file header.
    pub fn header(&self) -> &FileHeader {
        match self {
            Database::Memory(searcher) => searcher.header(),
            Database::Disk(searcher) => searcher.header(),
        }
    }

    /// The search mode this database was opened with.
    pub fn mode(&self) -> SearchMode {
        match self {
            Database::Memory(searcher) if searcher.is_mapped() => SearchMode::Mapped,
            Database::Memory(_) => SearchMode::Memory,
            Database::Disk(_) => SearchMode::Disk,
        }
    }

    /// Size of the database in bytes.
    pub fn len(&self) -> u64 {
        match self {
            Database::Memory(searcher) => searcher.len(),
            Database::Disk(searcher) => searcher.len(),
        }
    }

    /// Whether the database is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
