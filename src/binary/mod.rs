//! Indexed region database format and its two search strategies.
//!
//! # File Structure
//!
//! ```text
//! +------------------+
//! |   FILE HEADER    |  8 bytes: first_index_ptr, last_index_ptr
//! +------------------+
//! |   HEADER BLOCK   |  8192 bytes: up to 1024 x (start_ip, block_ptr)
//! +------------------+
//! |   DATA REGION    |  variable: city_id (u32) + region text per record
//! +------------------+
//! |   SUPER-INDEX    |  12 bytes per entry: start_ip, end_ip, data_ptr
//! +------------------+
//! ```
//!
//! All integers are little-endian. `data_ptr` packs the record length into
//! its top byte and the record offset into the low 24 bits.

mod cached_reader;
mod database;
mod disk;
mod format;
mod memory;
mod record;
mod search;
pub mod validation;

#[cfg(test)]
pub(crate) mod fixture;


pub use cached_reader::{CacheStats, CachedDatabase};
pub use database::Database;
pub use disk::DiskSearcher;
pub use format::*;
pub use memory::MemorySearcher;
pub use record::{Record, FIELD_SEPARATOR};
pub use search::{locate_block, BlockRange, IndexBlock};
