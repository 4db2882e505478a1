//! ipcity - IPv4 to region lookup over an indexed region database.
//!
//! The database maps inclusive IPv4 ranges to region records
//! (`nation|province|city|...`). It can be searched three ways with
//! identical results:
//!
//! - **Memory**: the whole file is read into memory, one binary search
//! - **Mapped**: like memory, but the file is memory-mapped
//! - **Disk**: a small header block narrows the search to one slice of the
//!   index, which is read from disk on each lookup
//!
//! # Quick Start
//!
//! ```ignore
//! use ipcity::{Database, SearchMode};
//! use std::path::Path;
//!
//! let db = Database::open(Path::new("ip2region.db"), SearchMode::Memory)?;
//! if let Some(record) = db.lookup("1.2.3.4")? {
//!     println!("{} {}", record.city_id, record.region);
//! }
//! ```
//!
//! # Location Service
//!
//! [`IpCity`] adds reserved-address labels and a location cache on top of
//! a [`CachedDatabase`]:
//!
//! ```ignore
//! use ipcity::{DatabaseConfig, IpCity};
//!
//! let service = IpCity::from_config(&DatabaseConfig::from_env()?)?;
//! let location = service.locate("127.0.0.1")?;
//! ```
//!
//! # Process-wide Database
//!
//! [`init_database`] opens a database shared by the whole process;
//! [`lookup`] searches it and [`reload_database`] swaps in a newer file.

mod config;
mod error;
mod global;
mod ip;
mod location;

pub mod binary;
pub mod provider;
pub mod service;

// Re-export core types
pub use error::{Error, Result};
pub use ip::{normalize_ip, IntoIpKey};
pub use location::Location;

// Re-export configuration
pub use config::{
    ConfigSource, DatabaseConfig, EnvConfig, SearchMode, DEFAULT_CACHE_CAPACITY,
    DEFAULT_DB_PATH, DEFAULT_LOCATION_TTL,
};

// Re-export database types
pub use binary::validation::{validate, ValidationReport};
pub use binary::{CacheStats, CachedDatabase, Database, Record};

// Re-export service types
pub use provider::{LocationProvider, ProviderKind, StaticProvider};
pub use service::{client_ip, IpCity, LocationCache, MemoryLocationCache, NoCache};

// Re-export global API functions
pub use global::{
    database, init_database, init_database_from_bytes, is_initialized, lookup, reload_database,
};
