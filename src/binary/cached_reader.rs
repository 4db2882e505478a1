//! Cached database with hot reload support.
//!
//! This module provides a database wrapper with:
//! - LRU cache for lookup results
//! - Atomic hot reload to swap in a new database file without downtime
//! - Thread-safe concurrent access

use arc_swap::ArcSwap;
use quick_cache::sync::Cache;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::database::Database;
use super::record::Record;
use crate::config::{DatabaseConfig, SearchMode};
use crate::ip::IntoIpKey;
use crate::Result;

/// Cached database with hot reload support.
///
/// Results, including misses, are cached by search key. Errors are never
/// cached. A reload swaps the database atomically: lookups already running
/// finish against the old file, later ones use the new one.
///
/// # Example
///
/// ```ignore
/// use ipcity::{CachedDatabase, DatabaseConfig};
/// use std::path::Path;
///
/// let db = CachedDatabase::open_with_config(&DatabaseConfig::new("ip2region.db"))?;
/// let record = db.lookup("1.2.3.4")?;
///
/// // Swap in a newer database file
/// db.reload(Path::new("ip2region-new.db"))?;
/// ```
pub struct CachedDatabase {
    /// The underlying database, wrapped in ArcSwap for atomic replacement.
    inner: ArcSwap<Database>,
    /// LRU cache for lookup results.
    cache: Option<Cache<u32, Option<Record>>>,
    /// Mode used when reloading from a path.
    mode: SearchMode,
    capacity: usize,
    /// Generation counter, incremented on each reload.
    generation: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CachedDatabase {
    /// Open a database file with default cache settings.
    pub fn open(path: &Path, mode: SearchMode) -> Result<Self> {
        Self::open_with_config(&DatabaseConfig::new(path).with_mode(mode))
    }

    /// Open the database described by `config`.
    pub fn open_with_config(config: &DatabaseConfig) -> Result<Self> {
        let db = Database::open(&config.path, config.mode)?;
        Ok(Self::with_database(db, config.cache_capacity))
    }

    /// Wrap an already open database.
    ///
    /// A `capacity` of zero disables result caching.
    pub fn with_database(db: Database, capacity: usize) -> Self {
        let cache = if capacity > 0 {
            Some(Cache::new(capacity))
        } else {
            None
        };

        Self {
            mode: db.mode(),
            inner: ArcSwap::from_pointee(db),
            cache,
            capacity,
            generation: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Hot reload from a new database file, keeping the current search mode.
    pub fn reload(&self, path: &Path) -> Result<()> {
        let db = Database::open(path, self.mode)?;
        self.swap(db);
        log::info!("Hot reloaded database from {:?}", path);
        Ok(())
    }

    /// Hot reload from an in-memory database image.
    pub fn reload_from_bytes(&self, data: Vec<u8>) -> Result<()> {
        let db = Database::from_bytes(data)?;
        self.swap(db);
        log::info!("Hot reloaded database from bytes");
        Ok(())
    }

    fn swap(&self, db: Database) {
        self.inner.store(Arc::new(db));
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.clear_cache();
    }

    /// Look up an address with caching.
    pub fn lookup<K: IntoIpKey>(&self, ip: K) -> Result<Option<Record>> {
        self.search(ip.into_ip_key()?)
    }

    /// Look up a normalized key with caching.
    pub fn search(&self, key: u32) -> Result<Option<Record>> {
        if let Some(ref cache) = self.cache {
            if let Some(result) = cache.get(&key) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(result);
            }
            self.misses.fetch_add(1, Ordering::Relaxed);
        }

        let result = self.inner.load().search(key)?;

        if let Some(ref cache) = self.cache {
            cache.insert(key, result.clone());
        }

        Ok(result)
    }

    /// Clear the cache.
    pub fn clear_cache(&self) {
        if let Some(ref cache) = self.cache {
            cache.clear();
        }
    }

    /// Get cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        match self.cache {
            Some(ref cache) => CacheStats {
                capacity: self.capacity,
                len: cache.len(),
                hits: self.hits.load(Ordering::Relaxed),
                misses: self.misses.load(Ordering::Relaxed),
                enabled: true,
            },
            None => CacheStats::default(),
        }
    }

    /// Get the current generation (incremented on each reload).
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Get the search mode used for reloads.
    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    /// Get the current database.
    ///
    /// The returned handle keeps the old database alive across a reload.
    pub fn inner(&self) -> Arc<Database> {
        self.inner.load_full()
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Maximum cache capacity.
    pub capacity: usize,
    /// Current number of entries in the cache.
    pub len: usize,
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that went to the database.
    pub misses: u64,
    /// Whether caching is enabled.
    pub enabled: bool,
}

impl CacheStats {
    /// Fraction of lookups served from the cache.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
