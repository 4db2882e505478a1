//! Location service on top of the region database.
//!
//! Adds what callers need around a raw lookup: fixed answers for reserved
//! addresses, a keyed location cache with expiry, and conversion of
//! records into [`Location`] values.

use quick_cache::sync::Cache;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::binary::CachedDatabase;
use crate::config::DatabaseConfig;
use crate::location::Location;
use crate::Result;

/// Label returned for the IPv6 loopback address.
pub const RESERVED_LABEL: &str = "保留地址";

/// Label returned for the IPv4 loopback address.
pub const LOCALHOST_LABEL: &str = "本机地址";

/// Prefix of location cache keys.
pub const CACHE_KEY_PREFIX: &str = "ip_location_";

/// Fixed location for addresses that are never looked up.
pub fn reserved_location(ip: &str) -> Option<Location> {
    match ip {
        "::1" => Some(Location::labelled(RESERVED_LABEL)),
        "127.0.0.1" => Some(Location::labelled(LOCALHOST_LABEL)),
        _ => None,
    }
}

/// Normalize a peer address reported by the connection.
///
/// The IPv6 loopback is reported as `127.0.0.1`; everything else is
/// returned trimmed.
pub fn client_ip(remote: &str) -> String {
    match remote.trim() {
        "::1" => "127.0.0.1".to_string(),
        other => other.to_string(),
    }
}

/// Keyed cache of resolved locations with a per-entry lifetime.
pub trait LocationCache: Send + Sync {
    /// Get a live entry.
    fn get(&self, key: &str) -> Option<Location>;

    /// Store an entry for `ttl`.
    fn set(&self, key: &str, value: Location, ttl: Duration);
}

/// Cache that stores nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl LocationCache for NoCache {
    fn get(&self, _key: &str) -> Option<Location> {
        None
    }

    fn set(&self, _key: &str, _value: Location, _ttl: Duration) {}
}

/// In-process LRU location cache with expiry.
pub struct MemoryLocationCache {
    entries: Cache<String, (Location, Instant)>,
}

impl MemoryLocationCache {
    /// Create a cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Cache::new(capacity.max(1)),
        }
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl LocationCache for MemoryLocationCache {
    fn get(&self, key: &str) -> Option<Location> {
        let (location, expires) = self.entries.get(key)?;
        if Instant::now() >= expires {
            self.entries.remove(key);
            return None;
        }
        Some(location)
    }

    fn set(&self, key: &str, value: Location, ttl: Duration) {
        let expires = Instant::now() + ttl;
        self.entries.insert(key.to_string(), (value, expires));
    }
}

/// Resolves client addresses to locations.
///
/// # Example
///
/// ```ignore
/// use ipcity::{DatabaseConfig, IpCity};
///
/// let service = IpCity::from_config(&DatabaseConfig::new("ip2region.db"))?;
/// if let Some(location) = service.locate("1.2.3.4")? {
///     println!("{} {} {}", location.nation, location.province, location.city);
/// }
/// ```
pub struct IpCity<C: LocationCache = MemoryLocationCache> {
    db: Arc<CachedDatabase>,
    cache: C,
    ttl: Duration,
}

impl IpCity<MemoryLocationCache> {
    /// Open the configured database with an in-process location cache.
    pub fn from_config(config: &DatabaseConfig) -> Result<Self> {
        let db = CachedDatabase::open_with_config(config)?;
        Ok(Self::new(
            Arc::new(db),
            MemoryLocationCache::new(config.cache_capacity),
            config.location_ttl,
        ))
    }
}

impl<C: LocationCache> IpCity<C> {
    /// Create a service over a database and cache.
    pub fn new(db: Arc<CachedDatabase>, cache: C, ttl: Duration) -> Self {
        Self { db, cache, ttl }
    }

    /// Resolve `ip` to a location.
    ///
    /// Reserved addresses get a fixed label without touching the database.
    /// Returns `Ok(None)` when the database has no range for the address.
    pub fn locate(&self, ip: &str) -> Result<Option<Location>> {
        if let Some(location) = reserved_location(ip) {
            return Ok(Some(location));
        }

        let key = format!("{}{}", CACHE_KEY_PREFIX, ip);
        if let Some(location) = self.cache.get(&key) {
            return Ok(Some(location));
        }

        let location = match self.db.lookup(ip)? {
            Some(record) => Location::from(record),
            None => return Ok(None),
        };

        self.cache.set(&key, location.clone(), self.ttl);
        Ok(Some(location))
    }

    /// The underlying database.
    pub fn database(&self) -> &Arc<CachedDatabase> {
        &self.db
    }

    /// The location cache.
    pub fn cache(&self) -> &C {
        &self.cache
    }
}
