//! Database configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Default database file name.
pub const DEFAULT_DB_PATH: &str = "ip2region.db";

/// Default number of cached lookup results.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Default lifetime of a cached location (1 hour).
pub const DEFAULT_LOCATION_TTL: Duration = Duration::from_secs(3600);

/// How the database is searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Read the whole file into memory and binary-search the super-index
    #[default]
    Memory,
    /// Memory-map the file and search it like `Memory`
    Mapped,
    /// Keep the file on disk and use the header block to narrow each search
    Disk,
}

impl SearchMode {
    /// Get the internal name of this mode.
    pub fn name(&self) -> &'static str {
        match self {
            SearchMode::Memory => "memory",
            SearchMode::Mapped => "mapped",
            SearchMode::Disk => "disk",
        }
    }

    /// Parse a mode from a string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "mem" => Some(SearchMode::Memory),
            "mapped" | "mmap" => Some(SearchMode::Mapped),
            "disk" | "btree" | "file" => Some(SearchMode::Disk),
            _ => None,
        }
    }

    /// Whether the whole database is resident in the address space.
    pub fn is_in_memory(&self) -> bool {
        !matches!(self, SearchMode::Disk)
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Source of configuration values.
pub trait ConfigSource {
    /// Get the raw value for a dotted key such as `ipcity.db_path`.
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads configuration from environment variables.
///
/// `ipcity.db_path` maps to `IPCITY_DB_PATH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvConfig;

impl EnvConfig {
    /// Environment variable name for a dotted key.
    pub fn var_name(key: &str) -> String {
        key.replace('.', "_").to_uppercase()
    }
}

impl ConfigSource for EnvConfig {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(Self::var_name(key)).ok()
    }
}

/// Configuration for opening a database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the database file
    pub path: PathBuf,
    /// Search strategy
    pub mode: SearchMode,
    /// Capacity of the lookup result cache (0 disables it)
    pub cache_capacity: usize,
    /// Lifetime of cached locations in the service layer
    #[serde(with = "duration_secs")]
    pub location_ttl: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DB_PATH),
            mode: SearchMode::default(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            location_ttl: DEFAULT_LOCATION_TTL,
        }
    }
}

impl DatabaseConfig {
    /// Create a configuration for the given database file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Set the search mode.
    pub fn with_mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the lookup cache capacity.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Set how long the service layer keeps cached locations.
    pub fn with_location_ttl(mut self, ttl: Duration) -> Self {
        self.location_ttl = ttl;
        self
    }

    /// Load a configuration from a JSON file.
    ///
    /// Missing fields take their default values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Save the configuration as JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Build a configuration from `IPCITY_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_source(&EnvConfig)
    }

    /// Overlay values from a [`ConfigSource`] on the defaults.
    ///
    /// Recognised keys: `ipcity.db_path`, `ipcity.search_mode`,
    /// `ipcity.cache_capacity`, `ipcity.location_ttl` (seconds).
    pub fn from_source(source: &dyn ConfigSource) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = source.get("ipcity.db_path") {
            config.path = PathBuf::from(path);
        }
        if let Some(mode) = source.get("ipcity.search_mode") {
            config.mode = SearchMode::from_str(&mode)
                .ok_or_else(|| Error::Config(format!("unknown search mode: {}", mode)))?;
        }
        if let Some(capacity) = source.get("ipcity.cache_capacity") {
            config.cache_capacity = capacity.trim().parse().map_err(|_| {
                Error::Config(format!("invalid cache capacity: {}", capacity))
            })?;
        }
        if let Some(ttl) = source.get("ipcity.location_ttl") {
            let secs: u64 = ttl
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("invalid location ttl: {}", ttl)))?;
            config.location_ttl = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
