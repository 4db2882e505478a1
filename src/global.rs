//! Process-wide database and public lookup API.
//!
//! The database is opened once and shared by every caller. Later
//! initialization calls reuse it; a newer file is brought in with
//! [`reload_database`].

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;

use crate::binary::{CachedDatabase, Database, Record};
use crate::config::DatabaseConfig;
use crate::error::{Error, Result};
use crate::ip::IntoIpKey;

/// Global database
static GLOBAL_DB: Lazy<RwLock<Option<Arc<CachedDatabase>>>> = Lazy::new(|| RwLock::new(None));

/// Open the process-wide database described by `config`.
///
/// The first successful call wins; later calls return the database that is
/// already open, whatever their config says. Concurrent first calls open
/// the file only once.
pub fn init_database(config: &DatabaseConfig) -> Result<Arc<CachedDatabase>> {
    init_with(|| CachedDatabase::open_with_config(config))
}

/// Install an in-memory database image as the process-wide database.
pub fn init_database_from_bytes(data: Vec<u8>, cache_capacity: usize) -> Result<Arc<CachedDatabase>> {
    init_with(|| {
        let db = Database::from_bytes(data)?;
        Ok(CachedDatabase::with_database(db, cache_capacity))
    })
}

fn init_with<F>(open: F) -> Result<Arc<CachedDatabase>>
where
    F: FnOnce() -> Result<CachedDatabase>,
{
    if let Some(db) = GLOBAL_DB.read().as_ref() {
        return Ok(Arc::clone(db));
    }

    let mut guard = GLOBAL_DB.write();
    if let Some(db) = guard.as_ref() {
        return Ok(Arc::clone(db));
    }

    let db = Arc::new(open()?);
    log::info!(
        "Initialized region database ({} mode, {} bytes)",
        db.mode(),
        db.inner().len()
    );
    *guard = Some(Arc::clone(&db));
    Ok(db)
}

/// Check if the process-wide database is open.
pub fn is_initialized() -> bool {
    GLOBAL_DB.read().is_some()
}

/// Get the process-wide database.
pub fn database() -> Result<Arc<CachedDatabase>> {
    GLOBAL_DB
        .read()
        .as_ref()
        .map(Arc::clone)
        .ok_or(Error::NotInitialized)
}

/// Replace the process-wide database with the file at `path`.
///
/// The new file is opened in the same search mode. On failure the current
/// database stays in place.
pub fn reload_database(path: &Path) -> Result<()> {
    let db = database()?;
    db.reload(path)?;
    log::info!(
        "Reloaded region database from {} (generation {})",
        path.display(),
        db.generation()
    );
    Ok(())
}

/// Look up an address in the process-wide database.
///
/// # Examples
/// ```ignore
/// use ipcity::{init_database, lookup, DatabaseConfig};
///
/// init_database(&DatabaseConfig::new("ip2region.db"))?;
/// if let Some(record) = lookup("1.2.3.4")? {
///     println!("{}", record.region);
/// }
/// ```
pub fn lookup<K: IntoIpKey>(ip: K) -> Result<Option<Record>> {
    database()?.lookup(ip)
}
