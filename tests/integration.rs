//! Integration tests through the public API.

#[path = "../src/binary/fixture.rs"]
mod fixture;

use fixture::{sequential, FixtureBuilder};
use ipcity::{
    client_ip, validate, CachedDatabase, ConfigSource, Database, DatabaseConfig, Error, IpCity,
    Location, LocationProvider, MemoryLocationCache, NoCache, SearchMode,
};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;

fn write_db(data: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(data).unwrap();
    file.flush().unwrap();
    file
}

fn china_db() -> Vec<u8> {
    FixtureBuilder::new()
        .range(0x0100_0000, 0x0100_00FF, 1, "CN|Fujian|Fuzhou|Telecom")
        .range(0x0100_0100, 0x0100_03FF, 2, "CN|Guangdong|Guangzhou|Unicom")
        .range(0x0100_0800, 0x0100_0FFF, 3, "CN|Zhejiang|Hangzhou|Mobile")
        .range(0x7000_0000, 0x70FF_FFFF, 4, "US|California|")
        .range(0xDA00_0000, 0xDAFF_FFFF, 5, "CN|Beijing|Beijing|Telecom")
        .build()
}

#[test]
fn test_lookup_in_every_mode() {
    let file = write_db(&china_db());

    for mode in [SearchMode::Memory, SearchMode::Mapped, SearchMode::Disk] {
        let db = Database::open(file.path(), mode).unwrap();

        let record = db.lookup("1.0.1.10").unwrap().unwrap();
        assert_eq!(record.city_id, 2);
        assert_eq!(record.city(), "Guangzhou");

        let record = db.lookup("218.1.2.3").unwrap().unwrap();
        assert_eq!(record.city_id, 5);
        assert_eq!(record.nation(), "CN");

        assert_eq!(db.lookup("112.0.0.1").unwrap().unwrap().province(), "California");
        assert!(db.lookup("1.0.4.0").unwrap().is_none());
        assert!(db.lookup("8.8.8.8").unwrap().is_none());
        assert!(matches!(db.lookup("1.2.3"), Err(Error::InvalidAddress(_))));
    }
}

#[test]
fn test_disk_mode_matches_memory_mode() {
    let file = write_db(&sequential(2000, 0x0A00_0000, 333).entries_per_block(7).build());
    let memory = Database::open(file.path(), SearchMode::Memory).unwrap();
    let disk = Database::open(file.path(), SearchMode::Disk).unwrap();

    let mut key = 0x0A00_0000u32;
    while key < 0x0A00_0000 + 2000 * 333 * 2 {
        assert_eq!(memory.search(key).unwrap(), disk.search(key).unwrap(), "key {}", key);
        key += 97;
    }
}

#[test]
fn test_validate_fixture() {
    let db = Database::from_bytes(china_db()).unwrap();
    let report = validate(&db).unwrap();
    assert!(report.is_valid(), "{}", report);
    assert_eq!(report.entries, 5);
}

#[test]
fn test_cached_database_reload() {
    let old = write_db(&china_db());
    let new = write_db(
        &FixtureBuilder::new()
            .range(0x0100_0000, 0x01FF_FFFF, 42, "CN|Sichuan|Chengdu|")
            .build(),
    );

    let db = CachedDatabase::open(old.path(), SearchMode::Disk).unwrap();
    assert_eq!(db.lookup("1.0.0.1").unwrap().unwrap().city_id, 1);
    assert_eq!(db.lookup("1.0.0.1").unwrap().unwrap().city_id, 1);
    assert_eq!(db.cache_stats().hits, 1);

    let before = db.inner();
    db.reload(new.path()).unwrap();

    // Handles taken before the reload keep answering from the old file
    assert_eq!(before.lookup("1.0.0.1").unwrap().unwrap().city_id, 1);
    assert_eq!(db.lookup("1.0.0.1").unwrap().unwrap().city_id, 42);
    assert_eq!(db.generation(), 1);
    assert_eq!(db.mode(), SearchMode::Disk);
}

#[test]
fn test_service_from_config() {
    let file = write_db(&china_db());
    let config = DatabaseConfig::new(file.path())
        .with_mode(SearchMode::Mapped)
        .with_location_ttl(Duration::from_secs(60));
    let service = IpCity::from_config(&config).unwrap();

    assert_eq!(
        service.locate("1.0.8.1").unwrap(),
        Some(Location::new("CN", "Zhejiang", "Hangzhou"))
    );
    assert_eq!(service.locate("8.8.8.8").unwrap(), None);
    assert_eq!(service.locate("::1").unwrap().unwrap().city, "保留地址");
    assert_eq!(
        service.locate(&client_ip("::1")).unwrap().unwrap().city,
        "本机地址"
    );
    assert_eq!(service.cache().len(), 1);
}

#[test]
fn test_service_shares_database() {
    let db = Arc::new(CachedDatabase::with_database(
        Database::from_bytes(china_db()).unwrap(),
        0,
    ));
    let cached = IpCity::new(
        Arc::clone(&db),
        MemoryLocationCache::new(8),
        Duration::from_secs(60),
    );
    let uncached = IpCity::new(Arc::clone(&db), NoCache, Duration::from_secs(60));

    for ip in ["1.0.0.5", "218.0.0.1"] {
        assert_eq!(cached.locate(ip).unwrap(), uncached.locate(ip).unwrap());
    }
}

#[test]
fn test_service_as_provider() {
    let service = IpCity::new(
        Arc::new(CachedDatabase::with_database(
            Database::from_bytes(china_db()).unwrap(),
            16,
        )),
        NoCache,
        Duration::from_secs(60),
    );
    let provider: &dyn LocationProvider = &service;

    assert_eq!(provider.name(), "local");
    assert_eq!(provider.locate("1.0.0.1").unwrap().unwrap().city, "Fuzhou");
    assert_eq!(provider.locate("9.9.9.9").unwrap(), None);
}

struct MapSource(HashMap<&'static str, &'static str>);

impl ConfigSource for MapSource {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get(key).map(|v| v.to_string())
    }
}

#[test]
fn test_config_sources() {
    let source = MapSource(HashMap::from([
        ("ipcity.db_path", "/data/ip2region.db"),
        ("ipcity.search_mode", "btree"),
        ("ipcity.cache_capacity", "0"),
    ]));
    let config = DatabaseConfig::from_source(&source).unwrap();
    assert_eq!(config.path, Path::new("/data/ip2region.db"));
    assert_eq!(config.mode, SearchMode::Disk);
    assert_eq!(config.cache_capacity, 0);
    assert_eq!(config.location_ttl, Duration::from_secs(3600));

    let bad = MapSource(HashMap::from([("ipcity.search_mode", "fast")]));
    assert!(matches!(
        DatabaseConfig::from_source(&bad),
        Err(Error::Config(_))
    ));
}

#[test]
fn test_global_database() {
    let file = write_db(&china_db());

    assert!(!ipcity::is_initialized());
    assert!(matches!(ipcity::lookup("1.0.0.1"), Err(Error::NotInitialized)));

    ipcity::init_database(&DatabaseConfig::new(file.path()).with_mode(SearchMode::Disk)).unwrap();
    assert!(ipcity::is_initialized());
    assert_eq!(ipcity::lookup("1.0.0.1").unwrap().unwrap().city_id, 1);
    assert_eq!(ipcity::database().unwrap().mode(), SearchMode::Disk);
}
