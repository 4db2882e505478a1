//! ipcity: CLI tool for querying and checking region database files.

use clap::{Args, Parser, Subcommand};
use ipcity::binary::HEADER_SIZE;
use ipcity::service::reserved_location;
use ipcity::{
    validate, Database, DatabaseConfig, IpCity, Location, LocationCache, Record, SearchMode,
};
use serde_json::json;
use std::path::PathBuf;

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "ipcity")]
#[command(version = "0.1.0")]
#[command(about = "Look up IPv4 addresses in a region database", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DbArgs {
    /// Database file (defaults to IPCITY_DB_PATH or ip2region.db)
    #[arg(short, long)]
    db: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl DbArgs {
    fn resolve(&self) -> Result<DatabaseConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => DatabaseConfig::load(path)?,
            None => DatabaseConfig::from_env()?,
        };
        if let Some(db) = &self.db {
            config.path = db.clone();
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Look up one or more addresses
    Lookup {
        /// IPv4 addresses in dotted-quad form
        #[arg(required = true)]
        ips: Vec<String>,

        #[command(flatten)]
        db: DbArgs,

        /// Search mode: memory, mapped or disk
        #[arg(short, long)]
        mode: Option<String>,

        /// Print results as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Print the header of a database file
    Inspect {
        #[command(flatten)]
        db: DbArgs,
    },

    /// Validate a database file and cross-check the search modes
    Verify {
        #[command(flatten)]
        db: DbArgs,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Lookup { ips, db, mode, json } => lookup(&ips, &db, mode.as_deref(), json),
        Commands::Inspect { db } => inspect(&db),
        Commands::Verify { db } => verify(&db),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn lookup(ips: &[String], args: &DbArgs, mode: Option<&str>, json: bool) -> CliResult {
    let mut config = args.resolve()?;
    if let Some(mode) = mode {
        config.mode =
            SearchMode::from_str(mode).ok_or_else(|| format!("unknown search mode: {}", mode))?;
    }

    let service = IpCity::from_config(&config)?;

    for ip in ips {
        let (record, location) = resolve(&service, ip)?;

        if json {
            let line = json!({
                "ip": ip,
                "found": record.is_some(),
                "city_id": record.as_ref().map(|r| r.city_id),
                "region": record.as_ref().map(|r| r.region.as_str()),
                "location": location,
            });
            println!("{}", line);
            continue;
        }

        match (record, location) {
            (Some(record), _) => println!("{}\t{}\t{}", ip, record.city_id, record.region),
            (None, Some(location)) => println!("{}\t-\t{}", ip, location),
            (None, None) => println!("{}\tnot found", ip),
        }
    }

    Ok(())
}

/// Raw record and location for one address.
///
/// Reserved addresses only get their label; they are not valid lookup keys.
fn resolve<C: LocationCache>(
    service: &IpCity<C>,
    ip: &str,
) -> ipcity::Result<(Option<Record>, Option<Location>)> {
    let location = service.locate(ip)?;
    let record = match reserved_location(ip) {
        Some(_) => None,
        None => service.database().lookup(ip)?,
    };
    Ok((record, location))
}

fn inspect(args: &DbArgs) -> CliResult {
    let config = args.resolve()?;
    let db = Database::open(&config.path, SearchMode::Disk)?;
    let header = db.header();

    println!("File:            {}", config.path.display());
    println!("Size:            {} bytes", db.len());
    println!("First index ptr: {}", header.first_index_ptr);
    println!("Last index ptr:  {}", header.last_index_ptr);
    println!("Index entries:   {}", header.total_blocks());

    if let Database::Disk(searcher) = &db {
        let header_index = searcher.header_index();
        println!("Header entries:  {}", header_index.len());
        if let (Some(first), Some(last)) = (
            header_index.start_ips.first(),
            header_index.start_ips.last(),
        ) {
            println!(
                "Header range:    {} .. {}",
                std::net::Ipv4Addr::from(*first),
                std::net::Ipv4Addr::from(*last)
            );
        }
    }

    let data_len = (header.first_index_ptr as usize).saturating_sub(HEADER_SIZE);
    println!("Data region:     {} bytes (incl. header block)", data_len);

    Ok(())
}

fn verify(args: &DbArgs) -> CliResult {
    let config = args.resolve()?;
    let memory = Database::open(&config.path, SearchMode::Memory)?;
    let disk = Database::open(&config.path, SearchMode::Disk)?;

    let report = validate(&memory)?;
    print!("{}", report);

    let Database::Memory(searcher) = &memory else {
        return Err("memory database expected".into());
    };

    let mut checked = 0usize;
    let mut mismatches = 0usize;
    for entry in searcher.index().iter() {
        if entry.start_ip > entry.end_ip {
            continue;
        }
        let keys = [
            entry.start_ip.wrapping_sub(1),
            entry.start_ip,
            entry.end_ip,
            entry.end_ip.wrapping_add(1),
        ];
        for key in keys {
            checked += 1;
            let expected = memory.search(key);
            let actual = disk.search(key);
            let same = match (&expected, &actual) {
                (Ok(a), Ok(b)) => a == b,
                (Err(a), Err(b)) => a.is_corruption() && b.is_corruption(),
                _ => false,
            };
            if !same {
                mismatches += 1;
                log::warn!(
                    "Search modes disagree on {}: memory {:?}, disk {:?}",
                    std::net::Ipv4Addr::from(key),
                    expected.map(|r| r.map(|r| r.city_id)),
                    actual.map(|r| r.map(|r| r.city_id))
                );
            }
        }
    }

    println!("Cross-checked {} keys, {} mismatches", checked, mismatches);

    if !report.is_valid() || mismatches > 0 {
        return Err("database failed verification".into());
    }
    Ok(())
}

#[cfg(test)]
#[path = "../binary/fixture.rs"]
mod fixture;

#[cfg(test)]
mod tests {
    use super::*;
    use ipcity::{CachedDatabase, NoCache};
    use std::sync::Arc;
    use std::time::Duration;

    fn service() -> IpCity<NoCache> {
        let data = fixture::FixtureBuilder::new()
            .range(0x0100_0000, 0x01FF_FFFF, 7, "CN|Hubei|Wuhan|")
            .build();
        let db = CachedDatabase::with_database(Database::from_bytes(data).unwrap(), 0);
        IpCity::new(Arc::new(db), NoCache, Duration::from_secs(60))
    }

    #[test]
    fn test_resolve_reserved_addresses() {
        let service = service();

        let (record, location) = resolve(&service, "::1").unwrap();
        assert!(record.is_none());
        assert_eq!(location.unwrap().city, "保留地址");

        let (record, location) = resolve(&service, "127.0.0.1").unwrap();
        assert!(record.is_none());
        assert_eq!(location.unwrap().city, "本机地址");
    }

    #[test]
    fn test_resolve_address() {
        let service = service();

        let (record, location) = resolve(&service, "1.2.3.4").unwrap();
        assert_eq!(record.unwrap().city_id, 7);
        assert_eq!(location, Some(Location::new("CN", "Hubei", "Wuhan")));

        assert_eq!(resolve(&service, "9.9.9.9").unwrap(), (None, None));
        assert!(resolve(&service, "not-an-ip").is_err());
    }
}
