//! Structural validation of a region database.
//!
//! Walks the whole super-index and the header block and reports every
//! problem found instead of stopping at the first one. Lookups never need
//! this; it is meant for checking a freshly delivered database file.

use std::fmt;

use super::database::Database;
use super::format::*;
use super::search::IndexBlock;
use crate::Result;

/// Maximum number of problems collected before the walk stops recording.
const MAX_PROBLEMS: usize = 100;

/// Result of validating a database.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Number of super-index entries
    pub entries: usize,
    /// Number of header block entries
    pub header_entries: usize,
    /// Problems found, in file order
    pub problems: Vec<String>,
    /// Whether more problems were found than recorded
    pub truncated: bool,
}

impl ValidationReport {
    /// Whether no problems were found.
    pub fn is_valid(&self) -> bool {
        self.problems.is_empty()
    }

    fn problem(&mut self, msg: String) {
        if self.problems.len() < MAX_PROBLEMS {
            self.problems.push(msg);
        } else {
            self.truncated = true;
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} index entries, {} header entries, {} problems",
            self.entries,
            self.header_entries,
            self.problems.len()
        )?;
        for problem in &self.problems {
            writeln!(f, "  - {}", problem)?;
        }
        if self.truncated {
            writeln!(f, "  - ... (more problems not shown)")?;
        }
        Ok(())
    }
}

/// Validate the super-index and header block of `db`.
///
/// I/O failures are returned as errors; format problems end up in the
/// report.
pub fn validate(db: &Database) -> Result<ValidationReport> {
    let header = *db.header();
    let db_len = db.len();

    let mut index = vec![0u8; header.index_range().len()];
    let mut header_block = vec![0u8; HEADER_BLOCK_SIZE.min(db_len as usize - HEADER_SIZE)];
    match db {
        Database::Memory(searcher) => {
            index.copy_from_slice(&searcher.as_bytes()[header.index_range()]);
            let start = HEADER_SIZE;
            let len = header_block.len();
            header_block.copy_from_slice(&searcher.as_bytes()[start..start + len]);
        }
        Database::Disk(searcher) => {
            searcher.read_exact_at(header.first_index_ptr as u64, &mut index)?;
            searcher.read_exact_at(HEADER_SIZE as u64, &mut header_block)?;
        }
    }

    let block = IndexBlock::new(&index);
    let header_index = HeaderIndex::parse(&header_block);

    let mut report = ValidationReport {
        entries: block.len(),
        header_entries: header_index.len(),
        ..Default::default()
    };

    let mut prev: Option<IndexEntry> = None;
    for (i, entry) in block.iter().enumerate() {
        if entry.start_ip > entry.end_ip {
            report.problem(format!(
                "entry {}: start {} is above end {}",
                i, entry.start_ip, entry.end_ip
            ));
        }
        if let Some(prev) = prev {
            if prev.end_ip >= entry.start_ip {
                report.problem(format!(
                    "entry {}: start {} overlaps or precedes previous end {}",
                    i, entry.start_ip, prev.end_ip
                ));
            }
        }
        if entry.pointer().offset != 0 {
            if let Err(e) = DataPointer::decode(entry.data_ptr, db_len) {
                report.problem(format!("entry {}: {}", i, e));
            }
        }
        prev = Some(entry);
    }

    let index_start = header.first_index_ptr;
    for (i, (&sip, &ptr)) in header_index
        .start_ips
        .iter()
        .zip(&header_index.block_ptrs)
        .enumerate()
    {
        if ptr < index_start
            || ptr > header.last_index_ptr
            || (ptr - index_start) as usize % INDEX_ENTRY_SIZE != 0
        {
            report.problem(format!(
                "header entry {}: pointer {} is not an index entry",
                i, ptr
            ));
            continue;
        }
        let at = (ptr - index_start) as usize / INDEX_ENTRY_SIZE;
        match block.entry(at) {
            Ok(entry) if entry.start_ip != sip => report.problem(format!(
                "header entry {}: start {} does not match index entry {} start {}",
                i, sip, at, entry.start_ip
            )),
            Ok(_) => {}
            Err(e) => report.problem(format!("header entry {}: {}", i, e)),
        }
    }

    if !report.is_valid() {
        log::warn!(
            "Database validation found {} problems",
            report.problems.len()
        );
    }

    Ok(report)
}
