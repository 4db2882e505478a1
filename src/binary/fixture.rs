//! Small database images for tests and benchmarks.
//!
//! Depends on `std` only so integration tests and benches can include it
//! with `#[path]`. Layout: file header, 8 KiB header block, data region,
//! super-index.

#![allow(dead_code)]

const HEADER_SIZE: usize = 8;
const HEADER_BLOCK_SIZE: usize = 8192;
const INDEX_ENTRY_SIZE: usize = 12;
const MAX_HEADER_ENTRIES: usize = 1024;

enum Payload {
    Record { city_id: u32, region: String },
    Raw(u32),
}

struct Range {
    start: u32,
    end: u32,
    payload: Payload,
}

/// Builds a database image from a list of ranges.
pub struct FixtureBuilder {
    ranges: Vec<Range>,
    entries_per_block: usize,
}

impl Default for FixtureBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureBuilder {
    pub fn new() -> Self {
        Self {
            ranges: Vec::new(),
            entries_per_block: 4,
        }
    }

    /// Add `[start, end]` pointing at a record.
    pub fn range(mut self, start: u32, end: u32, city_id: u32, region: &str) -> Self {
        assert!(region.len() <= 251, "region too long for a one-byte length");
        self.ranges.push(Range {
            start,
            end,
            payload: Payload::Record {
                city_id,
                region: region.to_string(),
            },
        });
        self
    }

    /// Add `[start, end]` with a hand-packed data pointer.
    pub fn raw_range(mut self, start: u32, end: u32, data_ptr: u32) -> Self {
        self.ranges.push(Range {
            start,
            end,
            payload: Payload::Raw(data_ptr),
        });
        self
    }

    /// Super-index entries per header block entry.
    pub fn entries_per_block(mut self, n: usize) -> Self {
        self.entries_per_block = n.max(1);
        self
    }

    /// Number of ranges added so far.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Serialize the database image.
    pub fn build(mut self) -> Vec<u8> {
        self.ranges.sort_by_key(|r| r.start);

        let mut buf = vec![0u8; HEADER_SIZE + HEADER_BLOCK_SIZE];

        let mut pointers = Vec::with_capacity(self.ranges.len());
        for range in &self.ranges {
            let ptr = match &range.payload {
                Payload::Record { city_id, region } => {
                    let offset = buf.len() as u32;
                    let length = (4 + region.len()) as u32;
                    buf.extend_from_slice(&city_id.to_le_bytes());
                    buf.extend_from_slice(region.as_bytes());
                    (length << 24) | (offset & 0x00FF_FFFF)
                }
                Payload::Raw(ptr) => *ptr,
            };
            pointers.push(ptr);
        }

        let first = buf.len();
        for (range, ptr) in self.ranges.iter().zip(&pointers) {
            buf.extend_from_slice(&range.start.to_le_bytes());
            buf.extend_from_slice(&range.end.to_le_bytes());
            buf.extend_from_slice(&ptr.to_le_bytes());
        }
        let last = if self.ranges.is_empty() {
            first
        } else {
            buf.len() - INDEX_ENTRY_SIZE
        };

        buf[0..4].copy_from_slice(&(first as u32).to_le_bytes());
        buf[4..8].copy_from_slice(&(last as u32).to_le_bytes());

        // Header block: the first entry of every partition plus the last entry.
        let mut header = Vec::new();
        let count = self.ranges.len();
        for i in (0..count).step_by(self.entries_per_block) {
            header.push(i);
        }
        if count > 0 && header.last() != Some(&(count - 1)) {
            header.push(count - 1);
        }
        header.truncate(MAX_HEADER_ENTRIES);

        for (slot, &i) in header.iter().enumerate() {
            let at = HEADER_SIZE + slot * 8;
            let ptr = (first + i * INDEX_ENTRY_SIZE) as u32;
            buf[at..at + 4].copy_from_slice(&self.ranges[i].start.to_le_bytes());
            buf[at + 4..at + 8].copy_from_slice(&ptr.to_le_bytes());
        }

        buf
    }
}

/// `count` adjacent ranges of `width` addresses starting at `base`, every
/// third one followed by a gap of `width` addresses.
pub fn sequential(count: u32, base: u32, width: u32) -> FixtureBuilder {
    let mut builder = FixtureBuilder::new();
    let mut start = base;
    for i in 0..count {
        let end = start + width - 1;
        let region = format!("CN|Province{}|City{}|ISP{}", i % 31, i, i % 3);
        builder = builder.range(start, end, 1000 + i, &region);
        start = end + 1;
        if i % 3 == 2 {
            start += width;
        }
    }
    builder
}
