//! Region record decoding.

use serde::{Deserialize, Serialize};

use super::format::{read_u32_le, MIN_RECORD_LEN};
use crate::{Error, Result};

/// Separator between region fields.
pub const FIELD_SEPARATOR: char = '|';

/// A matched region record: city id plus the pipe-delimited region text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    pub city_id: u32,
    pub region: String,
}

impl Record {
    /// Decode a record from exactly the bytes its data pointer covers.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < MIN_RECORD_LEN {
            return Err(Error::corrupt(format!(
                "record of {} bytes is shorter than the city id",
                data.len()
            )));
        }

        let city_id = read_u32_le(data, 0).unwrap_or_default();
        let region = std::str::from_utf8(&data[MIN_RECORD_LEN..])
            .map_err(|e| Error::corrupt(format!("region text is not UTF-8: {}", e)))?
            .to_string();

        Ok(Self { city_id, region })
    }

    /// Encode into the on-disk layout.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(MIN_RECORD_LEN + self.region.len());
        buf.extend_from_slice(&self.city_id.to_le_bytes());
        buf.extend_from_slice(self.region.as_bytes());
        buf
    }

    /// All region fields in stored order. Empty fields are kept.
    pub fn fields(&self) -> Vec<&str> {
        self.region.split(FIELD_SEPARATOR).collect()
    }

    /// Field `i` (0-based), or `""` when absent.
    pub fn field(&self, i: usize) -> &str {
        self.region.split(FIELD_SEPARATOR).nth(i).unwrap_or("")
    }

    /// First field: country.
    pub fn nation(&self) -> &str {
        self.field(0)
    }

    /// Second field: province or state.
    pub fn province(&self) -> &str {
        self.field(1)
    }

    /// Third field: city.
    pub fn city(&self) -> &str {
        self.field(2)
    }
}
