//! Resolved location returned by the service layer.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::binary::Record;

/// Country, province and city of an address. Unknown parts are empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Location {
    pub nation: String,
    pub province: String,
    pub city: String,
}

impl Location {
    /// Create a location from its three parts.
    pub fn new(
        nation: impl Into<String>,
        province: impl Into<String>,
        city: impl Into<String>,
    ) -> Self {
        Self {
            nation: nation.into(),
            province: province.into(),
            city: city.into(),
        }
    }

    /// A location that only carries a label in the city field.
    pub fn labelled(label: &str) -> Self {
        Self::new("", "", label)
    }

    /// Whether every part is empty.
    pub fn is_empty(&self) -> bool {
        self.nation.is_empty() && self.province.is_empty() && self.city.is_empty()
    }
}

/// Region databases write `0` for an unknown field.
const UNKNOWN_FIELD: &str = "0";

fn known(field: &str) -> &str {
    if field == UNKNOWN_FIELD {
        ""
    } else {
        field
    }
}

impl From<&Record> for Location {
    fn from(record: &Record) -> Self {
        Self::new(
            known(record.nation()),
            known(record.province()),
            known(record.city()),
        )
    }
}

impl From<Record> for Location {
    fn from(record: Record) -> Self {
        Self::from(&record)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = [&self.nation, &self.province, &self.city]
            .into_iter()
            .map(String::as_str)
            .filter(|s| !s.is_empty())
            .collect();
        f.write_str(&parts.join(" "))
    }
}
