//! Location providers and the response shapes of the hosted IP services.
//!
//! The local database is one provider; the hosted AMap, Tencent and IPIP
//! services are others. Only their response bodies are handled here,
//! fetching them is left to the caller's HTTP stack.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::location::Location;
use crate::service::{IpCity, LocationCache};
use crate::{Error, Result};

/// Nation reported for every AMap answer; the service only covers China.
pub const AMAP_NATION: &str = "中国";

/// Anything that can resolve an address to a location.
pub trait LocationProvider: Send + Sync {
    /// Short provider name used in logs.
    fn name(&self) -> &str;

    /// Resolve `ip`. `Ok(None)` means the provider has no answer.
    fn locate(&self, ip: &str) -> Result<Option<Location>>;
}

impl<C: LocationCache> LocationProvider for IpCity<C> {
    fn name(&self) -> &str {
        "local"
    }

    fn locate(&self, ip: &str) -> Result<Option<Location>> {
        IpCity::locate(self, ip)
    }
}

/// Hosted IP location services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    AMap,
    Tencent,
    Ipip,
}

impl ProviderKind {
    /// All hosted services.
    pub fn all() -> &'static [ProviderKind] {
        &[ProviderKind::AMap, ProviderKind::Tencent, ProviderKind::Ipip]
    }

    /// Get the service name.
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::AMap => "amap",
            ProviderKind::Tencent => "tencent",
            ProviderKind::Ipip => "ipip",
        }
    }

    /// Parse from string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "amap" | "gaode" => Some(ProviderKind::AMap),
            "tencent" | "qq" => Some(ProviderKind::Tencent),
            "ipip" => Some(ProviderKind::Ipip),
            _ => None,
        }
    }

    /// Parse a response body of this service.
    pub fn parse(&self, body: &str) -> Result<Option<Location>> {
        match self {
            ProviderKind::AMap => parse_amap(body),
            ProviderKind::Tencent => parse_tencent(body),
            ProviderKind::Ipip => parse_ipip(body),
        }
    }
}

fn malformed(provider: ProviderKind, e: serde_json::Error) -> Error {
    Error::Provider(format!("{} response: {}", provider.name(), e))
}

/// Read a string field that the service may send as `[]` when unknown.
fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

/// Parse an AMap `v3/ip` response.
///
/// Answers only when `status` is 1 and a province is present.
pub fn parse_amap(body: &str) -> Result<Option<Location>> {
    let data: Value =
        serde_json::from_str(body).map_err(|e| malformed(ProviderKind::AMap, e))?;

    let ok = match data.get("status") {
        Some(Value::String(s)) => s == "1",
        Some(Value::Number(n)) => n.as_u64() == Some(1),
        _ => false,
    };
    if !ok {
        return Ok(None);
    }

    let province = text(data.get("province"));
    if province.is_empty() {
        return Ok(None);
    }

    Ok(Some(Location::new(
        AMAP_NATION,
        province,
        text(data.get("city")),
    )))
}

#[derive(Debug, Deserialize)]
struct TencentResponse {
    status: i64,
    #[serde(default)]
    result: Option<TencentResult>,
}

#[derive(Debug, Deserialize)]
struct TencentResult {
    ad_info: TencentAdInfo,
}

#[derive(Debug, Default, Deserialize)]
struct TencentAdInfo {
    #[serde(default)]
    nation: String,
    #[serde(default)]
    province: String,
    #[serde(default)]
    city: String,
}

/// Parse a Tencent `ws/location/v1/ip` response.
pub fn parse_tencent(body: &str) -> Result<Option<Location>> {
    let data: TencentResponse =
        serde_json::from_str(body).map_err(|e| malformed(ProviderKind::Tencent, e))?;

    if data.status != 0 {
        return Ok(None);
    }
    let Some(result) = data.result else {
        return Err(Error::Provider(
            "tencent response: status 0 without result".to_string(),
        ));
    };

    let info = result.ad_info;
    Ok(Some(Location::new(info.nation, info.province, info.city)))
}

/// Parse an IPIP free API response: `[nation, province, city, ...]`.
pub fn parse_ipip(body: &str) -> Result<Option<Location>> {
    let parts: Vec<String> =
        serde_json::from_str(body).map_err(|e| malformed(ProviderKind::Ipip, e))?;

    let mut parts = parts.into_iter();
    let location = Location::new(
        parts.next().unwrap_or_default(),
        parts.next().unwrap_or_default(),
        parts.next().unwrap_or_default(),
    );
    Ok((!location.is_empty()).then_some(location))
}

/// Provider answering from a fixed table.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    name: String,
    entries: HashMap<String, Location>,
}

impl StaticProvider {
    /// Create an empty provider.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: HashMap::new(),
        }
    }

    /// Add an answer for `ip`.
    pub fn with(mut self, ip: impl Into<String>, location: Location) -> Self {
        self.entries.insert(ip.into(), location);
        self
    }
}

impl LocationProvider for StaticProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn locate(&self, ip: &str) -> Result<Option<Location>> {
        Ok(self.entries.get(ip).cloned())
    }
}
