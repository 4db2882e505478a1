//! IPv4 key normalization.

use std::net::Ipv4Addr;

use crate::{Error, Result};

/// Convert a dotted-quad IPv4 address into its 32-bit search key.
///
/// The octets are read left to right as a big-endian number, so
/// `"1.2.3.4"` becomes `0x01020304`.
///
/// # Examples
/// ```
/// assert_eq!(ipcity::normalize_ip("0.1.2.3").unwrap(), 0x0001_0203);
/// assert_eq!(ipcity::normalize_ip("255.255.255.255").unwrap(), u32::MAX);
/// assert!(ipcity::normalize_ip("1.2.3").is_err());
/// ```
pub fn normalize_ip(ip: &str) -> Result<u32> {
    ip.parse::<Ipv4Addr>()
        .map(u32::from)
        .map_err(|_| Error::InvalidAddress(ip.to_string()))
}

/// Anything that can be turned into a search key.
pub trait IntoIpKey {
    fn into_ip_key(self) -> Result<u32>;
}

impl IntoIpKey for u32 {
    fn into_ip_key(self) -> Result<u32> {
        Ok(self)
    }
}

impl IntoIpKey for Ipv4Addr {
    fn into_ip_key(self) -> Result<u32> {
        Ok(u32::from(self))
    }
}

impl IntoIpKey for &str {
    fn into_ip_key(self) -> Result<u32> {
        normalize_ip(self)
    }
}

impl IntoIpKey for &String {
    fn into_ip_key(self) -> Result<u32> {
        normalize_ip(self)
    }
}

impl IntoIpKey for String {
    fn into_ip_key(self) -> Result<u32> {
        normalize_ip(&self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_ip() {
        assert_eq!(normalize_ip("0.0.0.0").unwrap(), 0);
        assert_eq!(normalize_ip("0.255.255.255").unwrap(), 16_777_215);
        assert_eq!(normalize_ip("1.0.0.0").unwrap(), 16_777_216);
        assert_eq!(normalize_ip("8.8.8.8").unwrap(), 0x0808_0808);
        // Above i32::MAX must stay positive
        assert_eq!(normalize_ip("192.168.1.1").unwrap(), 3_232_235_777);
    }

    #[test]
    fn test_normalize_ip_rejects_malformed() {
        for bad in [
            "",
            "1.2.3",
            "1.2.3.4.5",
            "256.0.0.1",
            "a.b.c.d",
            "::1",
            "1.2.3.-4",
            " 1.2.3.4 ",
            "1.2.3.4\n",
        ] {
            let err = normalize_ip(bad).unwrap_err();
            assert!(matches!(err, Error::InvalidAddress(_)), "{bad}");
        }
    }

    #[test]
    fn test_into_ip_key() {
        assert_eq!(42u32.into_ip_key().unwrap(), 42);
        assert_eq!(Ipv4Addr::new(1, 2, 3, 4).into_ip_key().unwrap(), 0x0102_0304);
        assert_eq!("1.2.3.4".into_ip_key().unwrap(), 0x0102_0304);
        assert_eq!(String::from("1.2.3.4").into_ip_key().unwrap(), 0x0102_0304);
        assert!("bogus".into_ip_key().is_err());
    }
}
