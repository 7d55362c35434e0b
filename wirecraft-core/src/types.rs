//! Common types used throughout wirecraft

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::{Error, Result};

/// MAC Address (6 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    /// Create a new MAC address
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    /// Broadcast MAC address (ff:ff:ff:ff:ff:ff)
    pub const fn broadcast() -> Self {
        Self([0xff, 0xff, 0xff, 0xff, 0xff, 0xff])
    }

    /// Zero MAC address (00:00:00:00:00:00)
    pub const fn zero() -> Self {
        Self([0x00, 0x00, 0x00, 0x00, 0x00, 0x00])
    }

    /// Create a MAC address from a slice, failing on any length but 6
    pub fn from_slice(slice: &[u8]) -> Result<Self> {
        if slice.len() != 6 {
            return Err(Error::invalid_address(
                format!("{slice:02x?}"),
                format!("MAC address must be 6 bytes, got {}", slice.len()),
            ));
        }
        let mut bytes = [0u8; 6];
        bytes.copy_from_slice(slice);
        Ok(Self(bytes))
    }

    /// Get bytes as slice
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Convert to array
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl FromStr for MacAddr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 6 {
            return Err(Error::invalid_address(
                s.to_string(),
                "Expected 6 colon-separated octets".to_string(),
            ));
        }

        let mut bytes = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            bytes[i] = u8::from_str_radix(part, 16).map_err(|_| {
                Error::invalid_address(s.to_string(), format!("Octet '{part}' is not hex"))
            })?;
        }

        Ok(MacAddr(bytes))
    }
}

impl From<[u8; 6]> for MacAddr {
    fn from(bytes: [u8; 6]) -> Self {
        MacAddr(bytes)
    }
}

/// Parse a dotted-quad IPv4 address string
pub fn parse_ipv4(s: &str) -> Result<Ipv4Addr> {
    s.parse::<Ipv4Addr>()
        .map_err(|e| Error::invalid_address(s.to_string(), e.to_string()))
}

/// Convert a 4-byte slice into an IPv4 address, failing on any other length
pub fn ipv4_from_slice(slice: &[u8]) -> Result<Ipv4Addr> {
    if slice.len() != 4 {
        return Err(Error::invalid_address(
            format!("{slice:?}"),
            format!("IPv4 address must be 4 bytes, got {}", slice.len()),
        ));
    }
    Ok(Ipv4Addr::new(slice[0], slice[1], slice[2], slice[3]))
}

/// Ethertype constants
pub mod ethertypes {
    pub const IPV4: u16 = 0x0800;
    pub const ARP: u16 = 0x0806;
}

/// IP protocol numbers
pub mod ip_protocol {
    pub const ICMP: u8 = 1;
    pub const TCP: u8 = 6;
    pub const UDP: u8 = 17;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_addr_display() {
        let mac = MacAddr([0xAA, 0xBB, 0xCC, 0x00, 0x11, 0x22]);
        assert_eq!(mac.to_string(), "aa:bb:cc:00:11:22");
    }

    #[test]
    fn test_mac_addr_from_str() {
        let mac: MacAddr = "de:ad:be:ef:00:01".parse().unwrap();
        assert_eq!(mac.octets(), [0xde, 0xad, 0xbe, 0xef, 0x00, 0x01]);

        // Display and FromStr are inverses
        assert_eq!(mac.to_string().parse::<MacAddr>().unwrap(), mac);
    }

    #[test]
    fn test_mac_addr_from_str_invalid() {
        assert!("de:ad:be:ef:00".parse::<MacAddr>().is_err());
        assert!("de:ad:be:ef:00:zz".parse::<MacAddr>().is_err());
        assert!("not a mac".parse::<MacAddr>().is_err());
    }

    #[test]
    fn test_mac_addr_from_slice() {
        assert!(MacAddr::from_slice(&[1, 2, 3]).is_err());
        assert!(MacAddr::from_slice(&[1, 2, 3, 4, 5, 6, 7]).is_err());
        assert!(MacAddr::from_slice(&[1, 2, 3, 4, 5, 6]).is_ok());
    }

    #[test]
    fn test_parse_ipv4() {
        assert_eq!(parse_ipv4("10.0.0.2").unwrap(), Ipv4Addr::new(10, 0, 0, 2));
        assert!(parse_ipv4("10.0.0").is_err());
        assert!(parse_ipv4("256.0.0.1").is_err());
    }

    #[test]
    fn test_ipv4_from_slice() {
        assert!(ipv4_from_slice(&[1, 2, 3]).is_err());
        assert_eq!(
            ipv4_from_slice(&[8, 8, 8, 8]).unwrap(),
            Ipv4Addr::new(8, 8, 8, 8)
        );
    }
}
