//! Ethernet II frame construction and parsing
//!
//! This module provides functionality for building and parsing Ethernet II
//! frames, the link layer at the root of a transmitted chain.

use bytes::{BufMut, BytesMut};
use wirecraft_core::{ethertypes, Error, MacAddr, Result};

use crate::ip::Ipv4;
use crate::layer::Layer;

/// Ethernet II frame header
#[derive(Debug, Clone)]
pub struct Ether {
    /// Destination MAC address
    pub dst: MacAddr,
    /// Source MAC address
    pub src: MacAddr,
    /// EtherType of the payload
    pub ethertype: u16,
    /// Next layer down the chain
    pub payload: Option<Box<Layer>>,
}

impl Ether {
    /// Ethernet header size in bytes (dst + src + type)
    pub const HEADER_LEN: usize = 14;

    /// Create a new IPv4-carrying Ethernet frame
    pub fn new(src: MacAddr, dst: MacAddr) -> Self {
        Self {
            dst,
            src,
            ethertype: ethertypes::IPV4,
            payload: None,
        }
    }

    /// Override the EtherType
    pub fn with_ethertype(mut self, ethertype: u16) -> Self {
        self.ethertype = ethertype;
        self
    }

    /// Convert the frame to bytes, followed by the built bytes of its
    /// payload chain.
    pub fn build(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(Self::HEADER_LEN);

        // Destination MAC
        buf.put_slice(self.dst.as_bytes());

        // Source MAC
        buf.put_slice(self.src.as_bytes());

        // EtherType
        buf.put_u16(self.ethertype);

        // Payload chain
        if let Some(payload) = &self.payload {
            buf.put_slice(&payload.build());
        }

        buf.to_vec()
    }

    /// Parse an Ethernet frame from bytes, recursively parsing an IPv4
    /// payload when the EtherType is 0x0800. Other payloads are left out
    /// of the chain.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        if raw.len() < Self::HEADER_LEN {
            return Err(Error::too_short("Ether", Self::HEADER_LEN, raw.len()));
        }

        let dst = MacAddr::from_slice(&raw[0..6])?;
        let src = MacAddr::from_slice(&raw[6..12])?;
        let ethertype = u16::from_be_bytes([raw[12], raw[13]]);

        let rest = &raw[Self::HEADER_LEN..];
        let payload = if ethertype == ethertypes::IPV4 && !rest.is_empty() {
            Some(Box::new(Layer::Ipv4(Ipv4::parse(rest)?)))
        } else {
            None
        };

        Ok(Self {
            dst,
            src,
            ethertype,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ethernet_build() {
        let src: MacAddr = "00:11:22:33:44:55".parse().unwrap();
        let dst: MacAddr = "aa:bb:cc:dd:ee:ff".parse().unwrap();

        let bytes = Ether::new(src, dst).build();
        assert_eq!(bytes.len(), Ether::HEADER_LEN);

        // Check destination MAC
        assert_eq!(&bytes[0..6], dst.as_bytes());

        // Check source MAC
        assert_eq!(&bytes[6..12], src.as_bytes());

        // Check EtherType
        assert_eq!(u16::from_be_bytes([bytes[12], bytes[13]]), 0x0800);
    }

    #[test]
    fn test_ethernet_parse_too_short() {
        let err = Ether::parse(&[0u8; 10]).unwrap_err();
        assert!(matches!(err, Error::TooShort { layer: "Ether", .. }));
    }

    #[test]
    fn test_ethernet_non_ip_payload() {
        let mut frame = vec![
            0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff, // dst
            0x00, 0x11, 0x22, 0x33, 0x44, 0x55, // src
            0x08, 0x06, // ARP
        ];
        frame.extend_from_slice(&[0x00; 8]);

        let ether = Ether::parse(&frame).unwrap();
        assert_eq!(ether.ethertype, 0x0806);
        assert!(ether.payload.is_none());
    }

    #[test]
    fn test_ethernet_roundtrip() {
        let src: MacAddr = "de:ad:be:ef:00:01".parse().unwrap();
        let dst: MacAddr = "ff:ee:dd:cc:bb:aa".parse().unwrap();

        let bytes = Ether::new(src, dst).build();
        let parsed = Ether::parse(&bytes).unwrap();
        assert_eq!(parsed.src, src);
        assert_eq!(parsed.dst, dst);
        assert_eq!(parsed.ethertype, ethertypes::IPV4);
    }
}
