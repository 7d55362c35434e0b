//! ICMP message construction and parsing
//!
//! This module provides functionality for building and parsing ICMP
//! messages with the echo header layout (type, code, checksum, id, seq).

use bytes::{BufMut, BytesMut};
use wirecraft_core::{Error, Result};

use crate::checksum::{internet_checksum, validate_checksum};

/// ICMP message
#[derive(Debug, Clone)]
pub struct Icmp {
    /// Message type
    pub icmp_type: u8,
    /// Message code
    pub code: u8,
    /// Checksum as parsed (recomputed on build)
    pub checksum: u16,
    /// Echo identifier
    pub id: u16,
    /// Echo sequence number
    pub seq: u16,
    /// Message data following the header
    pub data: Vec<u8>,
}

impl Icmp {
    /// Echo header size in bytes including the checksum field
    pub const HEADER_LEN: usize = 8;

    /// Echo Reply type (0)
    pub const ECHO_REPLY: u8 = 0;

    /// Echo Request type (8)
    pub const ECHO_REQUEST: u8 = 8;

    /// Create an ICMP Echo Request (ping)
    pub fn echo_request(id: u16, seq: u16, data: Vec<u8>) -> Self {
        Self {
            icmp_type: Self::ECHO_REQUEST,
            code: 0,
            checksum: 0,
            id,
            seq,
            data,
        }
    }

    /// Build message bytes with the given checksum value
    fn message_bytes(&self, checksum: u16) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(Self::HEADER_LEN + self.data.len());

        // Type
        buf.put_u8(self.icmp_type);

        // Code
        buf.put_u8(self.code);

        // Checksum
        buf.put_u16(checksum);

        // Identifier
        buf.put_u16(self.id);

        // Sequence number
        buf.put_u16(self.seq);

        // Data
        buf.put_slice(&self.data);

        buf.to_vec()
    }

    /// Convert the message to bytes, with the checksum computed over the
    /// header and data.
    pub fn build(&self) -> Vec<u8> {
        let mut out = self.message_bytes(0);
        let checksum = internet_checksum(&out);
        out[2..4].copy_from_slice(&checksum.to_be_bytes());
        out
    }

    /// Parse an ICMP message from bytes
    pub fn parse(raw: &[u8]) -> Result<Self> {
        if raw.len() < Self::HEADER_LEN {
            return Err(Error::too_short("Icmp", Self::HEADER_LEN, raw.len()));
        }

        Ok(Self {
            icmp_type: raw[0],
            code: raw[1],
            checksum: u16::from_be_bytes([raw[2], raw[3]]),
            id: u16::from_be_bytes([raw[4], raw[5]]),
            seq: u16::from_be_bytes([raw[6], raw[7]]),
            data: raw[Self::HEADER_LEN..].to_vec(),
        })
    }

    /// Validate the stored checksum against the message contents
    pub fn verify_checksum(&self) -> bool {
        validate_checksum(&self.message_bytes(self.checksum))
    }
}
