//! UDP datagram construction and parsing
//!
//! This module provides functionality for building and parsing UDP
//! datagrams, including header construction and checksum calculation. The
//! checksum covers the pseudo-header when the datagram is stacked under an
//! IPv4 layer; a computed value of zero goes on the wire as 0xFFFF because
//! zero means "no checksum" in UDP.

use bytes::{BufMut, BytesMut};
use wirecraft_core::{ip_protocol, Error, Result};

use crate::checksum::{internet_checksum, transport_checksum, PseudoHeader};
use crate::dns::Dns;
use crate::layer::Layer;

/// DNS well-known port, used to opportunistically parse UDP bodies
pub const DNS_PORT: u16 = 53;

/// UDP datagram
#[derive(Debug, Clone)]
pub struct Udp {
    /// Source port
    pub sport: u16,
    /// Destination port
    pub dport: u16,
    /// Length of header plus body (recomputed on build)
    pub length: u16,
    /// Checksum as parsed (recomputed on build)
    pub checksum: u16,
    /// Addresses bound by the enclosing network layer
    pub pseudo: Option<PseudoHeader>,
    /// Structured payload (DNS), if one parsed
    pub payload: Option<Box<Layer>>,
    /// Opaque body bytes when no structured payload is present
    pub data: Vec<u8>,
}

impl Udp {
    /// UDP header size in bytes
    pub const HEADER_LEN: usize = 8;

    /// Create a new UDP datagram with an empty body
    pub fn new(sport: u16, dport: u16) -> Self {
        Self {
            sport,
            dport,
            length: Self::HEADER_LEN as u16,
            checksum: 0,
            pseudo: None,
            payload: None,
            data: Vec::new(),
        }
    }

    /// Set opaque body bytes
    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    /// The body on the wire: a structured payload if present, else the
    /// opaque bytes.
    fn body_bytes(&self) -> Vec<u8> {
        match &self.payload {
            Some(p) => p.build(),
            None => self.data.clone(),
        }
    }

    /// Convert the datagram to bytes, computing the length and checksum
    pub fn build(&self) -> Vec<u8> {
        let body = self.body_bytes();
        let length = (Self::HEADER_LEN + body.len()) as u16;

        let mut seg = BytesMut::with_capacity(length as usize);

        // Source port
        seg.put_u16(self.sport);

        // Destination port
        seg.put_u16(self.dport);

        // Length
        seg.put_u16(length);

        // Checksum (zeroed for calculation)
        seg.put_u16(0);

        // Body
        seg.put_slice(&body);

        let checksum = match &self.pseudo {
            Some(pseudo) => {
                let checksum =
                    transport_checksum(&pseudo.src, &pseudo.dst, ip_protocol::UDP, &seg);
                // UDP checksum of 0 means no checksum; if the calculated
                // checksum is 0, use 0xFFFF
                if checksum == 0 {
                    0xFFFF
                } else {
                    checksum
                }
            }
            // Unbound datagrams are checksummed over header and body alone
            None => internet_checksum(&seg),
        };

        let mut out = seg.to_vec();
        out[6..8].copy_from_slice(&checksum.to_be_bytes());
        out
    }

    /// Parse a UDP datagram from bytes, validating the declared length
    /// against the buffer. When either port is 53 the body is
    /// opportunistically parsed as DNS, falling back to opaque bytes.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        if raw.len() < Self::HEADER_LEN {
            return Err(Error::too_short("Udp", Self::HEADER_LEN, raw.len()));
        }

        let sport = u16::from_be_bytes([raw[0], raw[1]]);
        let dport = u16::from_be_bytes([raw[2], raw[3]]);
        let length = u16::from_be_bytes([raw[4], raw[5]]);
        let checksum = u16::from_be_bytes([raw[6], raw[7]]);

        let declared = usize::from(length);
        if declared < Self::HEADER_LEN {
            return Err(Error::bad_length(
                "Udp",
                format!("Declared length {declared} below the 8-byte header"),
            ));
        }
        if declared > raw.len() {
            return Err(Error::bad_length(
                "Udp",
                format!("Declared length {declared} exceeds buffer of {}", raw.len()),
            ));
        }

        // Declared length bounds the body and trims link padding
        let body = &raw[Self::HEADER_LEN..declared];

        let (payload, data) = if (sport == DNS_PORT || dport == DNS_PORT) && !body.is_empty() {
            match Dns::parse(body) {
                Ok(dns) => (Some(Box::new(Layer::Dns(dns))), Vec::new()),
                Err(_) => (None, body.to_vec()),
            }
        } else {
            (None, body.to_vec())
        };

        Ok(Self {
            sport,
            dport,
            length,
            checksum,
            pseudo: None,
            payload,
            data,
        })
    }
}
