//! TCP segment construction and parsing
//!
//! This module provides functionality for building and parsing TCP
//! segments, including header construction, flags, and checksum
//! calculation. Options are carried as raw bytes padded to a 32-bit
//! boundary; the checksum covers the pseudo-header when the segment is
//! stacked under an IPv4 layer.

use bytes::{BufMut, BytesMut};
use std::ops::BitOr;
use wirecraft_core::{ip_protocol, Error, Result};

use crate::checksum::{internet_checksum, transport_checksum, validate_checksum, PseudoHeader};

/// TCP flag bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpFlags(pub u8);

impl TcpFlags {
    /// No flags set
    pub const NONE: TcpFlags = TcpFlags(0x00);

    /// FIN - No more data from sender
    pub const FIN: TcpFlags = TcpFlags(0x01);

    /// SYN - Synchronize sequence numbers
    pub const SYN: TcpFlags = TcpFlags(0x02);

    /// RST - Reset the connection
    pub const RST: TcpFlags = TcpFlags(0x04);

    /// PSH - Push function
    pub const PSH: TcpFlags = TcpFlags(0x08);

    /// ACK - Acknowledgment field is significant
    pub const ACK: TcpFlags = TcpFlags(0x10);

    /// URG - Urgent pointer field is significant
    pub const URG: TcpFlags = TcpFlags(0x20);

    /// Raw flag byte
    pub fn bits(self) -> u8 {
        self.0
    }

    /// True when every bit of `other` is set in `self`
    pub fn contains(self, other: TcpFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for TcpFlags {
    type Output = TcpFlags;

    fn bitor(self, rhs: TcpFlags) -> TcpFlags {
        TcpFlags(self.0 | rhs.0)
    }
}

/// TCP segment
#[derive(Debug, Clone)]
pub struct Tcp {
    /// Source port
    pub sport: u16,
    /// Destination port
    pub dport: u16,
    /// Sequence number
    pub seq: u32,
    /// Acknowledgment number
    pub ack: u32,
    /// Data offset: header length in 32-bit words
    pub offset: u8,
    /// Flag bits
    pub flags: TcpFlags,
    /// Window size
    pub window: u16,
    /// Checksum as parsed (recomputed on build)
    pub checksum: u16,
    /// Urgent pointer
    pub urgent: u16,
    /// Raw option bytes, padded to a 4-byte boundary
    pub options: Vec<u8>,
    /// Addresses bound by the enclosing network layer
    pub pseudo: Option<PseudoHeader>,
    /// Segment data following the header
    pub data: Vec<u8>,
}

impl Tcp {
    /// Header size in bytes without options
    pub const HEADER_LEN: usize = 20;

    /// Create a new TCP segment with default window 8192
    pub fn new(sport: u16, dport: u16, seq: u32, flags: TcpFlags) -> Self {
        Self {
            sport,
            dport,
            seq,
            ack: 0,
            offset: 5, // 5 * 4 = 20 bytes (no options)
            flags,
            window: 8192,
            checksum: 0,
            urgent: 0,
            options: Vec::new(),
            pseudo: None,
            data: Vec::new(),
        }
    }

    /// Set the acknowledgment number
    pub fn with_ack(mut self, ack: u32) -> Self {
        self.ack = ack;
        self
    }

    /// Set the window size
    pub fn with_window(mut self, window: u16) -> Self {
        self.window = window;
        self
    }

    /// Set segment data
    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    /// Set raw option bytes, padding to a 4-byte boundary and updating
    /// the data offset.
    pub fn with_options(mut self, options: Vec<u8>) -> Self {
        // Options must be padded to 4-byte boundary
        let padded_len = (options.len() + 3) & !3;
        let mut padded = options;
        padded.resize(padded_len, 0);

        self.offset = ((Self::HEADER_LEN + padded.len()) / 4) as u8;
        self.options = padded;
        self
    }

    /// Build segment bytes with the given checksum value
    fn segment_bytes(&self, checksum: u16) -> Vec<u8> {
        let header_len = Self::HEADER_LEN + self.options.len();
        let mut buf = BytesMut::with_capacity(header_len + self.data.len());

        // Source port
        buf.put_u16(self.sport);

        // Destination port
        buf.put_u16(self.dport);

        // Sequence number
        buf.put_u32(self.seq);

        // Acknowledgment number
        buf.put_u32(self.ack);

        // Data offset (4 bits) + reserved (4 bits)
        buf.put_u8(self.offset << 4);

        // Flags
        buf.put_u8(self.flags.bits());

        // Window size
        buf.put_u16(self.window);

        // Checksum
        buf.put_u16(checksum);

        // Urgent pointer
        buf.put_u16(self.urgent);

        // Options (if any)
        buf.put_slice(&self.options);

        // Data
        buf.put_slice(&self.data);

        buf.to_vec()
    }

    /// Convert the segment to bytes, computing the checksum over the
    /// zeroed checksum field.
    pub fn build(&self) -> Vec<u8> {
        let mut out = self.segment_bytes(0);
        let checksum = match &self.pseudo {
            Some(pseudo) => transport_checksum(&pseudo.src, &pseudo.dst, ip_protocol::TCP, &out),
            // Unbound segments are checksummed over header and data alone
            None => internet_checksum(&out),
        };
        out[16..18].copy_from_slice(&checksum.to_be_bytes());
        out
    }

    /// Parse a TCP segment from bytes, validating the data offset against
    /// the buffer.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        if raw.len() < Self::HEADER_LEN {
            return Err(Error::too_short("Tcp", Self::HEADER_LEN, raw.len()));
        }

        let sport = u16::from_be_bytes([raw[0], raw[1]]);
        let dport = u16::from_be_bytes([raw[2], raw[3]]);
        let seq = u32::from_be_bytes([raw[4], raw[5], raw[6], raw[7]]);
        let ack = u32::from_be_bytes([raw[8], raw[9], raw[10], raw[11]]);
        let offset = raw[12] >> 4;
        let flags = TcpFlags(raw[13]);
        let window = u16::from_be_bytes([raw[14], raw[15]]);
        let checksum = u16::from_be_bytes([raw[16], raw[17]]);
        let urgent = u16::from_be_bytes([raw[18], raw[19]]);

        let header_len = usize::from(offset) * 4;
        if header_len < Self::HEADER_LEN {
            return Err(Error::bad_length(
                "Tcp",
                format!("Data offset {header_len} below the 20-byte minimum"),
            ));
        }
        if header_len > raw.len() {
            return Err(Error::bad_length(
                "Tcp",
                format!("Data offset {header_len} exceeds buffer of {}", raw.len()),
            ));
        }

        Ok(Self {
            sport,
            dport,
            seq,
            ack,
            offset,
            flags,
            window,
            checksum,
            urgent,
            options: raw[Self::HEADER_LEN..header_len].to_vec(),
            pseudo: None,
            data: raw[header_len..].to_vec(),
        })
    }

    /// Validate the stored checksum against the segment contents and the
    /// bound pseudo-header.
    pub fn verify_checksum(&self) -> bool {
        let seg = self.segment_bytes(self.checksum);
        match &self.pseudo {
            Some(pseudo) => {
                let sum = transport_checksum(&pseudo.src, &pseudo.dst, ip_protocol::TCP, &seg);
                sum == 0 || sum == 0xFFFF
            }
            None => validate_checksum(&seg),
        }
    }
}
