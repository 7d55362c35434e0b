//! IPv4 packet construction and parsing
//!
//! This module provides functionality for building and parsing IPv4 packets,
//! including header construction, checksum calculation, and payload dispatch
//! on the protocol number. The source and destination addresses are stamped
//! onto a TCP or UDP payload through [`bind_pseudo_header`] on every build
//! and parse, so transport checksums never traverse the chain upward.

use bytes::{BufMut, BytesMut};
use std::net::Ipv4Addr;
use wirecraft_core::{ip_protocol, ipv4_from_slice, Error, Result};

use crate::checksum::{internet_checksum, PseudoHeader};
use crate::icmp::Icmp;
use crate::layer::Layer;
use crate::tcp::Tcp;
use crate::udp::Udp;

/// IPv4 packet
#[derive(Debug, Clone)]
pub struct Ipv4 {
    /// Version (always 4 for IPv4)
    pub version: u8,
    /// Internet Header Length in 32-bit words (minimum 5)
    pub ihl: u8,
    /// Time to Live
    pub ttl: u8,
    /// Protocol number; 0 means "infer from the payload at build time"
    pub protocol: u8,
    /// Header checksum as parsed (recomputed on build)
    pub checksum: u16,
    /// Source IP address
    pub src: Ipv4Addr,
    /// Destination IP address
    pub dst: Ipv4Addr,
    /// Next layer down the chain
    pub payload: Option<Box<Layer>>,
    /// Payload bytes of an unrecognized protocol, kept opaque
    pub data: Vec<u8>,
}

impl Ipv4 {
    /// Header size in bytes without options
    pub const HEADER_LEN: usize = 20;

    /// Create a new IPv4 packet with default TTL 64
    pub fn new(src: Ipv4Addr, dst: Ipv4Addr) -> Self {
        Self {
            version: 4,
            ihl: 5, // 5 * 4 = 20 bytes (minimum header)
            ttl: 64,
            protocol: 0,
            checksum: 0,
            src,
            dst,
            payload: None,
            data: Vec::new(),
        }
    }

    /// Set the Time to Live
    pub fn with_ttl(mut self, ttl: u8) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set an explicit protocol number
    pub fn with_protocol(mut self, protocol: u8) -> Self {
        self.protocol = protocol;
        self
    }

    /// The protocol number that will go on the wire: the explicit value,
    /// or one inferred from the payload variant (ICMP=1, TCP=6, UDP=17).
    pub fn effective_protocol(&self) -> u8 {
        if self.protocol != 0 {
            return self.protocol;
        }
        match self.payload.as_deref() {
            Some(Layer::Icmp(_)) => ip_protocol::ICMP,
            Some(Layer::Tcp(_)) => ip_protocol::TCP,
            Some(Layer::Udp(_)) => ip_protocol::UDP,
            _ => 0,
        }
    }

    /// Build header bytes with the given checksum value
    fn header_bytes(&self, protocol: u8, total_len: u16, checksum: u16) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(Self::HEADER_LEN);

        // Version (4 bits) + IHL (4 bits)
        buf.put_u8((self.version << 4) | (self.ihl & 0x0F));

        // Type of Service
        buf.put_u8(0);

        // Total Length
        buf.put_u16(total_len);

        // Identification
        buf.put_u16(0);

        // Flags (3 bits) + Fragment Offset (13 bits)
        buf.put_u16(0);

        // Time to Live
        buf.put_u8(self.ttl);

        // Protocol
        buf.put_u8(protocol);

        // Header Checksum
        buf.put_u16(checksum);

        // Source IP
        buf.put_slice(&self.src.octets());

        // Destination IP
        buf.put_slice(&self.dst.octets());

        buf.to_vec()
    }

    /// Convert the packet to bytes, computing the header checksum over the
    /// zeroed checksum field and appending the built payload chain.
    pub fn build(&self) -> Vec<u8> {
        // Bind the pseudo-header before building so transport checksums
        // cover the addresses of this packet
        let payload_bytes = match &self.payload {
            Some(p) => bind_pseudo_header(self, (**p).clone()).build(),
            None => self.data.clone(),
        };

        let protocol = self.effective_protocol();
        let total_len = (Self::HEADER_LEN + payload_bytes.len()) as u16;

        // Checksum is computed over the header with the field zeroed
        let mut header = self.header_bytes(protocol, total_len, 0);
        let checksum = internet_checksum(&header);
        header[10..12].copy_from_slice(&checksum.to_be_bytes());

        header.extend_from_slice(&payload_bytes);
        header
    }

    /// Parse an IPv4 packet from bytes, dispatching the payload on the
    /// protocol number. The payloads of unrecognized protocols are kept as
    /// opaque bytes.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        if raw.len() < Self::HEADER_LEN {
            return Err(Error::too_short("Ipv4", Self::HEADER_LEN, raw.len()));
        }

        let version = raw[0] >> 4;
        let ihl = raw[0] & 0x0F;
        let header_len = usize::from(ihl) * 4;
        if header_len < Self::HEADER_LEN {
            return Err(Error::bad_length(
                "Ipv4",
                format!("Header length {header_len} below the 20-byte minimum"),
            ));
        }
        if raw.len() < header_len {
            return Err(Error::bad_length(
                "Ipv4",
                format!("Header length {header_len} exceeds buffer of {}", raw.len()),
            ));
        }

        let total_len = usize::from(u16::from_be_bytes([raw[2], raw[3]]));
        let ttl = raw[8];
        let protocol = raw[9];
        let checksum = u16::from_be_bytes([raw[10], raw[11]]);
        let src = ipv4_from_slice(&raw[12..16])?;
        let dst = ipv4_from_slice(&raw[16..20])?;

        // A zero total length (e.g. offload) means "runs to the end of the
        // buffer"; otherwise it bounds the payload and trims link padding
        let end = if total_len == 0 {
            raw.len()
        } else {
            if total_len < header_len || total_len > raw.len() {
                return Err(Error::bad_length(
                    "Ipv4",
                    format!(
                        "Total length {total_len} out of range for buffer of {}",
                        raw.len()
                    ),
                ));
            }
            total_len
        };
        let body = &raw[header_len..end];

        let mut packet = Self {
            version,
            ihl,
            ttl,
            protocol,
            checksum,
            src,
            dst,
            payload: None,
            data: Vec::new(),
        };

        if !body.is_empty() {
            match protocol {
                ip_protocol::ICMP => {
                    packet.payload = Some(Box::new(Layer::Icmp(Icmp::parse(body)?)));
                }
                ip_protocol::TCP => {
                    let bound = bind_pseudo_header(&packet, Layer::Tcp(Tcp::parse(body)?));
                    packet.payload = Some(Box::new(bound));
                }
                ip_protocol::UDP => {
                    let bound = bind_pseudo_header(&packet, Layer::Udp(Udp::parse(body)?));
                    packet.payload = Some(Box::new(bound));
                }
                _ => packet.data = body.to_vec(),
            }
        }

        Ok(packet)
    }
}

/// Stamp a network layer's addresses onto a transport layer so its
/// checksum can cover the pseudo-header. Layers without a pseudo-header
/// pass through unchanged.
pub fn bind_pseudo_header(ip: &Ipv4, transport: Layer) -> Layer {
    let pseudo = PseudoHeader::new(ip.src, ip.dst);
    match transport {
        Layer::Udp(mut udp) => {
            udp.pseudo = Some(pseudo);
            Layer::Udp(udp)
        }
        Layer::Tcp(mut tcp) => {
            tcp.pseudo = Some(pseudo);
            Layer::Tcp(tcp)
        }
        other => other,
    }
}
