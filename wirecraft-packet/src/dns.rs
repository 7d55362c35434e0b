//! DNS message construction and parsing
//!
//! This module provides a deliberately small DNS codec: a message carries
//! one question, and parsing decodes the question plus the first A/IN
//! answer record. Answer names are assumed to be 2-byte compression
//! pointers and are skipped, never followed; question names are plain
//! labels without compression.

use bytes::{BufMut, BytesMut};
use std::net::Ipv4Addr;
use wirecraft_core::{Error, Result};

/// DNS message header plus the single supported question
#[derive(Debug, Clone)]
pub struct Dns {
    /// Transaction id
    pub id: u16,
    /// Header flags
    pub flags: u16,
    /// Question count as seen on the wire
    pub qdcount: u16,
    /// Answer count as seen on the wire
    pub ancount: u16,
    /// Authority count as seen on the wire
    pub nscount: u16,
    /// Additional count as seen on the wire
    pub arcount: u16,
    /// Question name, dotted form
    pub qname: String,
    /// Question type
    pub qtype: u16,
    /// Question class
    pub qclass: u16,
    /// Address from the first A/IN answer record, if one was present
    pub answer: Option<Ipv4Addr>,
}

impl Dns {
    /// Fixed header size in bytes
    pub const HEADER_LEN: usize = 12;

    /// A record type (1)
    pub const TYPE_A: u16 = 1;

    /// IN class (1)
    pub const CLASS_IN: u16 = 1;

    /// Recursion-desired flag word used for queries
    pub const FLAGS_RD: u16 = 0x0100;

    /// Create an A/IN query for the given name
    pub fn query<S: Into<String>>(qname: S) -> Self {
        Self {
            id: 0x030C,
            flags: Self::FLAGS_RD,
            qdcount: 1,
            ancount: 0,
            nscount: 0,
            arcount: 0,
            qname: qname.into(),
            qtype: Self::TYPE_A,
            qclass: Self::CLASS_IN,
            answer: None,
        }
    }

    /// Encode a dotted name as length-prefixed labels
    fn encode_qname(name: &str) -> Vec<u8> {
        let mut out = Vec::with_capacity(name.len() + 2);
        if !name.is_empty() {
            for label in name.split('.') {
                out.push(label.len() as u8);
                out.extend_from_slice(label.as_bytes());
            }
        }
        out.push(0);
        out
    }

    /// Decode length-prefixed labels into a dotted name, returning the
    /// offset just past the terminator.
    fn decode_qname(raw: &[u8], mut off: usize) -> Result<(String, usize)> {
        let mut labels: Vec<String> = Vec::new();
        loop {
            let len = usize::from(
                *raw.get(off)
                    .ok_or_else(|| Error::too_short("Dns", off + 1, raw.len()))?,
            );
            off += 1;
            if len == 0 {
                break;
            }
            let end = off + len;
            if end > raw.len() {
                return Err(Error::bad_length("Dns", "Label runs past end of message"));
            }
            labels.push(String::from_utf8_lossy(&raw[off..end]).into_owned());
            off = end;
        }
        Ok((labels.join("."), off))
    }

    /// Convert the message to bytes. Only the question is serialized, so
    /// the emitted counts are always 1/0/0/0.
    pub fn build(&self) -> Vec<u8> {
        let qname = Self::encode_qname(&self.qname);
        let mut buf = BytesMut::with_capacity(Self::HEADER_LEN + qname.len() + 4);

        // Transaction id and flags
        buf.put_u16(self.id);
        buf.put_u16(self.flags);

        // Counts: one question, nothing else
        buf.put_u16(1);
        buf.put_u16(0);
        buf.put_u16(0);
        buf.put_u16(0);

        // Question
        buf.put_slice(&qname);
        buf.put_u16(self.qtype);
        buf.put_u16(self.qclass);

        buf.to_vec()
    }

    /// Parse a DNS message from bytes: header, first question, and a scan
    /// of the answer records for the first A/IN address.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        if raw.len() < Self::HEADER_LEN {
            return Err(Error::too_short("Dns", Self::HEADER_LEN, raw.len()));
        }

        let id = u16::from_be_bytes([raw[0], raw[1]]);
        let flags = u16::from_be_bytes([raw[2], raw[3]]);
        let qdcount = u16::from_be_bytes([raw[4], raw[5]]);
        let ancount = u16::from_be_bytes([raw[6], raw[7]]);
        let nscount = u16::from_be_bytes([raw[8], raw[9]]);
        let arcount = u16::from_be_bytes([raw[10], raw[11]]);

        let (qname, mut off) = Self::decode_qname(raw, Self::HEADER_LEN)?;
        if off + 4 > raw.len() {
            return Err(Error::too_short("Dns", off + 4, raw.len()));
        }
        let qtype = u16::from_be_bytes([raw[off], raw[off + 1]]);
        let qclass = u16::from_be_bytes([raw[off + 2], raw[off + 3]]);
        off += 4;

        let mut answer = None;
        for _ in 0..ancount {
            // Answer names are taken to be 2-byte compression pointers
            off += 2;
            if off + 10 > raw.len() {
                return Err(Error::bad_length("Dns", "Answer record truncated"));
            }
            let rtype = u16::from_be_bytes([raw[off], raw[off + 1]]);
            let rclass = u16::from_be_bytes([raw[off + 2], raw[off + 3]]);
            let rdlength = usize::from(u16::from_be_bytes([raw[off + 8], raw[off + 9]]));
            off += 10;

            let end = off + rdlength;
            if end > raw.len() {
                return Err(Error::bad_length(
                    "Dns",
                    "Answer data runs past end of message",
                ));
            }
            let rdata = &raw[off..end];
            off = end;

            if rtype == Self::TYPE_A && rclass == Self::CLASS_IN && rdlength == 4 {
                answer = Some(Ipv4Addr::new(rdata[0], rdata[1], rdata[2], rdata[3]));
                break;
            }
        }

        Ok(Self {
            id,
            flags,
            qdcount,
            ancount,
            nscount,
            arcount,
            qname,
            qtype,
            qclass,
            answer,
        })
    }
}
