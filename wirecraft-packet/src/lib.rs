//! Packet construction and parsing library for wirecraft
//!
//! This crate provides composable network-header layers from layer 2
//! (Ethernet) up to a small application layer (DNS). A packet is a chain
//! of [`Layer`] nodes, outermost first; the chain builds into wire bytes
//! and parses back from them. It includes support for:
//!
//! - **Ethernet II frames**
//! - **IPv4** packets with header checksum, no options or fragmentation
//! - **ICMP** echo messages
//! - **UDP** datagrams with pseudo-header checksum
//! - **TCP** segments with flags, raw options, and pseudo-header checksum
//! - **DNS** queries and first-answer decoding
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`layer`] - The chain primitive: stacking, lookup, build, parse
//! - [`ethernet`] - Ethernet II frame construction and parsing
//! - [`ip`] - IPv4 packet construction and payload dispatch
//! - [`icmp`] - ICMP echo messages
//! - [`udp`] - UDP datagram construction
//! - [`tcp`] - TCP segment construction
//! - [`dns`] - Single-question DNS messages
//! - [`checksum`] - Internet checksum calculation utilities
//!
//! # Quick Start
//!
//! ## Building a ping frame
//!
//! ```rust
//! use std::net::Ipv4Addr;
//! use wirecraft_core::MacAddr;
//! use wirecraft_packet::{Ether, Icmp, Ipv4, Layer};
//!
//! let src_mac: MacAddr = "aa:bb:cc:dd:ee:ff".parse().unwrap();
//! let dst_mac: MacAddr = "11:22:33:44:55:66".parse().unwrap();
//!
//! let chain = Layer::from(Ether::new(src_mac, dst_mac))
//!     .stack(Ipv4::new(Ipv4Addr::new(10, 0, 0, 2), Ipv4Addr::new(8, 8, 8, 8)).into())
//!     .unwrap()
//!     .stack(Icmp::echo_request(7, 42, b"hello".to_vec()).into())
//!     .unwrap();
//!
//! let bytes = chain.build();
//! let parsed = Layer::parse(&bytes).unwrap();
//! assert!(parsed.as_ether().is_some());
//! ```
//!
//! ## Building a DNS query over UDP
//!
//! ```rust
//! use std::net::Ipv4Addr;
//! use wirecraft_packet::{Dns, Ipv4, Layer, Udp};
//!
//! let chain = Layer::from(Ipv4::new(
//!     Ipv4Addr::new(192, 168, 1, 10),
//!     Ipv4Addr::new(8, 8, 8, 8),
//! ))
//! .stack(Udp::new(12345, 53).into())
//! .unwrap()
//! .stack(Dns::query("example.com").into())
//! .unwrap();
//!
//! let bytes = chain.build();
//! assert!(bytes.len() > 20 + 8 + 12);
//! ```
//!
//! Checksums are computed on every `build`: the IPv4 header checksum over
//! its zeroed checksum field, the TCP and UDP checksums over the
//! pseudo-header their enclosing IPv4 layer binds onto them.

pub mod checksum;
pub mod dns;
pub mod ethernet;
pub mod icmp;
pub mod ip;
pub mod layer;
pub mod tcp;
pub mod udp;

// Re-export commonly used types
pub use checksum::{internet_checksum, transport_checksum, validate_checksum, PseudoHeader};
pub use dns::Dns;
pub use ethernet::Ether;
pub use icmp::Icmp;
pub use ip::{bind_pseudo_header, Ipv4};
pub use layer::{Layer, LayerKind};
pub use tcp::{Tcp, TcpFlags};
pub use udp::{Udp, DNS_PORT};
