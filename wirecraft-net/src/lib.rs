//! Raw transmission and capture for wirecraft layer chains
//!
//! This crate injects built chains onto the network at the link or the
//! network layer, passively captures frames with a timeout, and matches a
//! transmitted request against the frame that answers it.
//!
//! ## Features
//!
//! - **Link-layer send**: inject a full Ethernet frame on a named interface
//! - **Network-layer send**: inject an IPv4 packet over a raw socket
//! - **Timed capture**: passive receive with a bounded per-read timeout
//! - **Request/reply matching**: filter incoming frames against the
//!   expectation derived from an outgoing chain
//!
//! Everything is a single synchronous call path: sends block, receives
//! block up to a bounded read timeout, and each call owns its socket or
//! capture and releases it before returning. Raw sockets and captures
//! need elevated privileges on most platforms; opening failures surface
//! as `TransportUnavailable`.
//!
//! ## Example
//!
//! ```no_run
//! use std::net::Ipv4Addr;
//! use std::time::Duration;
//! use wirecraft_packet::{Icmp, Ipv4, Layer};
//!
//! // Ping 8.8.8.8 and wait up to two seconds for the echo reply
//! let chain = Layer::from(Ipv4::new(
//!     Ipv4Addr::new(10, 0, 0, 2),
//!     Ipv4Addr::new(8, 8, 8, 8),
//! ))
//! .stack(Icmp::echo_request(1, 1, b"ping".to_vec()).into())
//! .unwrap();
//!
//! let reply = wirecraft_net::send_and_receive(&chain, None, Duration::from_secs(2));
//! ```

pub mod channel;
pub mod exchange;

// Re-export commonly used types
pub use channel::{CaptureConfig, FrameReceiver, FrameSource, LinkSender, NetworkSender};
pub use exchange::{capture_one, send_and_receive, transmit_link, transmit_network, Expectation};
