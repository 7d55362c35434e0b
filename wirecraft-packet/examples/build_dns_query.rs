//! Example: Building a DNS query packet
//!
//! This example demonstrates how to use the wirecraft-packet crate to
//! compose an Ipv4/Udp/Dns chain for an A-record lookup of example.com.

use std::net::Ipv4Addr;
use wirecraft_packet::{Dns, Ipv4, Layer, LayerKind, Udp};

fn main() {
    // Network addresses
    let src_ip = Ipv4Addr::new(192, 168, 1, 10);
    let dst_ip = Ipv4Addr::new(8, 8, 8, 8);

    // Build the query chain
    let chain = Layer::from(Ipv4::new(src_ip, dst_ip))
        .stack(Udp::new(12345, 53).into())
        .expect("stack udp layer")
        .stack(Dns::query("example.com").into())
        .expect("stack dns layer");

    let bytes = chain.build();
    println!("DNS query packet: {} bytes", bytes.len());

    // Parse the packet back and inspect the UDP header
    let parsed = Layer::from(Ipv4::parse(&bytes).expect("parse built packet"));
    let udp = parsed
        .find(LayerKind::Udp)
        .and_then(Layer::as_udp)
        .expect("udp layer present");
    println!(
        "UDP {} -> {}, checksum 0x{:04x}",
        udp.sport, udp.dport, udp.checksum
    );
}
