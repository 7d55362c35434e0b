//! Example: Building an ICMP echo request frame
//!
//! This example demonstrates how to use the wirecraft-packet crate to
//! compose an Ether/Ipv4/Icmp chain, build it to bytes, and parse it back.

use std::net::Ipv4Addr;
use wirecraft_core::MacAddr;
use wirecraft_packet::{Ether, Icmp, Ipv4, Layer, LayerKind};

fn main() {
    // Network addresses
    let src_mac: MacAddr = "aa:bb:cc:dd:ee:ff".parse().unwrap();
    let dst_mac: MacAddr = "11:22:33:44:55:66".parse().unwrap();
    let src_ip = Ipv4Addr::new(10, 0, 0, 2);
    let dst_ip = Ipv4Addr::new(8, 8, 8, 8);

    // Build the echo request chain
    let chain = Layer::from(Ether::new(src_mac, dst_mac))
        .stack(Ipv4::new(src_ip, dst_ip).with_ttl(64).into())
        .expect("stack network layer")
        .stack(Icmp::echo_request(7, 1, b"hello".to_vec()).into())
        .expect("stack icmp layer");

    let bytes = chain.build();
    println!("Built {} bytes:", bytes.len());
    for (i, byte) in bytes.iter().enumerate() {
        print!("{byte:02x}{}", if i % 16 == 15 { "\n" } else { " " });
    }
    println!();

    // Parse the frame back and inspect the echo fields
    let parsed = Layer::parse(&bytes).expect("parse built frame");
    let icmp = parsed
        .find(LayerKind::Icmp)
        .and_then(Layer::as_icmp)
        .expect("icmp layer present");
    println!(
        "Parsed back: type={} id={} seq={}",
        icmp.icmp_type, icmp.id, icmp.seq
    );
}
