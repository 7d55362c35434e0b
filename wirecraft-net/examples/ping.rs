//! Example: send an ICMP echo request and wait for the reply
//!
//! Requires raw-socket privileges. Addresses are placeholders; adjust to
//! your network before running.

use std::net::Ipv4Addr;
use std::time::Duration;
use wirecraft_packet::{Icmp, Ipv4, Layer, LayerKind};

fn main() {
    tracing_subscriber::fmt::init();

    // Network addresses
    let src_ip = Ipv4Addr::new(10, 0, 0, 2);
    let dst_ip = Ipv4Addr::new(8, 8, 8, 8);

    // Build the echo request
    let chain = Layer::from(Ipv4::new(src_ip, dst_ip))
        .stack(Icmp::echo_request(1, 1, b"wirecraft".to_vec()).into())
        .expect("stack icmp layer");

    // One attempt, two-second deadline
    match wirecraft_net::send_and_receive(&chain, None, Duration::from_secs(2)) {
        Ok(reply) => {
            let icmp = reply
                .find(LayerKind::Icmp)
                .and_then(Layer::as_icmp)
                .expect("matched reply carries icmp");
            println!(
                "echo reply: type={} id={} seq={}",
                icmp.icmp_type, icmp.id, icmp.seq
            );
        }
        Err(e) => eprintln!("no reply: {e}"),
    }
}
