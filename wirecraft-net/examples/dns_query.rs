//! Example: resolve a name over UDP/53 with a crafted query
//!
//! Requires raw-socket privileges. Adjust the source address to your
//! host before running.

use std::net::Ipv4Addr;
use std::time::Duration;
use wirecraft_packet::{Dns, Ipv4, Layer, LayerKind, Udp};

fn main() {
    tracing_subscriber::fmt::init();

    // Network addresses
    let src_ip = Ipv4Addr::new(192, 168, 1, 10);
    let dst_ip = Ipv4Addr::new(8, 8, 8, 8);

    // Build the query
    let chain = Layer::from(Ipv4::new(src_ip, dst_ip))
        .stack(Udp::new(12345, 53).into())
        .expect("stack udp layer")
        .stack(Dns::query("example.com").into())
        .expect("stack dns layer");

    // One attempt, two-second deadline
    match wirecraft_net::send_and_receive(&chain, None, Duration::from_secs(2)) {
        Ok(reply) => {
            let dns = reply.find(LayerKind::Dns).and_then(Layer::as_dns);
            match dns.and_then(|d| d.answer) {
                Some(addr) => println!("example.com resolves to {addr}"),
                None => println!("reply carried no A record"),
            }
        }
        Err(e) => eprintln!("no reply: {e}"),
    }
}
