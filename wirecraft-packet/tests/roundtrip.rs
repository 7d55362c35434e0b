//! End-to-end build/parse round trips across full layer chains

use std::net::Ipv4Addr;
use wirecraft_core::MacAddr;
use wirecraft_packet::{
    transport_checksum, validate_checksum, Dns, Ether, Icmp, Ipv4, Layer, LayerKind, Tcp,
    TcpFlags, Udp,
};

#[test]
fn test_ether_ip_icmp_roundtrip() {
    let src_mac: MacAddr = "aa:bb:cc:dd:ee:ff".parse().unwrap();
    let dst_mac: MacAddr = "11:22:33:44:55:66".parse().unwrap();

    let chain = Layer::from(Ether::new(src_mac, dst_mac))
        .stack(
            Ipv4::new(Ipv4Addr::new(10, 0, 0, 2), Ipv4Addr::new(8, 8, 8, 8))
                .with_ttl(64)
                .into(),
        )
        .unwrap()
        .stack(Icmp::echo_request(7, 42, b"hello".to_vec()).into())
        .unwrap();

    let bytes = chain.build();
    let parsed = Layer::parse(&bytes).unwrap();

    // Check link layer
    let ether = parsed.as_ether().unwrap();
    assert_eq!(ether.src, src_mac);
    assert_eq!(ether.dst, dst_mac);

    // Check network layer
    let ip = parsed.find(LayerKind::Ipv4).and_then(Layer::as_ipv4).unwrap();
    assert_eq!(ip.src, Ipv4Addr::new(10, 0, 0, 2));
    assert_eq!(ip.dst, Ipv4Addr::new(8, 8, 8, 8));
    assert_eq!(ip.ttl, 64);

    // Check echo fields
    let icmp = parsed.find(LayerKind::Icmp).and_then(Layer::as_icmp).unwrap();
    assert_eq!(icmp.icmp_type, Icmp::ECHO_REQUEST);
    assert_eq!(icmp.id, 7);
    assert_eq!(icmp.seq, 42);
    assert_eq!(icmp.data, b"hello");
    assert!(icmp.verify_checksum());

    // The IPv4 header including its checksum field sums to zero
    assert!(validate_checksum(&bytes[14..34]));
}

#[test]
fn test_ether_ip_udp_dns_roundtrip() {
    let src_mac: MacAddr = "de:ad:be:ef:00:01".parse().unwrap();
    let dst_mac: MacAddr = "ff:ee:dd:cc:bb:aa".parse().unwrap();
    let src_ip = Ipv4Addr::new(192, 168, 1, 10);
    let dst_ip = Ipv4Addr::new(8, 8, 8, 8);

    let chain = Layer::from(Ether::new(src_mac, dst_mac))
        .stack(Ipv4::new(src_ip, dst_ip).into())
        .unwrap()
        .stack(Udp::new(55555, 53).into())
        .unwrap()
        .stack(Dns::query("example.com").into())
        .unwrap();

    let bytes = chain.build();
    let parsed = Layer::parse(&bytes).unwrap();

    // Check ports and checksum presence
    let udp = parsed.find(LayerKind::Udp).and_then(Layer::as_udp).unwrap();
    assert_eq!(udp.sport, 55555);
    assert_eq!(udp.dport, 53);
    assert_ne!(udp.checksum, 0);

    // Check the question survived the trip
    let dns = parsed.find(LayerKind::Dns).and_then(Layer::as_dns).unwrap();
    assert_eq!(dns.qname, "example.com");
    assert_eq!(dns.qtype, Dns::TYPE_A);

    // The UDP segment validates against the pseudo-header of the chain
    let segment = &bytes[34..];
    assert_eq!(transport_checksum(&src_ip, &dst_ip, 17, segment), 0);
}

#[test]
fn test_ip_tcp_pseudo_header_propagation() {
    let src_ip = Ipv4Addr::new(1, 2, 3, 4);
    let dst_ip = Ipv4Addr::new(5, 6, 7, 8);

    let chain = Layer::from(Ipv4::new(src_ip, dst_ip))
        .stack(Tcp::new(1234, 80, 100, TcpFlags::SYN).into())
        .unwrap();

    let bytes = chain.build();
    assert!(bytes.len() >= 40);

    let parsed = Ipv4::parse(&bytes).unwrap();
    let tcp = parsed.payload.as_deref().and_then(Layer::as_tcp).unwrap();
    assert_eq!(tcp.sport, 1234);
    assert_eq!(tcp.dport, 80);
    assert_eq!(tcp.seq, 100);
    assert!(tcp.flags.contains(TcpFlags::SYN));

    // Addresses propagated into the TCP node for pseudo-header purposes
    let pseudo = tcp.pseudo.expect("pseudo-header bound on parse");
    assert_eq!(pseudo.src, src_ip);
    assert_eq!(pseudo.dst, dst_ip);
    assert!(tcp.verify_checksum());
}

#[test]
fn test_built_bytes_are_deterministic() {
    let make = || {
        Layer::from(Ipv4::new(
            Ipv4Addr::new(10, 1, 1, 1),
            Ipv4Addr::new(10, 1, 1, 2),
        ))
        .stack(Udp::new(4000, 4001).with_data(b"abc".to_vec()).into())
        .unwrap()
        .build()
    };
    assert_eq!(make(), make());
}
