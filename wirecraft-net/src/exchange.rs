//! Transmission and request/reply matching
//!
//! A chain is transmitted once, then incoming frames are parsed and
//! filtered against an [`Expectation`] derived from the request until a
//! match arrives or the deadline passes. Frames that fail to parse or
//! match are skipped; the wait never aborts on a bad frame.

use std::net::Ipv4Addr;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use wirecraft_core::{ip_protocol, Error, Result};
use wirecraft_packet::{Ipv4, Layer, LayerKind};

use crate::channel::{CaptureConfig, FrameReceiver, FrameSource, LinkSender, NetworkSender};

/// Reply filter derived from an outgoing chain before transmission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectation {
    /// Protocol the reply must carry
    protocol: u8,
    /// Source of the request; the reply must be addressed here
    src: Ipv4Addr,
    /// Destination of the request; a port-swapped reply must come from here
    dst: Ipv4Addr,
    /// Port pair of the request; the reply must carry it swapped
    ports: Option<(u16, u16)>,
}

impl Expectation {
    /// Derive the filter from an outgoing chain. The protocol comes from
    /// the network layer when explicit, otherwise from the deepest
    /// transport layer present (ICMP=1, TCP=6, UDP=17).
    pub fn of(chain: &Layer) -> Result<Self> {
        let ip = chain
            .find(LayerKind::Ipv4)
            .and_then(Layer::as_ipv4)
            .ok_or_else(|| Error::unsupported_layer("Outgoing chain has no network layer"))?;

        let mut protocol = ip.protocol;
        let mut ports = None;

        if let Some(udp) = chain.find(LayerKind::Udp).and_then(Layer::as_udp) {
            ports = Some((udp.sport, udp.dport));
            if protocol == 0 {
                protocol = ip_protocol::UDP;
            }
        } else if let Some(tcp) = chain.find(LayerKind::Tcp).and_then(Layer::as_tcp) {
            ports = Some((tcp.sport, tcp.dport));
            if protocol == 0 {
                protocol = ip_protocol::TCP;
            }
        } else if chain.find(LayerKind::Icmp).is_some() && protocol == 0 {
            protocol = ip_protocol::ICMP;
        }

        Ok(Self {
            protocol,
            src: ip.src,
            dst: ip.dst,
            ports,
        })
    }

    /// Does a received chain answer the request this filter came from?
    pub fn matches(&self, reply: &Layer) -> bool {
        let Some(ip) = reply.find(LayerKind::Ipv4).and_then(Layer::as_ipv4) else {
            return false;
        };
        if ip.dst != self.src {
            return false;
        }
        if self.protocol != 0 && ip.protocol != self.protocol {
            return false;
        }

        // Port-swapped exchanges are host to host: the reply must also
        // come from the address the request was sent to. ICMP is exempt,
        // an error can legitimately arrive from an intermediate hop.
        if ip.protocol == ip_protocol::UDP {
            if ip.src != self.dst {
                return false;
            }
            let Some(udp) = reply.find(LayerKind::Udp).and_then(Layer::as_udp) else {
                return false;
            };
            if let Some((sport, dport)) = self.ports {
                return udp.sport == dport && udp.dport == sport;
            }
        }
        if ip.protocol == ip_protocol::TCP {
            if ip.src != self.dst {
                return false;
            }
            let Some(tcp) = reply.find(LayerKind::Tcp).and_then(Layer::as_tcp) else {
                return false;
            };
            if let Some((sport, dport)) = self.ports {
                return tcp.sport == dport && tcp.dport == sport;
            }
        }

        // ICMP and anything else: address and protocol suffice
        true
    }
}

/// Locate the network layer at the root of a chain, stripping link framing
fn network_root(chain: &Layer) -> Result<&Ipv4> {
    let inner = match chain {
        Layer::Ether(ether) => ether
            .payload
            .as_deref()
            .ok_or_else(|| Error::unsupported_layer("Link frame carries no network layer"))?,
        other => other,
    };
    inner.as_ipv4().ok_or_else(|| {
        Error::unsupported_layer(format!(
            "Expected a network layer at the root, found {:?}",
            inner.kind()
        ))
    })
}

/// Build and send a chain at the network layer, addressed to the
/// destination found in its IPv4 header. A link layer at the root is
/// stripped first.
pub fn transmit_network(chain: &Layer) -> Result<()> {
    let ip = network_root(chain)?;

    let bytes = ip.build();
    let mut sender = NetworkSender::open()?;
    debug!("Transmitting {} bytes to {} (network layer)", bytes.len(), ip.dst);
    sender.send(&bytes, ip.dst)
}

/// Build and send a chain at the link layer on the named interface. The
/// chain's root must be a link layer.
pub fn transmit_link(chain: &Layer, iface: &str) -> Result<()> {
    if chain.kind() != LayerKind::Ether {
        return Err(Error::unsupported_layer(
            "Link transmission requires an Ether layer at the root",
        ));
    }

    let frame = chain.build();
    let mut sender = LinkSender::open(iface)?;
    debug!("Transmitting {} bytes on {} (link layer)", frame.len(), iface);
    sender.send(&frame)
}

/// Transmit a chain and wait for the frame that answers it.
///
/// The expectation is derived before transmitting; the receive loop then
/// parses every incoming frame and silently skips the ones that fail to
/// parse or do not answer the request. One attempt per call: a miss is a
/// `Timeout`, never a retransmission.
pub fn send_and_receive(chain: &Layer, iface: Option<&str>, timeout: Duration) -> Result<Layer> {
    let expectation = Expectation::of(chain)?;
    transmit_network(chain)?;

    let config = CaptureConfig::default();
    let mut receiver = FrameReceiver::open(iface, &config)?;
    let deadline = Instant::now() + timeout;

    info!(
        "Awaiting reply on {} for up to {:?}",
        iface.unwrap_or("default"),
        timeout
    );
    wait_for_reply(&mut receiver, &expectation, deadline)
}

/// Receive and parse one frame with no transmission and no filtering
pub fn capture_one(iface: Option<&str>, timeout: Duration) -> Result<Layer> {
    let config = CaptureConfig::default();
    let mut receiver = FrameReceiver::open(iface, &config)?;
    let deadline = Instant::now() + timeout;

    loop {
        if Instant::now() >= deadline {
            return Err(Error::Timeout);
        }
        if let Some(frame) = receiver.next_frame()? {
            return Layer::parse(&frame);
        }
    }
}

/// The matching loop, generic over the frame source so it can run against
/// a scripted source in tests.
fn wait_for_reply<S: FrameSource>(
    source: &mut S,
    expectation: &Expectation,
    deadline: Instant,
) -> Result<Layer> {
    loop {
        if Instant::now() >= deadline {
            return Err(Error::Timeout);
        }

        let Some(frame) = source.next_frame()? else {
            continue;
        };

        let reply = match Layer::parse(&frame) {
            Ok(layer) => layer,
            Err(err) => {
                debug!("Skipping unparsable frame: {}", err);
                continue;
            }
        };

        if expectation.matches(&reply) {
            return Ok(reply);
        }
        debug!("Skipping frame that does not answer the request");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use wirecraft_core::MacAddr;
    use wirecraft_packet::{Dns, Ether, Icmp, Ipv4, Tcp, TcpFlags, Udp};

    /// Frame source that replays a fixed script, then times out forever
    struct ScriptedSource {
        frames: VecDeque<Vec<u8>>,
    }

    impl ScriptedSource {
        fn new(frames: Vec<Vec<u8>>) -> Self {
            Self {
                frames: frames.into(),
            }
        }
    }

    impl FrameSource for ScriptedSource {
        fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
            Ok(self.frames.pop_front())
        }
    }

    fn macs() -> (MacAddr, MacAddr) {
        (
            "aa:bb:cc:dd:ee:ff".parse().unwrap(),
            "11:22:33:44:55:66".parse().unwrap(),
        )
    }

    fn dns_request() -> Layer {
        let (src_mac, dst_mac) = macs();
        Layer::from(Ether::new(src_mac, dst_mac))
            .stack(Ipv4::new(Ipv4Addr::new(10, 0, 0, 2), Ipv4Addr::new(8, 8, 8, 8)).into())
            .unwrap()
            .stack(Udp::new(12345, 53).into())
            .unwrap()
            .stack(Dns::query("example.com").into())
            .unwrap()
    }

    fn udp_frame(src_ip: Ipv4Addr, dst_ip: Ipv4Addr, sport: u16, dport: u16) -> Vec<u8> {
        let (src_mac, dst_mac) = macs();
        Layer::from(Ether::new(dst_mac, src_mac))
            .stack(Ipv4::new(src_ip, dst_ip).into())
            .unwrap()
            .stack(Udp::new(sport, dport).with_data(b"resp".to_vec()).into())
            .unwrap()
            .build()
    }

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(5)
    }

    #[test]
    fn test_expectation_requires_network_layer() {
        let chain = Layer::from(Udp::new(1, 2));
        assert!(matches!(
            Expectation::of(&chain),
            Err(Error::UnsupportedLayer(_))
        ));
    }

    #[test]
    fn test_expectation_infers_protocol() {
        let request = dns_request();
        let exp = Expectation::of(&request).unwrap();
        assert_eq!(
            exp,
            Expectation {
                protocol: ip_protocol::UDP,
                src: Ipv4Addr::new(10, 0, 0, 2),
                dst: Ipv4Addr::new(8, 8, 8, 8),
                ports: Some((12345, 53)),
            }
        );
    }

    #[test]
    fn test_match_requires_swapped_ports_from_right_address() {
        let exp = Expectation::of(&dns_request()).unwrap();

        let me = Ipv4Addr::new(10, 0, 0, 2);
        let server = Ipv4Addr::new(8, 8, 8, 8);
        let stranger = Ipv4Addr::new(9, 9, 9, 9);

        let wrong_address = udp_frame(stranger, me, 53, 12345);
        let unswapped_ports = udp_frame(server, me, 12345, 53);
        let wrong_protocol = {
            let (src_mac, dst_mac) = macs();
            Layer::from(Ether::new(dst_mac, src_mac))
                .stack(Ipv4::new(server, me).into())
                .unwrap()
                .stack(Tcp::new(53, 12345, 0, TcpFlags::ACK).into())
                .unwrap()
                .build()
        };
        let garbage = vec![0xFF; 9];
        let good = udp_frame(server, me, 53, 12345);

        let mut source = ScriptedSource::new(vec![
            wrong_address,
            unswapped_ports,
            wrong_protocol,
            garbage,
            good,
        ]);

        let reply = wait_for_reply(&mut source, &exp, far_deadline()).unwrap();
        let udp = reply.find(LayerKind::Udp).and_then(Layer::as_udp).unwrap();
        assert_eq!(udp.sport, 53);
        assert_eq!(udp.dport, 12345);
        let ip = reply.find(LayerKind::Ipv4).and_then(Layer::as_ipv4).unwrap();
        assert_eq!(ip.src, server);
    }

    #[test]
    fn test_icmp_match_needs_address_and_protocol_only() {
        let (src_mac, dst_mac) = macs();
        let me = Ipv4Addr::new(10, 0, 0, 2);
        let target = Ipv4Addr::new(8, 8, 8, 8);

        let request = Layer::from(Ether::new(src_mac, dst_mac))
            .stack(Ipv4::new(me, target).into())
            .unwrap()
            .stack(Icmp::echo_request(7, 1, b"hello".to_vec()).into())
            .unwrap();
        let exp = Expectation::of(&request).unwrap();
        assert_eq!(
            exp,
            Expectation {
                protocol: ip_protocol::ICMP,
                src: me,
                dst: target,
                ports: None,
            }
        );

        let mut echo_reply = Icmp::echo_request(7, 1, b"hello".to_vec());
        echo_reply.icmp_type = Icmp::ECHO_REPLY;
        let reply_frame = Layer::from(Ether::new(dst_mac, src_mac))
            .stack(Ipv4::new(target, me).into())
            .unwrap()
            .stack(echo_reply.into())
            .unwrap()
            .build();

        let mut source = ScriptedSource::new(vec![reply_frame]);
        let reply = wait_for_reply(&mut source, &exp, far_deadline()).unwrap();
        let icmp = reply.find(LayerKind::Icmp).and_then(Layer::as_icmp).unwrap();
        assert_eq!(icmp.icmp_type, Icmp::ECHO_REPLY);
        assert_eq!(icmp.seq, 1);
    }

    #[test]
    fn test_timeout_when_nothing_matches() {
        let exp = Expectation::of(&dns_request()).unwrap();
        let mut source = ScriptedSource::new(vec![]);

        let deadline = Instant::now() + Duration::from_millis(20);
        let err = wait_for_reply(&mut source, &exp, deadline).unwrap_err();
        assert!(matches!(err, Error::Timeout));
    }

    #[test]
    fn test_source_errors_propagate() {
        struct FailingSource;
        impl FrameSource for FailingSource {
            fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
                Err(Error::transport("Capture read failed: device went away"))
            }
        }

        let exp = Expectation::of(&dns_request()).unwrap();
        let err = wait_for_reply(&mut FailingSource, &exp, far_deadline()).unwrap_err();
        assert!(matches!(err, Error::TransportUnavailable(_)));
    }

    #[test]
    fn test_network_root_strips_link_framing() {
        let request = dns_request();
        let ip = network_root(&request).unwrap();
        assert_eq!(ip.dst, Ipv4Addr::new(8, 8, 8, 8));

        let bare = Layer::from(Ether::new(macs().0, macs().1));
        assert!(network_root(&bare).is_err());
    }
}
