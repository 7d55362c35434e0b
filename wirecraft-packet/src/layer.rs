//! Layer composition primitive
//!
//! A packet is a chain of header layers, outermost first. Every node owns
//! its successor exclusively, so a chain is acyclic and finite by
//! construction and two chains can never alias a node; reusing a sub-chain
//! requires an explicit `clone()`.

use wirecraft_core::{Error, Result};

use crate::dns::Dns;
use crate::ethernet::Ether;
use crate::icmp::Icmp;
use crate::ip::Ipv4;
use crate::tcp::Tcp;
use crate::udp::Udp;

/// A single node in a layer chain
#[derive(Debug, Clone)]
pub enum Layer {
    Ether(Ether),
    Ipv4(Ipv4),
    Icmp(Icmp),
    Udp(Udp),
    Tcp(Tcp),
    Dns(Dns),
}

/// Discriminant for [`Layer`] lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Ether,
    Ipv4,
    Icmp,
    Udp,
    Tcp,
    Dns,
}

impl Layer {
    /// The variant tag of this node
    pub fn kind(&self) -> LayerKind {
        match self {
            Layer::Ether(_) => LayerKind::Ether,
            Layer::Ipv4(_) => LayerKind::Ipv4,
            Layer::Icmp(_) => LayerKind::Icmp,
            Layer::Udp(_) => LayerKind::Udp,
            Layer::Tcp(_) => LayerKind::Tcp,
            Layer::Dns(_) => LayerKind::Dns,
        }
    }

    /// The next layer down the chain, if any
    pub fn payload(&self) -> Option<&Layer> {
        match self {
            Layer::Ether(e) => e.payload.as_deref(),
            Layer::Ipv4(ip) => ip.payload.as_deref(),
            Layer::Udp(udp) => udp.payload.as_deref(),
            Layer::Icmp(_) | Layer::Tcp(_) | Layer::Dns(_) => None,
        }
    }

    /// Append `upper` at the tail of this chain.
    ///
    /// Walks down the payload links and attaches `upper` to the first node
    /// with an empty payload slot. ICMP, TCP and DNS are terminal layers;
    /// attaching below one fails with `UnsupportedLayer`.
    pub fn stack(self, upper: Layer) -> Result<Layer> {
        match self {
            Layer::Ether(mut e) => {
                e.payload = attach(e.payload, upper)?;
                Ok(Layer::Ether(e))
            }
            Layer::Ipv4(mut ip) => {
                ip.payload = attach(ip.payload, upper)?;
                Ok(Layer::Ipv4(ip))
            }
            Layer::Udp(mut udp) => {
                udp.payload = attach(udp.payload, upper)?;
                Ok(Layer::Udp(udp))
            }
            tail @ (Layer::Icmp(_) | Layer::Tcp(_) | Layer::Dns(_)) => Err(
                Error::unsupported_layer(format!("Cannot attach below a {:?} layer", tail.kind())),
            ),
        }
    }

    /// Depth-first search for the first node of the given kind
    pub fn find(&self, kind: LayerKind) -> Option<&Layer> {
        if self.kind() == kind {
            return Some(self);
        }
        self.payload().and_then(|p| p.find(kind))
    }

    /// Serialize this chain into wire bytes, outermost header first
    pub fn build(&self) -> Vec<u8> {
        match self {
            Layer::Ether(e) => e.build(),
            Layer::Ipv4(ip) => ip.build(),
            Layer::Icmp(icmp) => icmp.build(),
            Layer::Udp(udp) => udp.build(),
            Layer::Tcp(tcp) => tcp.build(),
            Layer::Dns(dns) => dns.build(),
        }
    }

    /// Parse a received frame starting at the link layer
    pub fn parse(raw: &[u8]) -> Result<Layer> {
        Ether::parse(raw).map(Layer::Ether)
    }

    pub fn as_ether(&self) -> Option<&Ether> {
        match self {
            Layer::Ether(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_ipv4(&self) -> Option<&Ipv4> {
        match self {
            Layer::Ipv4(ip) => Some(ip),
            _ => None,
        }
    }

    pub fn as_icmp(&self) -> Option<&Icmp> {
        match self {
            Layer::Icmp(icmp) => Some(icmp),
            _ => None,
        }
    }

    pub fn as_udp(&self) -> Option<&Udp> {
        match self {
            Layer::Udp(udp) => Some(udp),
            _ => None,
        }
    }

    pub fn as_tcp(&self) -> Option<&Tcp> {
        match self {
            Layer::Tcp(tcp) => Some(tcp),
            _ => None,
        }
    }

    pub fn as_dns(&self) -> Option<&Dns> {
        match self {
            Layer::Dns(dns) => Some(dns),
            _ => None,
        }
    }
}

/// Attach `upper` into an optional payload slot, recursing to the tail
fn attach(slot: Option<Box<Layer>>, upper: Layer) -> Result<Option<Box<Layer>>> {
    match slot {
        None => Ok(Some(Box::new(upper))),
        Some(next) => Ok(Some(Box::new((*next).stack(upper)?))),
    }
}

impl From<Ether> for Layer {
    fn from(e: Ether) -> Self {
        Layer::Ether(e)
    }
}

impl From<Ipv4> for Layer {
    fn from(ip: Ipv4) -> Self {
        Layer::Ipv4(ip)
    }
}

impl From<Icmp> for Layer {
    fn from(icmp: Icmp) -> Self {
        Layer::Icmp(icmp)
    }
}

impl From<Udp> for Layer {
    fn from(udp: Udp) -> Self {
        Layer::Udp(udp)
    }
}

impl From<Tcp> for Layer {
    fn from(tcp: Tcp) -> Self {
        Layer::Tcp(tcp)
    }
}

impl From<Dns> for Layer {
    fn from(dns: Dns) -> Self {
        Layer::Dns(dns)
    }
}
