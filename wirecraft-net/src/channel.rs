//! Send and receive capabilities over raw sockets and pcap
//!
//! Each handle owns its socket or capture for the duration of one call
//! path and releases it on drop. Opening failures surface as
//! `TransportUnavailable` (typically missing raw-socket privilege).

use pcap::{Active, Capture, Device};
use pnet_datalink::{self, Channel, DataLinkSender};
use pnet_packet::ip::IpNextHeaderProtocols;
use pnet_packet::ipv4::Ipv4Packet as RawIpv4Packet;
use pnet_transport::{transport_channel, TransportChannelType, TransportSender};
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use tracing::debug;
use wirecraft_core::{Error, Result};

/// Default snapshot length (maximum bytes per captured frame)
const DEFAULT_SNAPLEN: i32 = 65535;

/// Default bound on a single capture read, so an overall deadline can be
/// enforced by the caller's loop
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(200);

/// Configuration for the passive receive capability
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Maximum bytes to capture per frame
    pub snaplen: i32,
    /// Upper bound on one blocking read
    pub read_timeout: Duration,
    /// Enable promiscuous mode
    pub promiscuous: bool,
    /// Enable immediate mode (deliver frames immediately)
    pub immediate_mode: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            snaplen: DEFAULT_SNAPLEN,
            read_timeout: DEFAULT_READ_TIMEOUT,
            promiscuous: true,
            immediate_mode: true,
        }
    }
}

/// Source of raw frames with time-bounded reads.
///
/// `next_frame` returns `Ok(None)` when the bounded read expired with
/// nothing to deliver, letting callers enforce their own deadline.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<Vec<u8>>>;
}

/// Passive frame receiver backed by a pcap capture
pub struct FrameReceiver {
    capture: Capture<Active>,
}

impl FrameReceiver {
    /// Open a capture, bound to `iface` when given, otherwise on the
    /// default device.
    pub fn open(iface: Option<&str>, config: &CaptureConfig) -> Result<Self> {
        let device = match iface {
            Some(name) => Device::from(name),
            None => Device::lookup()
                .map_err(|e| Error::transport(format!("Failed to look up capture device: {e}")))?
                .ok_or_else(|| Error::transport("No capture device available"))?,
        };

        debug!("Opening capture on {}", device.name);
        let capture = Capture::from_device(device)
            .map_err(|e| Error::transport(format!("Failed to create capture: {e}")))?
            .promisc(config.promiscuous)
            .snaplen(config.snaplen)
            .timeout(config.read_timeout.as_millis() as i32)
            .immediate_mode(config.immediate_mode)
            .open()
            .map_err(|e| Error::transport(format!("Failed to activate capture: {e}")))?;

        Ok(Self { capture })
    }
}

impl FrameSource for FrameReceiver {
    fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
        match self.capture.next_packet() {
            Ok(frame) => Ok(Some(frame.data.to_vec())),
            Err(pcap::Error::TimeoutExpired) => Ok(None),
            Err(e) => Err(Error::transport(format!("Capture read failed: {e}"))),
        }
    }
}

/// Link-layer sender bound to one interface
pub struct LinkSender {
    tx: Box<dyn DataLinkSender>,
}

impl std::fmt::Debug for LinkSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkSender").finish_non_exhaustive()
    }
}

impl LinkSender {
    /// Open an Ethernet channel on the named interface
    pub fn open(iface: &str) -> Result<Self> {
        let interface = pnet_datalink::interfaces()
            .into_iter()
            .find(|i| i.name == iface)
            .ok_or_else(|| Error::transport(format!("Interface '{iface}' not found")))?;

        let (tx, _rx) = match pnet_datalink::channel(&interface, Default::default()) {
            Ok(Channel::Ethernet(tx, rx)) => (tx, rx),
            Ok(_) => return Err(Error::transport("Unsupported datalink channel type")),
            Err(e) => {
                return Err(Error::transport(format!(
                    "Failed to open datalink channel on '{iface}': {e}"
                )))
            }
        };

        Ok(Self { tx })
    }

    /// Send one complete frame, link header included
    pub fn send(&mut self, frame: &[u8]) -> Result<()> {
        self.tx
            .send_to(frame, None)
            .ok_or_else(|| Error::transport("Datalink channel closed"))??;
        Ok(())
    }
}

/// Network-layer sender over a raw IP socket with header inclusion
pub struct NetworkSender {
    tx: TransportSender,
}

impl NetworkSender {
    /// Open a raw layer-3 channel
    pub fn open() -> Result<Self> {
        let channel_type = TransportChannelType::Layer3(IpNextHeaderProtocols::Reserved);
        let (tx, _rx) = transport_channel(65536, channel_type)
            .map_err(|e| Error::transport(format!("Failed to open raw IP channel: {e}")))?;
        Ok(Self { tx })
    }

    /// Send one complete IPv4 packet to the given destination
    pub fn send(&mut self, packet: &[u8], dst: Ipv4Addr) -> Result<()> {
        let ip = RawIpv4Packet::new(packet)
            .ok_or_else(|| Error::bad_length("Ipv4", "Built packet shorter than an IPv4 header"))?;
        self.tx.send_to(ip, IpAddr::V4(dst))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_config_default() {
        let config = CaptureConfig::default();
        assert_eq!(config.snaplen, DEFAULT_SNAPLEN);
        assert_eq!(config.read_timeout, DEFAULT_READ_TIMEOUT);
        assert!(config.promiscuous);
        assert!(config.immediate_mode);
    }

    #[test]
    fn test_link_sender_unknown_interface() {
        let err = LinkSender::open("no-such-interface-0").unwrap_err();
        assert!(matches!(err, Error::TransportUnavailable(_)));
    }
}
