//! Layer model for one captured frame.
//!
//! Extraction turns raw frame bytes into borrowed views: a wired
//! network/transport pair or a wireless radiotap/802.11 pair. Views borrow the
//! frame and never outlive one dispatch call. Downstream decoders only read
//! them.

mod error;
mod parser;

use std::fmt;
use std::net::Ipv4Addr;

use pcap_parser::Linktype;

use crate::wireless::WirelessFrameView;

pub use error::LayerError;
pub use parser::extract_layers;

/// One frame as handed over by the capture loop.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    /// Capture time in unix seconds, when the source records one.
    pub timestamp: Option<f64>,
    /// Link-layer type of `data`.
    pub linktype: Linktype,
    /// Name of the interface or file the frame came from.
    pub interface: String,
    pub data: Vec<u8>,
}

impl CapturedFrame {
    pub fn new(timestamp: Option<f64>, linktype: Linktype, data: Vec<u8>) -> Self {
        Self {
            timestamp,
            linktype,
            interface: String::new(),
            data,
        }
    }

    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = interface.into();
        self
    }
}

/// Network layers other than IPv4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkKind {
    Ipv6,
}

impl NetworkKind {
    pub fn label(self) -> &'static str {
        match self {
            NetworkKind::Ipv6 => "ipv6",
        }
    }
}

impl fmt::Display for NetworkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4View<'a> {
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    /// Everything after the IPv4 header (the full transport segment).
    pub payload: &'a [u8],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkLayerView<'a> {
    Ipv4(Ipv4View<'a>),
    Other(NetworkKind),
}

/// Transport protocols the layer model recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    Tcp,
    Udp,
    Icmpv4,
    Icmpv6,
}

impl TransportKind {
    /// Protocol label used in events.
    pub fn label(self) -> &'static str {
        match self {
            TransportKind::Tcp => "tcp",
            TransportKind::Udp => "udp",
            TransportKind::Icmpv4 => "icmp",
            TransportKind::Icmpv6 => "icmpv6",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Ports plus the bytes after the transport header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortsView<'a> {
    pub source_port: u16,
    pub destination_port: u16,
    pub payload: &'a [u8],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportLayerView<'a> {
    Tcp(PortsView<'a>),
    Udp(PortsView<'a>),
    /// A transport without ports (ICMP).
    Other(TransportKind),
}

impl TransportLayerView<'_> {
    pub fn kind(&self) -> TransportKind {
        match self {
            TransportLayerView::Tcp(_) => TransportKind::Tcp,
            TransportLayerView::Udp(_) => TransportKind::Udp,
            TransportLayerView::Other(kind) => *kind,
        }
    }
}

/// Result of a successful extraction.
#[derive(Debug)]
pub enum FrameLayers<'a> {
    Wired {
        network: Ipv4View<'a>,
        transport: TransportLayerView<'a>,
    },
    Wireless(WirelessFrameView<'a>),
}

/// Read-only view of a TCP or UDP segment handed to protocol decoders.
#[derive(Debug, Clone, Copy)]
pub struct Segment<'a> {
    pub timestamp: Option<f64>,
    pub src_ip: Ipv4Addr,
    pub dst_ip: Ipv4Addr,
    pub src_port: u16,
    pub dst_port: u16,
    pub payload: &'a [u8],
}

impl<'a> Segment<'a> {
    pub fn new(timestamp: Option<f64>, network: &Ipv4View<'a>, ports: &PortsView<'a>) -> Self {
        Self {
            timestamp,
            src_ip: network.source,
            dst_ip: network.destination,
            src_port: ports.source_port,
            dst_port: ports.destination_port,
            payload: ports.payload,
        }
    }

    /// Whether either side of the segment uses `port`.
    pub fn involves_port(&self, port: u16) -> bool {
        self.src_port == port || self.dst_port == port
    }

    pub fn source(&self) -> String {
        crate::event::format_endpoint(self.src_ip, self.src_port)
    }

    pub fn destination(&self) -> String {
        crate::event::format_endpoint(self.dst_ip, self.dst_port)
    }
}
