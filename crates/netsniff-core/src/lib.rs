//! netsniff core library: layer extraction and ordered protocol dispatch for
//! a passive network sniffer.
//!
//! Captured frames flow through one pipeline: a packet source yields frames,
//! the dispatcher extracts their layers (wired IPv4/TCP/UDP or 802.11), and
//! the TCP or UDP decoder chain gives each application decoder a chance to
//! claim the frame. The first decoder that claims a frame emits its event and
//! stops the chain; unclaimed traffic produces a generic summary only in
//! verbose mode. Events go to an [`EventSink`], which never blocks the caller.
//!
//! Invariants:
//! - At most one event is emitted per frame.
//! - Chain order is fixed: SNI, NTLM, HTTP for TCP; DNS, mDNS, Kerberos,
//!   UPnP for UDP.
//! - Malformed input only makes a decoder decline; it never stops capture.
//!
//! Version française (résumé):
//! Cette crate extrait les couches d'une trame capturée et la fait passer
//! par une chaîne ordonnée de décodeurs (le premier qui reconnaît la trame
//! gagne). Un événement générique n'est émis qu'en mode verbeux. Les trames
//! 802.11 sont confiées au décodeur sans fil.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use netsniff_core::{MemorySink, SniffOptions, sniff_pcap_file};
//!
//! let sink = MemorySink::new();
//! let summary = sniff_pcap_file(Path::new("capture.pcapng"), &sink, &SniffOptions::default())?;
//! println!("{} of {} frames classified", summary.frames_matched, summary.frames_total);
//! for event in sink.take() {
//!     println!("{}", event.render_message());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod capture;
mod decoder;
mod dispatch;
mod event;
mod layers;
pub mod protocols;
mod source;
pub mod wireless;

pub use capture::{CaptureError, CaptureSummary, SniffOptions, sniff_pcap_file, sniff_source};
pub use decoder::{DecodeError, DecoderChain, ProtocolDecoder, tcp_chain, udp_chain};
pub use dispatch::{Dispatcher, classify};
pub use event::{ChannelSink, EventSink, MemorySink, SniffData, SniffEvent};
pub use layers::{
    CapturedFrame, FrameLayers, Ipv4View, LayerError, NetworkKind, NetworkLayerView, PortsView,
    Segment, TransportKind, TransportLayerView, extract_layers,
};
pub use source::{PacketSource, PcapFileSource, SourceError};
pub use wireless::{
    Dot11Decoder, LINKTYPE_IEEE802_11, LINKTYPE_IEEE802_11_RADIOTAP, WirelessDecoder,
    WirelessFrameView,
};
