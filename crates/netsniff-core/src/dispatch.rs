//! Frame dispatcher: the per-frame entry point of the sniffer.
//!
//! Wired frames are routed to the TCP or UDP decoder chain; unclaimed traffic
//! produces a generic summary only in verbose mode. Frames without a wired
//! network layer are tried as 802.11 and handed to the wireless decoder,
//! which never falls back to a generic event.
//!
//! The dispatcher holds no mutable state, so one instance can classify frames
//! from several capture threads at once.
//!
//! Version française (résumé):
//! Le répartiteur extrait les couches d'une trame, la confie à la chaîne de
//! décodeurs TCP ou UDP (premier décodeur qui reconnaît la trame gagne), et
//! n'émet un événement générique qu'en mode verbeux. Les trames 802.11 sont
//! confiées au décodeur sans fil.

use crate::decoder::{DecoderChain, tcp_chain, udp_chain};
use crate::event::{EventSink, SniffEvent, network_summary, transport_summary};
use crate::layers::{
    CapturedFrame, FrameLayers, Ipv4View, PortsView, Segment, TransportLayerView, extract_layers,
};
use crate::wireless::{Dot11Decoder, WirelessDecoder};

/// Routes captured frames to decoder chains and the wireless decoder.
///
/// # Examples
/// ```
/// use etherparse::PacketBuilder;
/// use netsniff_core::{CapturedFrame, Dispatcher, MemorySink};
/// use pcap_parser::Linktype;
///
/// let builder = PacketBuilder::ipv4([10, 0, 0, 1], [10, 0, 0, 2], 64).udp(4000, 4001);
/// let mut packet = Vec::new();
/// builder.write(&mut packet, b"hello").unwrap();
///
/// let sink = MemorySink::new();
/// let frame = CapturedFrame::new(Some(1.0), Linktype::RAW, packet);
/// assert!(Dispatcher::standard().classify(&frame, true, &sink));
/// assert_eq!(sink.events()[0].protocol, "udp");
/// ```
#[derive(Clone, Copy)]
pub struct Dispatcher<'c> {
    tcp: &'c DecoderChain,
    udp: &'c DecoderChain,
    wireless: &'c dyn WirelessDecoder,
}

impl<'c> Dispatcher<'c> {
    pub fn new(
        tcp: &'c DecoderChain,
        udp: &'c DecoderChain,
        wireless: &'c dyn WirelessDecoder,
    ) -> Self {
        Self { tcp, udp, wireless }
    }

    /// Dispatcher over the process-wide chains and the 802.11 decoder.
    pub fn standard() -> Dispatcher<'static> {
        Dispatcher::new(tcp_chain(), udp_chain(), &Dot11Decoder)
    }

    /// Classify one frame, pushing at most one event to `sink`.
    ///
    /// Returns `true` when the frame resolved to IPv4 plus a transport layer
    /// (whether or not a decoder claimed it) or decoded as a wireless frame.
    pub fn classify(&self, frame: &CapturedFrame, verbose: bool, sink: &dyn EventSink) -> bool {
        match extract_layers(frame) {
            Ok(FrameLayers::Wired { network, transport }) => {
                self.classify_wired(frame, &network, transport, verbose, sink);
                true
            }
            Ok(FrameLayers::Wireless(view)) => {
                self.wireless.try_handle(&view, verbose, sink);
                true
            }
            Err(err) => {
                log::debug!(
                    "dropping {} byte frame from {:?}: {err}",
                    frame.data.len(),
                    frame.interface
                );
                false
            }
        }
    }

    fn classify_wired(
        &self,
        frame: &CapturedFrame,
        network: &Ipv4View<'_>,
        transport: TransportLayerView<'_>,
        verbose: bool,
        sink: &dyn EventSink,
    ) {
        let (chain, ports) = match transport {
            TransportLayerView::Tcp(ports) => (self.tcp, ports),
            TransportLayerView::Udp(ports) => (self.udp, ports),
            TransportLayerView::Other(kind) => {
                if verbose {
                    sink.push(network_summary(
                        frame.timestamp,
                        kind.label(),
                        network.source,
                        network.destination,
                        network.payload.len(),
                    ));
                }
                return;
            }
        };

        let segment = Segment::new(frame.timestamp, network, &ports);
        if chain.dispatch(&segment, sink) || !verbose {
            return;
        }
        sink.push(generic_event(frame, network, &ports, chain));
    }
}

fn generic_event(
    frame: &CapturedFrame,
    network: &Ipv4View<'_>,
    ports: &PortsView<'_>,
    chain: &DecoderChain,
) -> SniffEvent {
    transport_summary(
        frame.timestamp,
        chain.transport().label(),
        (network.source, ports.source_port),
        (network.destination, ports.destination_port),
        ports.payload.len(),
    )
}

impl std::fmt::Debug for Dispatcher<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("tcp", self.tcp)
            .field("udp", self.udp)
            .finish_non_exhaustive()
    }
}

/// Classify `frame` with the [standard](Dispatcher::standard) dispatcher.
pub fn classify(frame: &CapturedFrame, verbose: bool, sink: &dyn EventSink) -> bool {
    Dispatcher::standard().classify(frame, verbose, sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::MemorySink;
    use crate::layers::TransportKind;
    use etherparse::PacketBuilder;
    use pcap_parser::Linktype;

    fn udp_frame(src_port: u16, dst_port: u16, payload: &[u8]) -> CapturedFrame {
        let builder = PacketBuilder::ipv4([10, 0, 0, 1], [10, 0, 0, 2], 64).udp(src_port, dst_port);
        let mut packet = Vec::with_capacity(builder.size(payload.len()));
        builder.write(&mut packet, payload).unwrap();
        CapturedFrame::new(Some(7.0), Linktype::RAW, packet)
    }

    #[test]
    fn unclaimed_udp_is_silent_unless_verbose() {
        let frame = udp_frame(4000, 4001, b"payload");
        let sink = MemorySink::new();
        assert!(Dispatcher::standard().classify(&frame, false, &sink));
        assert!(sink.is_empty());

        assert!(Dispatcher::standard().classify(&frame, true, &sink));
        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].protocol, "udp");
        assert_eq!(events[0].source, "10.0.0.1:4000");
        assert_eq!(events[0].data["Size"], 7);
    }

    #[test]
    fn custom_chains_are_honoured() {
        let empty_tcp = DecoderChain::new(TransportKind::Tcp, Vec::new());
        let empty_udp = DecoderChain::new(TransportKind::Udp, Vec::new());
        let dispatcher = Dispatcher::new(&empty_tcp, &empty_udp, &Dot11Decoder);
        let dns = crate::protocols::dns::parser::tests::message(1, "example.com", None);
        let frame = udp_frame(40000, 53, &dns);

        let sink = MemorySink::new();
        assert!(dispatcher.classify(&frame, true, &sink));
        assert_eq!(sink.events()[0].protocol, "udp");
    }

    #[test]
    fn unclassifiable_frame_is_not_matched() {
        let frame = CapturedFrame::new(None, Linktype::ETHERNET, vec![0; 4]);
        let sink = MemorySink::new();
        assert!(!classify(&frame, true, &sink));
        assert!(sink.is_empty());
    }
}
