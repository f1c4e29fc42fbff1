use std::fmt;
use std::sync::LazyLock;

use super::ProtocolDecoder;
use crate::event::EventSink;
use crate::layers::{Segment, TransportKind};
use crate::protocols::{
    dns::DnsDecoder, http::HttpDecoder, krb5::Krb5Decoder, mdns::MdnsDecoder,
    ntlm::NtlmDecoder, tls::SniDecoder, upnp::UpnpDecoder,
};

static TCP_CHAIN: LazyLock<DecoderChain> = LazyLock::new(|| {
    DecoderChain::new(
        TransportKind::Tcp,
        vec![
            Box::new(SniDecoder),
            Box::new(NtlmDecoder),
            Box::new(HttpDecoder),
        ],
    )
});

static UDP_CHAIN: LazyLock<DecoderChain> = LazyLock::new(|| {
    DecoderChain::new(
        TransportKind::Udp,
        vec![
            Box::new(DnsDecoder),
            Box::new(MdnsDecoder),
            Box::new(Krb5Decoder),
            Box::new(UpnpDecoder),
        ],
    )
});

/// Process-wide TCP chain: SNI, NTLM, HTTP.
pub fn tcp_chain() -> &'static DecoderChain {
    &TCP_CHAIN
}

/// Process-wide UDP chain: DNS, mDNS, Kerberos, UPnP.
pub fn udp_chain() -> &'static DecoderChain {
    &UDP_CHAIN
}

/// Ordered, short-circuiting list of decoders for one transport kind.
///
/// Order is priority: the first decoder that claims a segment wins and no
/// later decoder sees it. A chain is immutable once built.
///
/// # Examples
/// ```
/// use netsniff_core::{TransportKind, tcp_chain};
///
/// let chain = tcp_chain();
/// assert_eq!(chain.transport(), TransportKind::Tcp);
/// assert_eq!(chain.names(), ["sni", "ntlm", "http"]);
/// ```
pub struct DecoderChain {
    transport: TransportKind,
    decoders: Vec<Box<dyn ProtocolDecoder>>,
}

impl DecoderChain {
    pub fn new(transport: TransportKind, decoders: Vec<Box<dyn ProtocolDecoder>>) -> Self {
        Self {
            transport,
            decoders,
        }
    }

    pub fn transport(&self) -> TransportKind {
        self.transport
    }

    /// Decoder names in priority order.
    pub fn names(&self) -> Vec<&'static str> {
        self.decoders.iter().map(|decoder| decoder.name()).collect()
    }

    /// Run the decoders in order until one claims `segment`.
    ///
    /// Returns `true` when a decoder claimed it (and pushed its event).
    pub fn dispatch(&self, segment: &Segment<'_>, sink: &dyn EventSink) -> bool {
        self.decoders
            .iter()
            .any(|decoder| decoder.try_handle(segment, sink))
    }
}

impl fmt::Debug for DecoderChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderChain")
            .field("transport", &self.transport)
            .field("decoders", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::DecodeError;
    use crate::event::{MemorySink, SniffEvent};
    use std::net::Ipv4Addr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        name: &'static str,
        claims: bool,
        calls: AtomicUsize,
    }

    impl Fixed {
        fn new(name: &'static str, claims: bool) -> Self {
            Self {
                name,
                claims,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl ProtocolDecoder for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        fn decode(&self, segment: &Segment<'_>) -> Result<Option<SniffEvent>, DecodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.claims.then(|| {
                SniffEvent::new(segment.timestamp, self.name, segment.source(), segment.destination())
            }))
        }
    }

    struct Broken;

    impl ProtocolDecoder for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn decode(&self, _segment: &Segment<'_>) -> Result<Option<SniffEvent>, DecodeError> {
            Err(DecodeError::Malformed { reason: "always" })
        }
    }

    fn segment(payload: &[u8]) -> Segment<'_> {
        Segment {
            timestamp: None,
            src_ip: Ipv4Addr::new(10, 0, 0, 1),
            dst_ip: Ipv4Addr::new(10, 0, 0, 2),
            src_port: 1000,
            dst_port: 2000,
            payload,
        }
    }

    #[test]
    fn first_claim_wins() {
        let chain = DecoderChain::new(
            TransportKind::Tcp,
            vec![
                Box::new(Fixed::new("a", false)),
                Box::new(Fixed::new("b", true)),
                Box::new(Fixed::new("c", true)),
            ],
        );
        let sink = MemorySink::new();
        assert!(chain.dispatch(&segment(b"x"), &sink));
        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].protocol, "b");
    }

    #[test]
    fn unclaimed_segment_pushes_nothing() {
        let chain = DecoderChain::new(
            TransportKind::Udp,
            vec![Box::new(Fixed::new("a", false)), Box::new(Broken)],
        );
        let sink = MemorySink::new();
        assert!(!chain.dispatch(&segment(b"x"), &sink));
        assert!(sink.is_empty());
    }

    #[test]
    fn parse_failure_falls_through_to_next_decoder() {
        let chain = DecoderChain::new(
            TransportKind::Udp,
            vec![Box::new(Broken), Box::new(Fixed::new("next", true))],
        );
        let sink = MemorySink::new();
        assert!(chain.dispatch(&segment(b"x"), &sink));
        assert_eq!(sink.events()[0].protocol, "next");
    }

    #[test]
    fn standard_chains_have_fixed_order() {
        assert_eq!(tcp_chain().names(), ["sni", "ntlm", "http"]);
        assert_eq!(udp_chain().names(), ["dns", "mdns", "krb5", "upnp"]);
    }
}
