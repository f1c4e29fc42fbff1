use etherparse::{LaxNetSlice, LaxSlicedPacket, TransportSlice};
use pcap_parser::Linktype;

use super::error::LayerError;
use super::{
    CapturedFrame, FrameLayers, Ipv4View, NetworkKind, NetworkLayerView, PortsView,
    TransportKind, TransportLayerView,
};
use crate::wireless::parse_wireless;

/// Wired layers as sliced, before the IPv4/transport requirements apply.
struct WiredLayers<'a> {
    network: NetworkLayerView<'a>,
    transport: Option<TransportLayerView<'a>>,
}

/// Extract the layer views of `frame`.
///
/// Wired extraction runs first; wireless extraction is only attempted when
/// the frame has no wired network layer at all.
///
/// # Errors
/// - `UnsupportedNetworkLayer` when the network layer is not IPv4.
/// - `MissingTransportLayer` when IPv4 carries no resolvable transport.
/// - `UnclassifiableFrame` when neither wired nor wireless extraction applies.
pub fn extract_layers(frame: &CapturedFrame) -> Result<FrameLayers<'_>, LayerError> {
    if let Some(wired) = slice_wired(frame.linktype, &frame.data) {
        let network = match wired.network {
            NetworkLayerView::Ipv4(ipv4) => ipv4,
            NetworkLayerView::Other(kind) => {
                return Err(LayerError::UnsupportedNetworkLayer { kind });
            }
        };
        let transport = wired.transport.ok_or(LayerError::MissingTransportLayer)?;
        return Ok(FrameLayers::Wired { network, transport });
    }

    parse_wireless(frame.timestamp, frame.linktype, &frame.data)
        .map(FrameLayers::Wireless)
        .ok_or(LayerError::UnclassifiableFrame)
}

fn slice_wired(linktype: Linktype, data: &[u8]) -> Option<WiredLayers<'_>> {
    // Lax slicing keeps whatever layers fit in a snaplen-truncated frame.
    let sliced = match linktype {
        Linktype::ETHERNET => {
            LaxSlicedPacket::from_ethernet(data).map_err(|e| e.to_string())
        }
        Linktype::RAW | Linktype::IPV4 => {
            LaxSlicedPacket::from_ip(data).map_err(|e| e.to_string())
        }
        _ => return None,
    };
    let sliced = match sliced {
        Ok(sliced) => sliced,
        Err(err) => {
            log::debug!("wired slicing failed: {err}");
            return None;
        }
    };
    if let Some((err, layer)) = &sliced.stop_err {
        log::debug!("wired slicing stopped at {layer:?}: {err}");
    }

    let network = match sliced.net? {
        LaxNetSlice::Ipv4(ipv4) => NetworkLayerView::Ipv4(Ipv4View {
            source: ipv4.header().source_addr(),
            destination: ipv4.header().destination_addr(),
            payload: ipv4.payload().payload,
        }),
        LaxNetSlice::Ipv6(_) => NetworkLayerView::Other(NetworkKind::Ipv6),
        #[allow(unreachable_patterns)]
        _ => return None,
    };

    let transport = sliced.transport.map(|transport| match transport {
        TransportSlice::Tcp(tcp) => TransportLayerView::Tcp(PortsView {
            source_port: tcp.source_port(),
            destination_port: tcp.destination_port(),
            payload: tcp.payload(),
        }),
        TransportSlice::Udp(udp) => TransportLayerView::Udp(PortsView {
            source_port: udp.source_port(),
            destination_port: udp.destination_port(),
            payload: udp.payload(),
        }),
        TransportSlice::Icmpv4(_) => TransportLayerView::Other(TransportKind::Icmpv4),
        TransportSlice::Icmpv6(_) => TransportLayerView::Other(TransportKind::Icmpv6),
    });

    Some(WiredLayers { network, transport })
}
