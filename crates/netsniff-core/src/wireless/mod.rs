//! Monitor-mode 802.11 traffic.
//!
//! Frames captured with a radiotap header (or as bare 802.11) are decoded
//! into a [`WirelessFrameView`] and handed to a [`WirelessDecoder`]. Wireless
//! frames never produce the generic fallback event: a decoder either emits
//! its own event or the frame stays silent.

mod decoder;
pub mod dot11;
mod error;
pub mod radiotap;

use pcap_parser::Linktype;

use crate::event::EventSink;

pub use decoder::Dot11Decoder;
pub use dot11::{Dot11Frame, FrameType, MacAddr};
pub use error::WirelessError;
pub use radiotap::RadiotapHeader;

/// `LINKTYPE_IEEE802_11`: bare 802.11 frames.
pub const LINKTYPE_IEEE802_11: Linktype = Linktype(105);
/// `LINKTYPE_IEEE802_11_RADIOTAP`: radiotap header followed by an 802.11 frame.
pub const LINKTYPE_IEEE802_11_RADIOTAP: Linktype = Linktype(127);

/// Radio header plus 802.11 frame of one captured wireless frame.
#[derive(Debug, Clone, PartialEq)]
pub struct WirelessFrameView<'a> {
    pub timestamp: Option<f64>,
    /// Absent for bare 802.11 captures.
    pub radiotap: Option<RadiotapHeader>,
    pub frame: Dot11Frame<'a>,
}

impl WirelessFrameView<'_> {
    /// Antenna signal in dBm, when the radio header reports it.
    pub fn signal(&self) -> Option<i8> {
        self.radiotap.as_ref().and_then(|header| header.antenna_signal)
    }

    /// Channel the radio was tuned to, when known.
    pub fn radio_channel(&self) -> Option<u16> {
        self.radiotap.as_ref().and_then(RadiotapHeader::channel)
    }
}

/// Consumer of decoded wireless frames.
pub trait WirelessDecoder: Send + Sync {
    /// Emit an event for `view` if it is of interest.
    ///
    /// Returns `true` when an event was pushed.
    fn try_handle(&self, view: &WirelessFrameView<'_>, verbose: bool, sink: &dyn EventSink)
    -> bool;
}

/// Decode a wireless frame of the given link type.
///
/// Returns `None` for wired link types and for frames whose radio or MAC
/// header cannot be decoded.
pub fn parse_wireless(
    timestamp: Option<f64>,
    linktype: Linktype,
    data: &[u8],
) -> Option<WirelessFrameView<'_>> {
    let parsed = match linktype {
        LINKTYPE_IEEE802_11_RADIOTAP => RadiotapHeader::parse(data).and_then(|(header, frame)| {
            Dot11Frame::parse(frame).map(|frame| (Some(header), frame))
        }),
        LINKTYPE_IEEE802_11 => Dot11Frame::parse(data).map(|frame| (None, frame)),
        _ => return None,
    };
    match parsed {
        Ok((radiotap, frame)) => Some(WirelessFrameView {
            timestamp,
            radiotap,
            frame,
        }),
        Err(err) => {
            log::debug!("wireless frame dropped: {err}");
            None
        }
    }
}
