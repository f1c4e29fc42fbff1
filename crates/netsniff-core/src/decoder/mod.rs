//! Protocol decoder contract and ordered decoder chains.
//!
//! A decoder inspects one TCP or UDP [`Segment`] and either recognises its
//! protocol (building exactly one event) or declines. Decoders are stateless
//! and pure: the same segment always yields the same answer, and a malformed
//! payload is a local [`DecodeError`] that only makes the decoder decline.
//!
//! Chains run decoders in a fixed priority order and stop at the first claim.

mod chain;
mod error;

use crate::event::{EventSink, SniffEvent};
use crate::layers::Segment;

pub use chain::{DecoderChain, tcp_chain, udp_chain};
pub use error::DecodeError;

/// Application-protocol matcher bound to one transport kind.
pub trait ProtocolDecoder: Send + Sync {
    /// Short identifier, also used as the event protocol label.
    fn name(&self) -> &'static str;

    /// Decode `segment`.
    ///
    /// Returns `Ok(None)` when the payload is not this protocol and
    /// `Err` when it looks like this protocol but cannot be parsed safely.
    fn decode(&self, segment: &Segment<'_>) -> Result<Option<SniffEvent>, DecodeError>;

    /// Decode `segment` and push the resulting event, if any.
    ///
    /// Returns `true` when the decoder claimed the segment.
    fn try_handle(&self, segment: &Segment<'_>, sink: &dyn EventSink) -> bool {
        match self.decode(segment) {
            Ok(Some(event)) => {
                sink.push(event);
                true
            }
            Ok(None) => false,
            Err(err) => {
                log::debug!(
                    "{} decoder declined {} > {}: {err}",
                    self.name(),
                    segment.source(),
                    segment.destination()
                );
                false
            }
        }
    }
}
