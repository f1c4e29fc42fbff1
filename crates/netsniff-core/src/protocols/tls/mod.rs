//! TLS ClientHello decoding for Server Name Indication.
//!
//! The decoder claims a TCP segment when it starts with a TLS handshake
//! record whose ClientHello carries a `server_name` extension. Records split
//! across segments are parsed as far as the captured bytes allow; truncated
//! handshakes are reported as decode errors and declined.

pub mod layout;
pub mod parser;

use crate::decoder::{DecodeError, ProtocolDecoder};
use crate::event::SniffEvent;
use crate::layers::Segment;

pub use parser::{ClientHello, parse_client_hello};

/// Claims TLS ClientHello messages carrying a host name.
pub struct SniDecoder;

impl ProtocolDecoder for SniDecoder {
    fn name(&self) -> &'static str {
        "sni"
    }

    fn decode(&self, segment: &Segment<'_>) -> Result<Option<SniffEvent>, DecodeError> {
        let Some(hello) = parse_client_hello(segment.payload)? else {
            return Ok(None);
        };
        let Some(domain) = hello.server_name else {
            return Ok(None);
        };

        let event = SniffEvent::new(
            segment.timestamp,
            self.name(),
            segment.source(),
            segment.destination(),
        )
        .with_data("Domain", domain.as_str())
        .with_data("Version", version_label(hello.version))
        .with_message(
            "{} {} > https://{}",
            [self.name().to_string(), segment.src_ip.to_string(), domain],
        );
        Ok(Some(event))
    }
}

pub fn version_label(version: u16) -> &'static str {
    match version {
        0x0300 => "SSLv3",
        0x0301 => "TLSv1.0",
        0x0302 => "TLSv1.1",
        0x0303 => "TLSv1.2",
        0x0304 => "TLSv1.3",
        _ => "unknown",
    }
}
