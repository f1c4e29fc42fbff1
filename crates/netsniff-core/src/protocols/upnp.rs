//! SSDP discovery traffic (UPnP) on UDP port 1900.

use crate::decoder::{DecodeError, ProtocolDecoder};
use crate::event::SniffEvent;
use crate::layers::Segment;
use crate::protocols::common::HeaderBlock;

pub const SSDP_PORT: u16 = 1900;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsdpMessage<'a> {
    /// `M-SEARCH`, `NOTIFY` or `RESPONSE` for search replies.
    pub method: &'a str,
    /// Search target (`ST`) or notification type (`NT`).
    pub target: Option<&'a str>,
    pub location: Option<&'a str>,
    pub server: Option<&'a str>,
    pub usn: Option<&'a str>,
}

pub fn parse_ssdp(payload: &[u8]) -> Result<Option<SsdpMessage<'_>>, DecodeError> {
    let Some(block) = HeaderBlock::parse(payload) else {
        return Ok(None);
    };
    let method = match block.start_line.split(' ').next().unwrap_or_default() {
        method @ ("M-SEARCH" | "NOTIFY") => method,
        version if version.starts_with("HTTP/") => "RESPONSE",
        _ => return Ok(None),
    };
    if !block.start_line.contains("HTTP/") {
        return Err(DecodeError::Malformed {
            reason: "SSDP start line without HTTP version",
        });
    }
    Ok(Some(SsdpMessage {
        method,
        target: block.get("st").or_else(|| block.get("nt")),
        location: block.get("location"),
        server: block.get("server"),
        usn: block.get("usn"),
    }))
}

/// Claims SSDP searches, notifications and search responses.
pub struct UpnpDecoder;

impl ProtocolDecoder for UpnpDecoder {
    fn name(&self) -> &'static str {
        "upnp"
    }

    fn decode(&self, segment: &Segment<'_>) -> Result<Option<SniffEvent>, DecodeError> {
        if !segment.involves_port(SSDP_PORT) {
            return Ok(None);
        }
        let Some(message) = parse_ssdp(segment.payload)? else {
            return Ok(None);
        };

        let target = message.target.unwrap_or_default();
        let src = segment.src_ip.to_string();
        let event = SniffEvent::new(
            segment.timestamp,
            self.name(),
            segment.source(),
            segment.destination(),
        )
        .with_data("Method", message.method)
        .with_optional("Target", target)
        .with_optional("Location", message.location.unwrap_or_default())
        .with_optional("Server", message.server.unwrap_or_default())
        .with_optional("Usn", message.usn.unwrap_or_default())
        .with_message(
            "{} {} {} {}",
            [self.name(), src.as_str(), message.method, target],
        );
        Ok(Some(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn segment(payload: &[u8]) -> Segment<'_> {
        Segment {
            timestamp: None,
            src_ip: Ipv4Addr::new(192, 168, 1, 20),
            dst_ip: Ipv4Addr::new(239, 255, 255, 250),
            src_port: 50123,
            dst_port: SSDP_PORT,
            payload,
        }
    }

    #[test]
    fn notify_reports_type_and_location() {
        let payload = b"NOTIFY * HTTP/1.1\r\nHOST: 239.255.255.250:1900\r\nNT: upnp:rootdevice\r\nNTS: ssdp:alive\r\nLOCATION: http://192.168.1.20:8080/desc.xml\r\nUSN: uuid:1234::upnp:rootdevice\r\n\r\n";
        let event = UpnpDecoder.decode(&segment(payload)).unwrap().unwrap();
        assert_eq!(event.data["Method"], "NOTIFY");
        assert_eq!(event.data["Location"], "http://192.168.1.20:8080/desc.xml");
        assert_eq!(
            event.render_message(),
            "upnp 192.168.1.20 NOTIFY upnp:rootdevice"
        );
    }

    #[test]
    fn search_response_is_claimed() {
        let message = parse_ssdp(b"HTTP/1.1 200 OK\r\nST: ssdp:all\r\nSERVER: Linux UPnP/1.0\r\n\r\n")
            .unwrap()
            .unwrap();
        assert_eq!(message.method, "RESPONSE");
        assert_eq!(message.target, Some("ssdp:all"));
        assert_eq!(message.server, Some("Linux UPnP/1.0"));
    }

    #[test]
    fn non_ssdp_payload_is_declined() {
        assert!(UpnpDecoder.decode(&segment(b"\x00\x01binary")).unwrap().is_none());
        assert!(parse_ssdp(b"M-SEARCH *\r\n\r\n").is_err());
    }
}
