//! Plain-text HTTP/1.x request and response decoding.
//!
//! Only the start line and header block of a single segment are inspected;
//! bodies and pipelined messages are ignored.

use crate::decoder::{DecodeError, ProtocolDecoder};
use crate::event::SniffEvent;
use crate::layers::Segment;
use crate::protocols::common::HeaderBlock;

const METHODS: [&str; 9] = [
    "GET", "POST", "PUT", "DELETE", "HEAD", "OPTIONS", "PATCH", "TRACE", "CONNECT",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpMessage<'a> {
    Request {
        method: &'a str,
        path: &'a str,
        host: Option<&'a str>,
        user_agent: Option<&'a str>,
        content_type: Option<&'a str>,
    },
    Response {
        status: u16,
        reason: &'a str,
        server: Option<&'a str>,
        content_type: Option<&'a str>,
    },
}

/// Parse the head of an HTTP/1.x message.
///
/// Returns `Ok(None)` when the start line is neither a request with a known
/// method nor a status line.
pub fn parse_http(payload: &[u8]) -> Result<Option<HttpMessage<'_>>, DecodeError> {
    let Some(block) = HeaderBlock::parse(payload) else {
        return Ok(None);
    };
    let mut parts = block.start_line.splitn(3, ' ');
    let first = parts.next().unwrap_or_default();

    if first.starts_with("HTTP/") {
        let status = parts
            .next()
            .and_then(|code| code.parse::<u16>().ok())
            .ok_or(DecodeError::Malformed {
                reason: "status line without a numeric status",
            })?;
        return Ok(Some(HttpMessage::Response {
            status,
            reason: parts.next().unwrap_or_default(),
            server: block.get("server"),
            content_type: block.get("content-type"),
        }));
    }

    if !METHODS.contains(&first) {
        return Ok(None);
    }
    let (Some(path), Some(version)) = (parts.next(), parts.next()) else {
        return Err(DecodeError::Malformed {
            reason: "request line is incomplete",
        });
    };
    if !version.starts_with("HTTP/") {
        return Err(DecodeError::Malformed {
            reason: "request line without HTTP version",
        });
    }
    Ok(Some(HttpMessage::Request {
        method: first,
        path,
        host: block.get("host"),
        user_agent: block.get("user-agent"),
        content_type: block.get("content-type"),
    }))
}

/// Claims HTTP/1.x requests and responses.
pub struct HttpDecoder;

impl ProtocolDecoder for HttpDecoder {
    fn name(&self) -> &'static str {
        "http"
    }

    fn decode(&self, segment: &Segment<'_>) -> Result<Option<SniffEvent>, DecodeError> {
        let Some(message) = parse_http(segment.payload)? else {
            return Ok(None);
        };
        let event = SniffEvent::new(
            segment.timestamp,
            self.name(),
            segment.source(),
            segment.destination(),
        );
        let src = segment.src_ip.to_string();

        let event = match message {
            HttpMessage::Request {
                method,
                path,
                host,
                user_agent,
                content_type,
            } => {
                let host = host.unwrap_or_default();
                event
                    .with_data("Method", method)
                    .with_data("Path", path)
                    .with_optional("Host", host)
                    .with_optional("UserAgent", user_agent.unwrap_or_default())
                    .with_optional("ContentType", content_type.unwrap_or_default())
                    .with_message(
                        "{} {} {} {}{}",
                        [self.name(), src.as_str(), method, host, path],
                    )
            }
            HttpMessage::Response {
                status,
                reason,
                server,
                content_type,
            } => {
                let status_text = status.to_string();
                event
                    .with_data("Status", status)
                    .with_optional("Reason", reason)
                    .with_optional("Server", server.unwrap_or_default())
                    .with_optional("ContentType", content_type.unwrap_or_default())
                    .with_message(
                        "{} {} < {} {}",
                        [self.name(), src.as_str(), status_text.as_str(), reason],
                    )
            }
        };
        Ok(Some(event))
    }
}
