//! Kerberos v5 over UDP port 88.
//!
//! KDC requests, replies and errors are decoded from their DER encoding far
//! enough to report realm, client and service principals. An AS-REQ carrying
//! an encrypted pre-authentication timestamp is also reported in hashcat
//! `krb5pa` form.

pub mod der;
pub mod layout;
pub mod parser;

use crate::decoder::{DecodeError, ProtocolDecoder};
use crate::event::SniffEvent;
use crate::layers::Segment;

pub use parser::{KrbMessage, KrbMessageKind, parse_krb5};

/// Claims Kerberos KDC traffic.
pub struct Krb5Decoder;

impl ProtocolDecoder for Krb5Decoder {
    fn name(&self) -> &'static str {
        "krb5"
    }

    fn decode(&self, segment: &Segment<'_>) -> Result<Option<SniffEvent>, DecodeError> {
        if !segment.involves_port(layout::KERBEROS_PORT) {
            return Ok(None);
        }
        let Some(message) = parse_krb5(segment.payload)? else {
            return Ok(None);
        };

        let realm = message.realm.as_deref().unwrap_or_default();
        let client = message.client.as_deref().unwrap_or_default();
        let service = message.service.as_deref().unwrap_or_default();
        let principal = match (client.is_empty(), realm.is_empty()) {
            (false, false) => format!("{client}@{realm}"),
            (false, true) => client.to_string(),
            _ => realm.to_string(),
        };
        let detail = match message.error_code {
            Some(code) => parser::error_name(code).to_string(),
            None => principal,
        };

        let mut event = SniffEvent::new(
            segment.timestamp,
            self.name(),
            segment.source(),
            segment.destination(),
        )
        .with_data("MsgType", message.kind.label())
        .with_optional("Realm", realm)
        .with_optional("Client", client)
        .with_optional("Service", service);
        if let Some(code) = message.error_code {
            event = event.with_data("ErrorCode", code);
        }
        if let Some(timestamp) = &message.enc_timestamp {
            event = event.with_data("Hash", krb5pa_hash(client, realm, timestamp));
        }

        let src = segment.src_ip.to_string();
        let event = event.with_message(
            "{} {} {} {}",
            [self.name(), src.as_str(), message.kind.label(), detail.as_str()],
        );
        Ok(Some(event))
    }
}

fn krb5pa_hash(client: &str, realm: &str, timestamp: &parser::EncryptedTimestamp) -> String {
    let cipher: String = timestamp
        .cipher
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect();
    format!(
        "$krb5pa${}${}${}$${}",
        timestamp.etype, client, realm, cipher
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn segment(payload: &[u8]) -> Segment<'_> {
        Segment {
            timestamp: None,
            src_ip: Ipv4Addr::new(10, 0, 0, 5),
            dst_ip: Ipv4Addr::new(10, 0, 0, 1),
            src_port: 50000,
            dst_port: layout::KERBEROS_PORT,
            payload,
        }
    }

    #[test]
    fn as_req_event_includes_hash() {
        let payload = parser::tests::as_req("alice", "CORP.LOCAL", &[0xab; 4]);
        let event = Krb5Decoder.decode(&segment(&payload)).unwrap().unwrap();
        assert_eq!(event.data["MsgType"], "AS-REQ");
        assert_eq!(event.data["Hash"], "$krb5pa$23$alice$CORP.LOCAL$$abababab");
        assert_eq!(
            event.render_message(),
            "krb5 10.0.0.5 AS-REQ alice@CORP.LOCAL"
        );
    }

    #[test]
    fn error_event_names_the_code() {
        let payload = parser::tests::krb_error(25, "CORP.LOCAL");
        let event = Krb5Decoder.decode(&segment(&payload)).unwrap().unwrap();
        assert_eq!(event.data["ErrorCode"], 25);
        assert_eq!(
            event.render_message(),
            "krb5 10.0.0.5 KRB-ERROR KDC_ERR_PREAUTH_REQUIRED"
        );
    }
}
