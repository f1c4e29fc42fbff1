//! NTLM authentication exchange detection.
//!
//! NTLMSSP messages are recognised raw anywhere in a TCP payload or
//! base64-encoded in HTTP `Authorization`/`WWW-Authenticate` headers. The
//! decoder is stateless: each message is reported on its own, so challenges
//! are not correlated with the authentication that follows.

pub mod layout;
pub mod parser;

use crate::decoder::{DecodeError, ProtocolDecoder};
use crate::event::SniffEvent;
use crate::layers::Segment;

pub use parser::{NtlmMessage, find_ntlm_message};

/// Claims segments carrying an NTLMSSP message.
pub struct NtlmDecoder;

impl ProtocolDecoder for NtlmDecoder {
    fn name(&self) -> &'static str {
        "ntlm"
    }

    fn decode(&self, segment: &Segment<'_>) -> Result<Option<SniffEvent>, DecodeError> {
        let Some(message) = find_ntlm_message(segment.payload)? else {
            return Ok(None);
        };
        let event = SniffEvent::new(
            segment.timestamp,
            self.name(),
            segment.source(),
            segment.destination(),
        );
        let src = segment.src_ip.to_string();
        let dst = segment.dst_ip.to_string();

        let event = match message {
            NtlmMessage::Negotiate { flags } => event
                .with_data("Type", "negotiate")
                .with_data("Flags", format!("0x{flags:08x}"))
                .with_message("{} {} > {} negotiate", [self.name(), src.as_str(), dst.as_str()]),
            NtlmMessage::Challenge {
                flags,
                target_name,
                server_challenge,
            } => {
                let challenge = parser::hex(&server_challenge);
                event
                    .with_data("Type", "challenge")
                    .with_data("Flags", format!("0x{flags:08x}"))
                    .with_data("Challenge", challenge.as_str())
                    .with_optional("Target", &target_name)
                    .with_message(
                        "{} {} > {} challenge {}",
                        [self.name(), src.as_str(), dst.as_str(), challenge.as_str()],
                    )
            }
            NtlmMessage::Authenticate {
                flags,
                domain,
                user,
                workstation,
                nt_response_len,
            } => event
                .with_data("Type", "authenticate")
                .with_data("Flags", format!("0x{flags:08x}"))
                .with_data("Domain", domain.as_str())
                .with_data("User", user.as_str())
                .with_data("Workstation", workstation.as_str())
                .with_data("NtResponseLen", nt_response_len)
                .with_message(
                    "{} {} > {} {}\\{} from {}",
                    [
                        self.name(),
                        src.as_str(),
                        dst.as_str(),
                        domain.as_str(),
                        user.as_str(),
                        workstation.as_str(),
                    ],
                ),
        };
        Ok(Some(event))
    }
}
