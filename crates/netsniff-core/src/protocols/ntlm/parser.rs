use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::layout;
use crate::decoder::DecodeError;
use crate::protocols::common::headers::find_subslice;
use crate::protocols::common::{ByteReader, HeaderBlock};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NtlmMessage {
    Negotiate {
        flags: u32,
    },
    Challenge {
        flags: u32,
        target_name: String,
        server_challenge: [u8; layout::SERVER_CHALLENGE_LEN],
    },
    Authenticate {
        flags: u32,
        domain: String,
        user: String,
        workstation: String,
        nt_response_len: usize,
    },
}

/// Locate and parse an NTLMSSP message in a TCP payload.
///
/// The message is either carried raw (SMB, RPC) or base64-encoded in an HTTP
/// authentication header. Returns `Ok(None)` when neither is present.
pub fn find_ntlm_message(payload: &[u8]) -> Result<Option<NtlmMessage>, DecodeError> {
    if let Some(pos) = find_subslice(payload, layout::SIGNATURE) {
        return parse_message(&payload[pos..]).map(Some);
    }

    let Some(block) = HeaderBlock::parse(payload) else {
        return Ok(None);
    };
    for header in layout::AUTH_HEADERS {
        for value in block.get_all(header) {
            let Some(token) = auth_token(value) else {
                continue;
            };
            let decoded = match STANDARD.decode(token) {
                Ok(decoded) => decoded,
                Err(err) => {
                    log::debug!("skipping {header} token: {err}");
                    continue;
                }
            };
            if let Some(pos) = find_subslice(&decoded, layout::SIGNATURE) {
                return parse_message(&decoded[pos..]).map(Some);
            }
        }
    }
    Ok(None)
}

/// Parse a message starting at the `NTLMSSP\0` signature.
pub fn parse_message(message: &[u8]) -> Result<NtlmMessage, DecodeError> {
    let reader = ByteReader::new(message);
    match reader.read_u32_le(layout::MESSAGE_TYPE_OFFSET)? {
        layout::MESSAGE_NEGOTIATE => Ok(NtlmMessage::Negotiate {
            flags: reader.read_u32_le(layout::NEGOTIATE_FLAGS_OFFSET)?,
        }),
        layout::MESSAGE_CHALLENGE => {
            let flags = reader.read_u32_le(layout::CHALLENGE_FLAGS_OFFSET)?;
            let target_name = decode_string(
                read_security_buffer(&reader, layout::CHALLENGE_TARGET_NAME_OFFSET)?,
                flags,
            );
            let mut server_challenge = [0u8; layout::SERVER_CHALLENGE_LEN];
            server_challenge.copy_from_slice(reader.read_len(
                layout::CHALLENGE_SERVER_CHALLENGE_OFFSET,
                layout::SERVER_CHALLENGE_LEN,
            )?);
            Ok(NtlmMessage::Challenge {
                flags,
                target_name,
                server_challenge,
            })
        }
        layout::MESSAGE_AUTHENTICATE => {
            // Old clients omit the flags field; their strings are Unicode.
            let flags = reader
                .read_u32_le(layout::AUTH_FLAGS_OFFSET)
                .unwrap_or(layout::FLAG_UNICODE);
            let field = |offset| -> Result<String, DecodeError> {
                Ok(decode_string(read_security_buffer(&reader, offset)?, flags))
            };
            Ok(NtlmMessage::Authenticate {
                flags,
                domain: field(layout::AUTH_DOMAIN_OFFSET)?,
                user: field(layout::AUTH_USER_OFFSET)?,
                workstation: field(layout::AUTH_WORKSTATION_OFFSET)?,
                nt_response_len: read_security_buffer(&reader, layout::AUTH_NT_RESPONSE_OFFSET)?
                    .len(),
            })
        }
        _ => Err(DecodeError::Malformed {
            reason: "unknown NTLM message type",
        }),
    }
}

pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn auth_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    let known = layout::AUTH_SCHEMES
        .iter()
        .any(|known| scheme.eq_ignore_ascii_case(known));
    (known && !token.is_empty()).then_some(token)
}

fn read_security_buffer<'a>(
    reader: &ByteReader<'a>,
    offset: usize,
) -> Result<&'a [u8], DecodeError> {
    let len = reader.read_u16_le(offset)? as usize;
    let data_offset = reader.read_u32_le(offset + 4)? as usize;
    reader.read_len(data_offset, len)
}

fn decode_string(bytes: &[u8], flags: u32) -> String {
    if flags & layout::FLAG_UNICODE != 0 {
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    fn utf16(text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(|unit| unit.to_le_bytes()).collect()
    }

    pub(crate) fn negotiate() -> Vec<u8> {
        let mut msg = layout::SIGNATURE.to_vec();
        msg.extend_from_slice(&layout::MESSAGE_NEGOTIATE.to_le_bytes());
        msg.extend_from_slice(&0x6208_8215u32.to_le_bytes());
        msg
    }

    fn authenticate(domain: &str, user: &str, workstation: &str) -> Vec<u8> {
        let fields = [vec![0u8; 24], vec![0u8; 24], utf16(domain), utf16(user), utf16(workstation)];
        let mut msg = layout::SIGNATURE.to_vec();
        msg.extend_from_slice(&layout::MESSAGE_AUTHENTICATE.to_le_bytes());
        let mut data_offset = 64u32;
        for field in &fields {
            msg.extend_from_slice(&(field.len() as u16).to_le_bytes());
            msg.extend_from_slice(&(field.len() as u16).to_le_bytes());
            msg.extend_from_slice(&data_offset.to_le_bytes());
            data_offset += field.len() as u32;
        }
        // Session key buffer (empty) and flags.
        msg.extend_from_slice(&[0, 0, 0, 0]);
        msg.extend_from_slice(&data_offset.to_le_bytes());
        msg.extend_from_slice(&layout::FLAG_UNICODE.to_le_bytes());
        for field in &fields {
            msg.extend_from_slice(field);
        }
        msg
    }

    fn challenge() -> Vec<u8> {
        let target = utf16("CORP");
        let mut msg = layout::SIGNATURE.to_vec();
        msg.extend_from_slice(&layout::MESSAGE_CHALLENGE.to_le_bytes());
        msg.extend_from_slice(&(target.len() as u16).to_le_bytes());
        msg.extend_from_slice(&(target.len() as u16).to_le_bytes());
        msg.extend_from_slice(&32u32.to_le_bytes());
        msg.extend_from_slice(&layout::FLAG_UNICODE.to_le_bytes());
        msg.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        msg.extend_from_slice(&target);
        msg
    }

    #[test]
    fn raw_authenticate_message() {
        let mut payload = b"\x00\x00\x01\x00smb-ish".to_vec();
        payload.extend(authenticate("CORP", "alice", "WS01"));
        let message = find_ntlm_message(&payload).unwrap().unwrap();
        assert_eq!(
            message,
            NtlmMessage::Authenticate {
                flags: layout::FLAG_UNICODE,
                domain: "CORP".to_string(),
                user: "alice".to_string(),
                workstation: "WS01".to_string(),
                nt_response_len: 24,
            }
        );
    }

    #[test]
    fn challenge_in_www_authenticate_header() {
        let header = format!(
            "HTTP/1.1 401 Unauthorized\r\nWWW-Authenticate: NTLM {}\r\n\r\n",
            STANDARD.encode(challenge())
        );
        match find_ntlm_message(header.as_bytes()).unwrap().unwrap() {
            NtlmMessage::Challenge {
                target_name,
                server_challenge,
                ..
            } => {
                assert_eq!(target_name, "CORP");
                assert_eq!(hex(&server_challenge), "0102030405060708");
            }
            other => panic!("expected challenge, got {other:?}"),
        }
    }

    #[test]
    fn bare_scheme_without_token_is_ignored() {
        let payload = b"HTTP/1.1 401 Unauthorized\r\nWWW-Authenticate: NTLM\r\n\r\n";
        assert!(find_ntlm_message(payload).unwrap().is_none());
    }

    #[test]
    fn invalid_base64_token_is_skipped() {
        let payload = b"GET / HTTP/1.1\r\nAuthorization: NTLM !!!!\r\n\r\n";
        assert!(find_ntlm_message(payload).unwrap().is_none());

        let header = format!(
            "HTTP/1.1 401 Unauthorized\r\nWWW-Authenticate: NTLM !!!!\r\nWWW-Authenticate: NTLM {}\r\n\r\n",
            STANDARD.encode(challenge())
        );
        assert!(matches!(
            find_ntlm_message(header.as_bytes()).unwrap(),
            Some(NtlmMessage::Challenge { .. })
        ));
    }

    #[test]
    fn truncated_message_is_an_error() {
        let message = authenticate("CORP", "alice", "WS01");
        assert!(find_ntlm_message(&message[..30]).is_err());
    }
}
