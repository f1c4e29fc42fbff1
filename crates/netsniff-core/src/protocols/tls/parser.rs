use super::layout;
use crate::decoder::DecodeError;
use crate::protocols::common::ByteReader;

/// Fields of interest from a ClientHello.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientHello {
    /// Negotiated-at-most version; TLS 1.3 when advertised via
    /// `supported_versions`.
    pub version: u16,
    pub server_name: Option<String>,
}

/// Parse a TLS record carrying a ClientHello.
///
/// Returns `Ok(None)` when the payload is not a TLS handshake record or the
/// handshake is not a ClientHello.
pub fn parse_client_hello(payload: &[u8]) -> Result<Option<ClientHello>, DecodeError> {
    let reader = ByteReader::new(payload);
    if reader.len() <= layout::HANDSHAKE_TYPE_OFFSET {
        return Ok(None);
    }
    if reader.read_u8(0)? != layout::CONTENT_TYPE_HANDSHAKE
        || reader.read_u8(layout::RECORD_VERSION_OFFSET)? != layout::TLS_MAJOR_VERSION
        || reader.read_u8(layout::HANDSHAKE_TYPE_OFFSET)? != layout::HANDSHAKE_CLIENT_HELLO
    {
        return Ok(None);
    }

    let record_len = reader.read_u16_be(layout::RECORD_LENGTH_OFFSET)? as usize;
    let handshake_len = reader.read_u24_be(layout::HANDSHAKE_LENGTH_OFFSET)? as usize;
    if handshake_len + 4 > record_len {
        return Err(DecodeError::InvalidLength {
            field: "handshake",
            length: handshake_len,
        });
    }

    // The record may continue in a later segment; parse what was captured.
    let end = (layout::CLIENT_HELLO_OFFSET + handshake_len).min(reader.len());
    let hello = ByteReader::new(reader.read_slice(0..end)?);

    let mut offset = layout::CLIENT_HELLO_OFFSET;
    let mut version = hello.read_u16_be(offset)?;
    offset += 2 + layout::RANDOM_LEN;
    let session_id_len = hello.read_u8(offset)? as usize;
    offset += 1 + session_id_len;
    let cipher_suites_len = hello.read_u16_be(offset)? as usize;
    offset += 2 + cipher_suites_len;
    let compression_len = hello.read_u8(offset)? as usize;
    offset += 1 + compression_len;

    hello.require_len(offset)?;
    if offset == hello.len() {
        return Ok(Some(ClientHello {
            version,
            server_name: None,
        }));
    }

    let extensions_len = hello.read_u16_be(offset)? as usize;
    offset += 2;
    let extensions_end = (offset + extensions_len).min(hello.len());

    let mut server_name = None;
    while offset + 4 <= extensions_end {
        let ext_type = hello.read_u16_be(offset)?;
        let ext_len = hello.read_u16_be(offset + 2)? as usize;
        offset += 4;
        let Ok(data) = hello.read_len(offset, ext_len) else {
            break;
        };
        match ext_type {
            layout::EXTENSION_SERVER_NAME => server_name = parse_server_name(data)?,
            layout::EXTENSION_SUPPORTED_VERSIONS if advertises_tls13(data) => {
                version = layout::VERSION_TLS13;
            }
            _ => {}
        }
        offset += ext_len;
    }

    Ok(Some(ClientHello {
        version,
        server_name,
    }))
}

fn parse_server_name(data: &[u8]) -> Result<Option<String>, DecodeError> {
    let reader = ByteReader::new(data);
    let list_len = reader.read_u16_be(0)? as usize;
    let list = ByteReader::new(reader.read_len(2, list_len)?);

    let mut offset = 0;
    while offset + 3 <= list.len() {
        let name_type = list.read_u8(offset)?;
        let name_len = list.read_u16_be(offset + 1)? as usize;
        let name = list.read_len(offset + 3, name_len)?;
        if name_type == layout::SERVER_NAME_TYPE_HOST {
            let host = std::str::from_utf8(name).map_err(|_| DecodeError::Malformed {
                reason: "server name is not UTF-8",
            })?;
            return Ok((!host.is_empty()).then(|| host.to_string()));
        }
        offset += 3 + name_len;
    }
    Ok(None)
}

fn advertises_tls13(data: &[u8]) -> bool {
    let Some((&len, versions)) = data.split_first() else {
        return false;
    };
    versions[..(len as usize).min(versions.len())]
        .chunks_exact(2)
        .any(|pair| u16::from_be_bytes([pair[0], pair[1]]) == layout::VERSION_TLS13)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extension(ext_type: u16, data: &[u8]) -> Vec<u8> {
        let mut out = ext_type.to_be_bytes().to_vec();
        out.extend_from_slice(&(data.len() as u16).to_be_bytes());
        out.extend_from_slice(data);
        out
    }

    fn sni_extension(host: &str) -> Vec<u8> {
        let name = host.as_bytes();
        let mut data = ((name.len() + 3) as u16).to_be_bytes().to_vec();
        data.push(layout::SERVER_NAME_TYPE_HOST);
        data.extend_from_slice(&(name.len() as u16).to_be_bytes());
        data.extend_from_slice(name);
        extension(layout::EXTENSION_SERVER_NAME, &data)
    }

    fn client_hello(extensions: &[u8]) -> Vec<u8> {
        let mut body = vec![0x03, 0x03];
        body.extend_from_slice(&[0u8; 32]);
        body.push(0);
        body.extend_from_slice(&[0x00, 0x02, 0x13, 0x01]);
        body.extend_from_slice(&[0x01, 0x00]);
        if !extensions.is_empty() {
            body.extend_from_slice(&(extensions.len() as u16).to_be_bytes());
            body.extend_from_slice(extensions);
        }
        let mut handshake = vec![layout::HANDSHAKE_CLIENT_HELLO];
        handshake.extend_from_slice(&(body.len() as u32).to_be_bytes()[1..]);
        handshake.extend_from_slice(&body);
        let mut record = vec![layout::CONTENT_TYPE_HANDSHAKE, 0x03, 0x01];
        record.extend_from_slice(&(handshake.len() as u16).to_be_bytes());
        record.extend_from_slice(&handshake);
        record
    }

    #[test]
    fn extracts_server_name() {
        let hello = parse_client_hello(&client_hello(&sni_extension("example.com")))
            .unwrap()
            .unwrap();
        assert_eq!(hello.server_name.as_deref(), Some("example.com"));
        assert_eq!(hello.version, 0x0303);
    }

    #[test]
    fn supported_versions_upgrades_to_tls13() {
        let mut extensions = extension(layout::EXTENSION_SUPPORTED_VERSIONS, &[4, 0x03, 0x04, 0x03, 0x03]);
        extensions.extend(sni_extension("a.test"));
        let hello = parse_client_hello(&client_hello(&extensions)).unwrap().unwrap();
        assert_eq!(hello.version, layout::VERSION_TLS13);
        assert_eq!(hello.server_name.as_deref(), Some("a.test"));
    }

    #[test]
    fn hello_without_extensions_has_no_name() {
        let hello = parse_client_hello(&client_hello(&[])).unwrap().unwrap();
        assert!(hello.server_name.is_none());
    }

    #[test]
    fn non_handshake_is_not_tls() {
        assert!(parse_client_hello(b"GET / HTTP/1.1\r\n\r\n").unwrap().is_none());
        assert!(parse_client_hello(&[22, 3]).unwrap().is_none());
    }

    #[test]
    fn truncated_hello_is_an_error() {
        let record = client_hello(&sni_extension("example.com"));
        assert!(parse_client_hello(&record[..20]).is_err());
    }

    #[test]
    fn inconsistent_lengths_are_rejected() {
        let mut record = client_hello(&sni_extension("example.com"));
        record[3] = 0;
        record[4] = 4;
        assert!(matches!(
            parse_client_hello(&record),
            Err(DecodeError::InvalidLength { .. })
        ));
    }
}
