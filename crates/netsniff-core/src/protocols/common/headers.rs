/// Start line plus `Name: value` headers of an HTTP-style message.
///
/// Only the header section is parsed; anything after the blank line is
/// ignored. Invalid UTF-8 truncates the block at the last valid byte.
#[derive(Debug)]
pub(crate) struct HeaderBlock<'a> {
    pub start_line: &'a str,
    headers: Vec<(&'a str, &'a str)>,
}

impl<'a> HeaderBlock<'a> {
    pub fn parse(payload: &'a [u8]) -> Option<Self> {
        let end = find_subslice(payload, b"\r\n\r\n").unwrap_or(payload.len());
        let head = &payload[..end];
        let text = match std::str::from_utf8(head) {
            Ok(text) => text,
            Err(err) => std::str::from_utf8(&head[..err.valid_up_to()]).ok()?,
        };

        let mut lines = text.split('\n').map(|line| line.trim_end_matches('\r'));
        let start_line = lines.next().filter(|line| !line.is_empty())?;
        let headers = lines
            .take_while(|line| !line.is_empty())
            .filter_map(|line| {
                let (name, value) = line.split_once(':')?;
                Some((name.trim(), value.trim()))
            })
            .collect();

        Some(Self {
            start_line,
            headers,
        })
    }

    /// First value of `name`, compared case-insensitively.
    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.get_all(name).next()
    }

    pub fn get_all<'s>(&'s self, name: &'s str) -> impl Iterator<Item = &'a str> + 's {
        self.headers
            .iter()
            .filter(move |(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| *value)
    }
}

pub(crate) fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_start_line_and_headers() {
        let block =
            HeaderBlock::parse(b"GET / HTTP/1.1\r\nHost: example.com\r\nX-A: 1\r\n\r\nbody: no")
                .unwrap();
        assert_eq!(block.start_line, "GET / HTTP/1.1");
        assert_eq!(block.get("host"), Some("example.com"));
        assert_eq!(block.get("BODY"), None);
    }

    #[test]
    fn tolerates_bare_newlines_and_truncation() {
        let block = HeaderBlock::parse(b"NOTIFY * HTTP/1.1\nNT: upnp:rootdevice\nLOCA").unwrap();
        assert_eq!(block.get("nt"), Some("upnp:rootdevice"));
        assert_eq!(block.get("location"), None);
    }

    #[test]
    fn empty_payload_has_no_block() {
        assert!(HeaderBlock::parse(b"").is_none());
        assert!(HeaderBlock::parse(b"\r\n").is_none());
    }

    #[test]
    fn find_subslice_locates_needle() {
        assert_eq!(find_subslice(b"abcNTLMSSP", b"NTLMSSP"), Some(3));
        assert_eq!(find_subslice(b"abc", b"NTLMSSP"), None);
    }
}
