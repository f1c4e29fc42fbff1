use super::layout;
use crate::decoder::DecodeError;

/// One DER tag-length-value with a single-byte tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tlv<'a> {
    pub tag: u8,
    pub value: &'a [u8],
}

/// Read one TLV from the front of `data`, returning it and the remainder.
pub fn read_tlv(data: &[u8]) -> Result<(Tlv<'_>, &[u8]), DecodeError> {
    let too_short = |needed| DecodeError::TooShort {
        needed,
        actual: data.len(),
    };
    let (&tag, rest) = data.split_first().ok_or(too_short(1))?;
    let (&first, rest) = rest.split_first().ok_or(too_short(2))?;

    let (len, rest) = if first & layout::LENGTH_LONG_FORM == 0 {
        (first as usize, rest)
    } else {
        let octets = (first & !layout::LENGTH_LONG_FORM) as usize;
        if octets == 0 || octets > layout::MAX_LENGTH_OCTETS {
            return Err(DecodeError::Malformed {
                reason: "unsupported DER length form",
            });
        }
        let bytes = rest.get(..octets).ok_or(too_short(2 + octets))?;
        let len = bytes.iter().fold(0usize, |acc, &b| (acc << 8) | b as usize);
        (len, &rest[octets..])
    };

    if rest.len() < len {
        return Err(DecodeError::InvalidLength {
            field: "der value",
            length: len,
        });
    }
    Ok((
        Tlv {
            tag,
            value: &rest[..len],
        },
        &rest[len..],
    ))
}

/// Read a TLV and require its tag.
pub fn read_expected(data: &[u8], tag: u8) -> Result<Tlv<'_>, DecodeError> {
    let (tlv, _) = read_tlv(data)?;
    if tlv.tag != tag {
        return Err(DecodeError::Malformed {
            reason: "unexpected DER tag",
        });
    }
    Ok(tlv)
}

/// All TLVs contained in a constructed value.
pub fn children(mut data: &[u8]) -> Result<Vec<Tlv<'_>>, DecodeError> {
    let mut out = Vec::new();
    while !data.is_empty() {
        let (tlv, rest) = read_tlv(data)?;
        out.push(tlv);
        data = rest;
    }
    Ok(out)
}

/// Inner TLV of the explicitly tagged field `[n]`, when present.
pub fn explicit<'a>(fields: &[Tlv<'a>], n: u8) -> Result<Option<Tlv<'a>>, DecodeError> {
    fields
        .iter()
        .find(|field| field.tag == layout::CONTEXT_BASE + n)
        .map(|field| read_tlv(field.value).map(|(inner, _)| inner))
        .transpose()
}

/// Children of the SEQUENCE wrapped in `[n]`, when present.
pub fn explicit_sequence<'a>(
    fields: &[Tlv<'a>],
    n: u8,
) -> Result<Option<Vec<Tlv<'a>>>, DecodeError> {
    match explicit(fields, n)? {
        Some(tlv) if tlv.tag == layout::TAG_SEQUENCE => children(tlv.value).map(Some),
        Some(_) => Err(DecodeError::Malformed {
            reason: "expected DER sequence",
        }),
        None => Ok(None),
    }
}

pub fn integer(tlv: &Tlv<'_>) -> Result<i64, DecodeError> {
    if tlv.tag != layout::TAG_INTEGER || tlv.value.is_empty() {
        return Err(DecodeError::Malformed {
            reason: "expected DER integer",
        });
    }
    if tlv.value.len() > layout::MAX_INTEGER_LEN {
        return Err(DecodeError::InvalidLength {
            field: "integer",
            length: tlv.value.len(),
        });
    }
    let sign = if tlv.value[0] & 0x80 != 0 { -1i64 } else { 0 };
    Ok(tlv
        .value
        .iter()
        .fold(sign, |acc, &b| (acc << 8) | b as i64))
}

pub fn string(tlv: &Tlv<'_>) -> String {
    String::from_utf8_lossy(tlv.value).into_owned()
}
