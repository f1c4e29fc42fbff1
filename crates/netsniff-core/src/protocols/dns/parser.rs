use std::net::{Ipv4Addr, Ipv6Addr};

use super::layout;
use crate::decoder::DecodeError;
use crate::protocols::common::ByteReader;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsQuestion {
    pub name: String,
    pub qtype: u16,
    pub qclass: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    pub name: String,
    pub rtype: u16,
    pub ttl: u32,
    /// Rendered RDATA for the record types we understand.
    pub value: Option<String>,
}

/// Question and answer sections of a DNS (or mDNS) message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsMessage {
    pub id: u16,
    pub response: bool,
    pub opcode: u8,
    pub rcode: u8,
    pub questions: Vec<DnsQuestion>,
    pub answers: Vec<DnsRecord>,
}

/// Parse the header, questions and answers of a DNS message.
///
/// Authority and additional sections are not decoded. Name compression is
/// followed with a bounded number of jumps.
pub fn parse_message(payload: &[u8]) -> Result<DnsMessage, DecodeError> {
    let reader = ByteReader::new(payload);
    reader.require_len(layout::HEADER_LEN)?;
    let id = reader.read_u16_be(layout::ID_OFFSET)?;
    let flags = reader.read_u16_be(layout::FLAGS_OFFSET)?;
    let qdcount = reader.read_u16_be(layout::QDCOUNT_OFFSET)? as usize;
    let ancount = reader.read_u16_be(layout::ANCOUNT_OFFSET)? as usize;

    let mut offset = layout::HEADER_LEN;
    let mut questions = Vec::with_capacity(qdcount.min(layout::MAX_SECTION_RECORDS));
    for _ in 0..qdcount.min(layout::MAX_SECTION_RECORDS) {
        let (name, next) = read_name(&reader, offset)?;
        questions.push(DnsQuestion {
            name,
            qtype: reader.read_u16_be(next)?,
            qclass: reader.read_u16_be(next + 2)? & layout::CLASS_MASK,
        });
        offset = next + 4;
    }

    let mut answers = Vec::with_capacity(ancount.min(layout::MAX_SECTION_RECORDS));
    for _ in 0..ancount.min(layout::MAX_SECTION_RECORDS) {
        let (record, next) = read_record(&reader, offset)?;
        answers.push(record);
        offset = next;
    }

    Ok(DnsMessage {
        id,
        response: flags & layout::FLAG_RESPONSE != 0,
        opcode: ((flags >> layout::OPCODE_SHIFT) & layout::OPCODE_MASK) as u8,
        rcode: (flags & layout::RCODE_MASK) as u8,
        questions,
        answers,
    })
}

/// Read a possibly compressed domain name starting at `start`.
///
/// Returns the dotted name (`.` for the root) and the offset just past the
/// name in the original position.
pub(crate) fn read_name(reader: &ByteReader<'_>, start: usize) -> Result<(String, usize), DecodeError> {
    let mut labels: Vec<String> = Vec::new();
    let mut offset = start;
    let mut resume = None;
    let mut jumps = 0;

    loop {
        let len = reader.read_u8(offset)?;
        if len == 0 {
            offset += 1;
            break;
        }
        if len & layout::POINTER_TAG == layout::POINTER_TAG {
            jumps += 1;
            if jumps > layout::MAX_POINTER_JUMPS {
                return Err(DecodeError::Malformed {
                    reason: "name compression loop",
                });
            }
            let pointer = (reader.read_u16_be(offset)? & layout::POINTER_OFFSET_MASK) as usize;
            if resume.is_none() {
                resume = Some(offset + 2);
            }
            offset = pointer;
            continue;
        }
        if len & layout::POINTER_TAG != 0 {
            return Err(DecodeError::Malformed {
                reason: "reserved label type",
            });
        }
        let label = reader.read_len(offset + 1, len as usize)?;
        labels.push(String::from_utf8_lossy(label).into_owned());
        offset += 1 + len as usize;
    }

    let name = if labels.is_empty() {
        ".".to_string()
    } else {
        labels.join(".")
    };
    Ok((name, resume.unwrap_or(offset)))
}

fn read_record(reader: &ByteReader<'_>, start: usize) -> Result<(DnsRecord, usize), DecodeError> {
    let (name, offset) = read_name(reader, start)?;
    let rtype = reader.read_u16_be(offset)?;
    let ttl = reader.read_u32_be(offset + 4)?;
    let rdlength = reader.read_u16_be(offset + 8)? as usize;
    let rdata_offset = offset + 10;
    let rdata = reader.read_len(rdata_offset, rdlength)?;

    let value = match rtype {
        layout::TYPE_A if rdlength == 4 => {
            Some(Ipv4Addr::new(rdata[0], rdata[1], rdata[2], rdata[3]).to_string())
        }
        layout::TYPE_AAAA if rdlength == 16 => {
            let mut octets = [0u8; 16];
            octets.copy_from_slice(rdata);
            Some(Ipv6Addr::from(octets).to_string())
        }
        layout::TYPE_CNAME | layout::TYPE_NS | layout::TYPE_PTR => {
            Some(read_name(reader, rdata_offset)?.0)
        }
        layout::TYPE_MX => {
            let preference = reader.read_u16_be(rdata_offset)?;
            let (exchange, _) = read_name(reader, rdata_offset + 2)?;
            Some(format!("{preference} {exchange}"))
        }
        layout::TYPE_SRV => {
            let priority = reader.read_u16_be(rdata_offset)?;
            let weight = reader.read_u16_be(rdata_offset + 2)?;
            let port = reader.read_u16_be(rdata_offset + 4)?;
            let (target, _) = read_name(reader, rdata_offset + 6)?;
            Some(format!("{priority} {weight} {port} {target}"))
        }
        layout::TYPE_TXT => Some(read_txt(rdata)),
        _ => None,
    };

    Ok((
        DnsRecord {
            name,
            rtype,
            ttl,
            value,
        },
        rdata_offset + rdlength,
    ))
}

fn read_txt(rdata: &[u8]) -> String {
    let mut strings = Vec::new();
    let mut rest = rdata;
    while let Some((&len, tail)) = rest.split_first() {
        let len = (len as usize).min(tail.len());
        strings.push(String::from_utf8_lossy(&tail[..len]).into_owned());
        rest = &tail[len..];
    }
    strings.join(" ")
}

pub fn type_name(rtype: u16) -> String {
    let name = match rtype {
        layout::TYPE_A => "A",
        layout::TYPE_NS => "NS",
        layout::TYPE_CNAME => "CNAME",
        layout::TYPE_SOA => "SOA",
        layout::TYPE_PTR => "PTR",
        layout::TYPE_MX => "MX",
        layout::TYPE_TXT => "TXT",
        layout::TYPE_AAAA => "AAAA",
        layout::TYPE_SRV => "SRV",
        layout::TYPE_ANY => "ANY",
        other => return format!("TYPE{other}"),
    };
    name.to_string()
}

pub fn opcode_name(opcode: u8) -> &'static str {
    match opcode {
        0 => "QUERY",
        1 => "IQUERY",
        2 => "STATUS",
        4 => "NOTIFY",
        5 => "UPDATE",
        _ => "UNKNOWN",
    }
}

pub fn class_name(class: u16) -> String {
    let name = match class {
        layout::CLASS_IN => "IN",
        layout::CLASS_CH => "CH",
        layout::CLASS_HS => "HS",
        layout::CLASS_ANY => "ANY",
        other => return format!("CLASS{other}"),
    };
    name.to_string()
}

/// Lowest TTL among the answers.
pub fn min_ttl(message: &DnsMessage) -> Option<u32> {
    message.answers.iter().map(|answer| answer.ttl).min()
}

pub fn rcode_name(rcode: u8) -> &'static str {
    match rcode {
        0 => "NOERROR",
        1 => "FORMERR",
        2 => "SERVFAIL",
        3 => "NXDOMAIN",
        4 => "NOTIMP",
        5 => "REFUSED",
        _ => "UNKNOWN",
    }
}
