pub const HEADER_LEN: usize = 12;
pub const ID_OFFSET: usize = 0;
pub const FLAGS_OFFSET: usize = 2;
pub const QDCOUNT_OFFSET: usize = 4;
pub const ANCOUNT_OFFSET: usize = 6;

pub const FLAG_RESPONSE: u16 = 0x8000;
pub const OPCODE_SHIFT: u16 = 11;
pub const OPCODE_MASK: u16 = 0x0f;
pub const RCODE_MASK: u16 = 0x000f;

/// Top two bits of a label length byte mark a compression pointer.
pub const POINTER_TAG: u8 = 0xc0;
pub const POINTER_OFFSET_MASK: u16 = 0x3fff;
pub const MAX_LABEL_LEN: usize = 63;
pub const MAX_POINTER_JUMPS: usize = 32;
/// Records beyond this per section are not decoded.
pub const MAX_SECTION_RECORDS: usize = 64;

/// mDNS reuses the top class bit as unicast-response / cache-flush.
pub const CLASS_MASK: u16 = 0x7fff;
pub const CLASS_IN: u16 = 1;
pub const CLASS_CH: u16 = 3;
pub const CLASS_HS: u16 = 4;
pub const CLASS_ANY: u16 = 255;

pub const OPCODE_QUERY: u8 = 0;

pub const TYPE_A: u16 = 1;
pub const TYPE_NS: u16 = 2;
pub const TYPE_CNAME: u16 = 5;
pub const TYPE_SOA: u16 = 6;
pub const TYPE_PTR: u16 = 12;
pub const TYPE_MX: u16 = 15;
pub const TYPE_TXT: u16 = 16;
pub const TYPE_AAAA: u16 = 28;
pub const TYPE_SRV: u16 = 33;
pub const TYPE_ANY: u16 = 255;
