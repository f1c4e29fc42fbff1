pub const KERBEROS_PORT: u16 = 88;

pub const TAG_AS_REQ: u8 = 0x6a;
pub const TAG_AS_REP: u8 = 0x6b;
pub const TAG_TGS_REQ: u8 = 0x6c;
pub const TAG_TGS_REP: u8 = 0x6d;
pub const TAG_KRB_ERROR: u8 = 0x7e;
pub const TAG_TICKET: u8 = 0x61;

pub const TAG_INTEGER: u8 = 0x02;
pub const TAG_OCTET_STRING: u8 = 0x04;
pub const TAG_GENERAL_STRING: u8 = 0x1b;
pub const TAG_SEQUENCE: u8 = 0x30;
/// Constructed context-specific tag `[0]`; `[n]` is `CONTEXT_BASE + n`.
pub const CONTEXT_BASE: u8 = 0xa0;

pub const LENGTH_LONG_FORM: u8 = 0x80;
pub const MAX_LENGTH_OCTETS: usize = 4;
pub const MAX_INTEGER_LEN: usize = 8;

// KDC-REQ fields.
pub const REQ_PADATA: u8 = 3;
pub const REQ_BODY: u8 = 4;
pub const REQ_BODY_CNAME: u8 = 1;
pub const REQ_BODY_REALM: u8 = 2;
pub const REQ_BODY_SNAME: u8 = 3;

// KDC-REP fields.
pub const REP_CREALM: u8 = 3;
pub const REP_CNAME: u8 = 4;
pub const REP_TICKET: u8 = 5;
pub const TICKET_SNAME: u8 = 2;

// KRB-ERROR fields.
pub const ERROR_CODE: u8 = 6;
pub const ERROR_CNAME: u8 = 8;
pub const ERROR_REALM: u8 = 9;
pub const ERROR_SNAME: u8 = 10;

pub const PRINCIPAL_NAME_STRING: u8 = 1;
pub const PADATA_TYPE: u8 = 1;
pub const PADATA_VALUE: u8 = 2;
pub const PA_ENC_TIMESTAMP: i64 = 2;
pub const ENCRYPTED_DATA_ETYPE: u8 = 0;
pub const ENCRYPTED_DATA_CIPHER: u8 = 2;
