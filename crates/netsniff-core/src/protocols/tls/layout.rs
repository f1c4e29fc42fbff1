pub const CONTENT_TYPE_HANDSHAKE: u8 = 22;
pub const TLS_MAJOR_VERSION: u8 = 3;

pub const RECORD_HEADER_LEN: usize = 5;
pub const RECORD_VERSION_OFFSET: usize = 1;
pub const RECORD_LENGTH_OFFSET: usize = 3;

pub const HANDSHAKE_TYPE_OFFSET: usize = 5;
pub const HANDSHAKE_LENGTH_OFFSET: usize = 6;
pub const HANDSHAKE_CLIENT_HELLO: u8 = 1;

pub const CLIENT_HELLO_OFFSET: usize = 9;
pub const RANDOM_LEN: usize = 32;

pub const EXTENSION_SERVER_NAME: u16 = 0x0000;
pub const EXTENSION_SUPPORTED_VERSIONS: u16 = 0x002b;
pub const SERVER_NAME_TYPE_HOST: u8 = 0;

pub const VERSION_TLS13: u16 = 0x0304;
