pub const SIGNATURE: &[u8; 8] = b"NTLMSSP\0";
pub const MESSAGE_TYPE_OFFSET: usize = 8;

pub const MESSAGE_NEGOTIATE: u32 = 1;
pub const MESSAGE_CHALLENGE: u32 = 2;
pub const MESSAGE_AUTHENTICATE: u32 = 3;

pub const NEGOTIATE_FLAGS_OFFSET: usize = 12;

pub const CHALLENGE_TARGET_NAME_OFFSET: usize = 12;
pub const CHALLENGE_FLAGS_OFFSET: usize = 20;
pub const CHALLENGE_SERVER_CHALLENGE_OFFSET: usize = 24;
pub const SERVER_CHALLENGE_LEN: usize = 8;

pub const AUTH_NT_RESPONSE_OFFSET: usize = 20;
pub const AUTH_DOMAIN_OFFSET: usize = 28;
pub const AUTH_USER_OFFSET: usize = 36;
pub const AUTH_WORKSTATION_OFFSET: usize = 44;
pub const AUTH_FLAGS_OFFSET: usize = 60;

/// NTLMSSP_NEGOTIATE_UNICODE.
pub const FLAG_UNICODE: u32 = 0x0000_0001;

pub const AUTH_HEADERS: [&str; 4] = [
    "authorization",
    "www-authenticate",
    "proxy-authorization",
    "proxy-authenticate",
];
pub const AUTH_SCHEMES: [&str; 2] = ["NTLM", "Negotiate"];
