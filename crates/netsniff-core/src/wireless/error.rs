use thiserror::Error;

/// Errors raised while decoding radiotap or 802.11 headers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WirelessError {
    #[error("wireless frame too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("unsupported radiotap version {version}")]
    UnsupportedRadiotapVersion { version: u8 },
    #[error("radiotap length {length} exceeds captured {actual} bytes")]
    InvalidRadiotapLength { length: usize, actual: usize },
}
