use thiserror::Error;

/// Errors raised while decoding an application payload.
///
/// They never leave a decoder: [`ProtocolDecoder::try_handle`] logs them and
/// declines the segment.
///
/// [`ProtocolDecoder::try_handle`]: crate::ProtocolDecoder::try_handle
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("payload too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("invalid {field} length: {length}")]
    InvalidLength { field: &'static str, length: usize },
    #[error("malformed payload: {reason}")]
    Malformed { reason: &'static str },
}
