use thiserror::Error;

use super::NetworkKind;

/// Per-frame extraction outcomes that end processing without an event.
///
/// None of these are failures of the pipeline; they are logged at debug
/// level and the frame is dropped.
///
/// # Examples
/// ```
/// use netsniff_core::{LayerError, NetworkKind};
///
/// let err = LayerError::UnsupportedNetworkLayer { kind: NetworkKind::Ipv6 };
/// assert!(err.to_string().contains("ipv6"));
/// ```
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayerError {
    #[error("unsupported network layer: {kind}")]
    UnsupportedNetworkLayer { kind: NetworkKind },
    #[error("missing transport layer")]
    MissingTransportLayer,
    #[error("frame is neither wired IPv4 nor 802.11")]
    UnclassifiableFrame,
}
