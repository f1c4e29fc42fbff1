//! Capture inputs.
//!
//! A [`PacketSource`] yields [`CapturedFrame`]s in capture order. Only file
//! replay is provided; live capture devices are out of scope and plug in
//! through the same trait.

mod pcap;

pub use pcap::PcapFileSource;

use thiserror::Error;

use crate::layers::CapturedFrame;

/// Producer of captured frames.
pub trait PacketSource {
    /// Name used as the frames' interface (file name or device).
    fn name(&self) -> &str;

    /// Next frame, or `Ok(None)` at the end of the capture.
    fn next_frame(&mut self) -> Result<Option<CapturedFrame>, SourceError>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PCAP parse error: {0}")]
    Pcap(String),
}

impl From<pcap::error::PcapSourceError> for SourceError {
    fn from(value: pcap::error::PcapSourceError) -> Self {
        match value {
            pcap::error::PcapSourceError::Io(err) => SourceError::Io(err),
            pcap::error::PcapSourceError::Pcap { context, message } => {
                SourceError::Pcap(format!("{context}: {message}"))
            }
        }
    }
}
