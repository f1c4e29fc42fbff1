use thiserror::Error;

/// Failures while replaying a capture file.
#[derive(Debug, Error)]
pub enum PcapSourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PCAP parse error ({context}): {message}")]
    Pcap {
        /// Reader operation that failed.
        context: &'static str,
        message: String,
    },
}

impl PcapSourceError {
    pub(crate) fn parse(context: &'static str, err: impl std::fmt::Display) -> Self {
        PcapSourceError::Pcap {
            context,
            message: err.to_string(),
        }
    }
}
