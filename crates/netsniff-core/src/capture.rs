//! Capture loop: drives a packet source through the dispatcher.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dispatch::Dispatcher;
use crate::event::{EventSink, ts_to_rfc3339};
use crate::source::{PacketSource, PcapFileSource, SourceError};

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

/// Per-run settings of the capture loop.
#[derive(Debug, Clone, Default)]
pub struct SniffOptions {
    /// Emit generic events for traffic no decoder claims.
    pub verbose: bool,
    /// Overrides the interface name recorded on frames; empty keeps the
    /// source's own name.
    pub interface: String,
}

/// Counters for one capture run.
///
/// # Examples
/// ```
/// use netsniff_core::CaptureSummary;
///
/// let summary = CaptureSummary::default();
/// assert_eq!(summary.frames_total, 0);
/// assert!(summary.time_start.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptureSummary {
    /// Interface or file the frames came from.
    pub source: String,
    pub frames_total: u64,
    /// Frames the dispatcher classified.
    pub frames_matched: u64,
    /// RFC3339 timestamp of the earliest frame (if known).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_start: Option<String>,
    /// RFC3339 timestamp of the latest frame (if known).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_end: Option<String>,
}

/// Replay a capture file through the standard dispatcher.
pub fn sniff_pcap_file(
    path: &Path,
    sink: &dyn EventSink,
    options: &SniffOptions,
) -> Result<CaptureSummary, CaptureError> {
    let source = PcapFileSource::open(path)?;
    sniff_source(source, &Dispatcher::standard(), sink, options)
}

/// Classify every frame of `source` until it is exhausted.
///
/// Per-frame outcomes never stop the loop; only a source error does.
pub fn sniff_source<S: PacketSource>(
    mut source: S,
    dispatcher: &Dispatcher<'_>,
    sink: &dyn EventSink,
    options: &SniffOptions,
) -> Result<CaptureSummary, CaptureError> {
    let name = if options.interface.is_empty() {
        source.name().to_string()
    } else {
        options.interface.clone()
    };
    let mut frames_total = 0u64;
    let mut frames_matched = 0u64;
    let mut first_ts = None;
    let mut last_ts = None;

    while let Some(mut frame) = source.next_frame()? {
        frames_total += 1;
        update_ts_bounds(&mut first_ts, &mut last_ts, frame.timestamp);
        if !options.interface.is_empty() {
            frame.interface.clone_from(&options.interface);
        }
        if dispatcher.classify(&frame, options.verbose, sink) {
            frames_matched += 1;
        }
    }

    log::debug!("{name}: {frames_matched}/{frames_total} frames classified");
    Ok(CaptureSummary {
        source: name,
        frames_total,
        frames_matched,
        time_start: ts_to_rfc3339(first_ts),
        time_end: ts_to_rfc3339(last_ts),
    })
}

fn update_ts_bounds(first: &mut Option<f64>, last: &mut Option<f64>, ts: Option<f64>) {
    let Some(ts) = ts else {
        return;
    };
    if first.is_none_or(|existing| ts < existing) {
        *first = Some(ts);
    }
    if last.is_none_or(|existing| ts > existing) {
        *last = Some(ts);
    }
}
