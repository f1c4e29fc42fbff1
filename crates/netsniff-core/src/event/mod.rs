//! Canonical sniffer events.
//!
//! Every classified frame is described by at most one [`SniffEvent`]. Decoders
//! build their own events; the dispatcher builds the generic transport and
//! network summaries defined here. Events are immutable once pushed to an
//! [`EventSink`].

mod sink;

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub use sink::{ChannelSink, EventSink, MemorySink};

/// Structured event fields, ordered by name for deterministic output.
pub type SniffData = BTreeMap<String, serde_json::Value>;

/// One observed, classified piece of traffic.
///
/// # Examples
/// ```
/// use netsniff_core::SniffEvent;
///
/// let event = SniffEvent::new(Some(1.5), "dns", "10.0.0.1:5000", "10.0.0.53:53")
///     .with_data("Hostname", "example.com")
///     .with_message("{} asks for {}", ["10.0.0.1", "example.com"]);
/// assert_eq!(event.render_message(), "10.0.0.1 asks for example.com");
/// assert_eq!(event.data["Hostname"], "example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SniffEvent {
    /// Capture timestamp in unix seconds, copied from the frame.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    /// Protocol label (e.g. "tcp", "dns", "sni").
    pub protocol: String,
    /// Source endpoint (`ip:port`, `ip` or a MAC address).
    pub source: String,
    /// Destination endpoint.
    pub destination: String,
    /// Structured fields.
    pub data: SniffData,
    /// Message template with `{}` placeholders.
    pub message: String,
    /// Arguments substituted into `message`, in order.
    pub args: Vec<String>,
}

impl SniffEvent {
    pub fn new(
        timestamp: Option<f64>,
        protocol: impl Into<String>,
        source: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            protocol: protocol.into(),
            source: source.into(),
            destination: destination.into(),
            data: SniffData::new(),
            message: String::new(),
            args: Vec::new(),
        }
    }

    pub fn with_data(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    /// Insert `value` only when it is non-empty.
    pub fn with_optional(self, key: &str, value: &str) -> Self {
        if value.is_empty() {
            self
        } else {
            self.with_data(key, value)
        }
    }

    pub fn with_message<I, T>(mut self, template: &str, args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        self.message = template.to_string();
        self.args = args.into_iter().map(|arg| arg.to_string()).collect();
        self
    }

    /// Substitute `args` into the `{}` placeholders of `message`.
    ///
    /// Surplus placeholders render empty; surplus arguments are ignored.
    pub fn render_message(&self) -> String {
        let mut out = String::with_capacity(self.message.len());
        let mut args = self.args.iter();
        let mut rest = self.message.as_str();
        while let Some(pos) = rest.find("{}") {
            out.push_str(&rest[..pos]);
            if let Some(arg) = args.next() {
                out.push_str(arg);
            }
            rest = &rest[pos + 2..];
        }
        out.push_str(rest);
        out
    }

    /// RFC3339 rendering of the capture timestamp, when known.
    pub fn time_rfc3339(&self) -> Option<String> {
        ts_to_rfc3339(self.timestamp)
    }

    /// Hand the event to `sink`.
    pub fn push(self, sink: &dyn EventSink) {
        sink.push(self);
    }
}

/// Build the generic summary for TCP/UDP traffic no decoder claimed.
pub(crate) fn transport_summary(
    timestamp: Option<f64>,
    label: &str,
    src: (Ipv4Addr, u16),
    dst: (Ipv4Addr, u16),
    size: usize,
) -> SniffEvent {
    SniffEvent::new(
        timestamp,
        label,
        format_endpoint(src.0, src.1),
        format_endpoint(dst.0, dst.1),
    )
    .with_data("Size", size)
    .with_message(
        "{} {}:{} > {}:{} {}",
        [
            label.to_string(),
            src.0.to_string(),
            src.1.to_string(),
            dst.0.to_string(),
            dst.1.to_string(),
            format!("{size} bytes"),
        ],
    )
}

/// Build the generic summary for IPv4 traffic over a transport without ports.
pub(crate) fn network_summary(
    timestamp: Option<f64>,
    label: &str,
    src: Ipv4Addr,
    dst: Ipv4Addr,
    size: usize,
) -> SniffEvent {
    SniffEvent::new(timestamp, label, src.to_string(), dst.to_string())
        .with_data("Size", size)
        .with_message(
            "{} {} > {} {}",
            [
                label.to_string(),
                src.to_string(),
                dst.to_string(),
                format!("{size} bytes"),
            ],
        )
}

pub(crate) fn format_endpoint(ip: Ipv4Addr, port: u16) -> String {
    format!("{}:{}", ip, port)
}

pub(crate) fn ts_to_rfc3339(ts: Option<f64>) -> Option<String> {
    let ts = ts?;
    let nanos = (ts * 1_000_000_000.0) as i128;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
}
