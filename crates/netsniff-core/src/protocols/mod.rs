//! Application protocol decoders.
//!
//! Each protocol follows a layered structure where it pays off:
//! - `layout`: byte offsets, tags and constants (source of truth)
//! - `parser`: domain-level decoding over bounds-checked readers
//! - `mod`: the [`ProtocolDecoder`](crate::ProtocolDecoder) that turns a parsed
//!   message into a [`SniffEvent`](crate::SniffEvent)
//!
//! Parsers are pure and contain no I/O. Text protocols share the header block
//! reader in `common`.

pub(crate) mod common;
pub mod dns;
pub mod http;
pub mod krb5;
pub mod mdns;
pub mod ntlm;
pub mod tls;
pub mod upnp;
