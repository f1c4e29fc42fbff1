//! PCAP/PCAPNG file replay.
//!
//! Legacy pcap files carry one link type in their header (microsecond or
//! nanosecond timestamps); pcapng files carry one link type per interface
//! description block.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use parser::PcapFileSource;
