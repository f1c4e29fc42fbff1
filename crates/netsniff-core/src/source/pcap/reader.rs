use std::io::{Read, Seek, SeekFrom};

use pcap_parser::Linktype;

use super::error::PcapSourceError;
use super::layout;

/// Container format of a capture file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureFormat {
    Legacy,
    PcapNg,
}

impl CaptureFormat {
    /// Peek at the first four bytes and rewind.
    ///
    /// Anything that is not a pcapng section header is handed to the legacy
    /// reader, which rejects unknown magics itself.
    ///
    /// # Errors
    /// `PcapSourceError::Io` when fewer than four bytes can be read or the
    /// reader cannot be rewound.
    pub fn detect<R: Read + Seek>(reader: &mut R) -> Result<Self, PcapSourceError> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        reader.seek(SeekFrom::Start(0))?;
        if magic == layout::PCAPNG_MAGIC {
            Ok(CaptureFormat::PcapNg)
        } else {
            Ok(CaptureFormat::Legacy)
        }
    }
}

/// Resolution of the fractional part of a timestamp, in units per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TsResolution {
    units_per_second: f64,
}

impl TsResolution {
    pub const MICROS: Self = Self {
        units_per_second: layout::MICROS_PER_SECOND,
    };
    pub const NANOS: Self = Self {
        units_per_second: layout::NANOS_PER_SECOND,
    };

    /// Resolution declared by a pcapng `if_tsresol` option.
    pub fn from_units(units_per_second: u64) -> Self {
        Self {
            units_per_second: units_per_second as f64,
        }
    }

    /// Combine whole seconds and a fraction into unix seconds.
    ///
    /// ```text
    /// TsResolution::MICROS.seconds(1, 500_000) == 1.5
    /// TsResolution::NANOS.seconds(1, 500_000_000) == 1.5
    /// ```
    pub fn seconds(self, whole: u32, frac: u32) -> f64 {
        whole as f64 + frac as f64 / self.units_per_second
    }

    /// pcapng splits a 64-bit tick count into high and low words.
    pub fn ticks_to_seconds(self, ts_high: u32, ts_low: u32) -> f64 {
        let ticks = ((ts_high as u64) << 32) | (ts_low as u64);
        ticks as f64 / self.units_per_second
    }
}

impl Default for TsResolution {
    fn default() -> Self {
        Self::MICROS
    }
}

/// One interface description of a pcapng section.
#[derive(Debug, Clone, Copy)]
pub struct Interface {
    pub linktype: Linktype,
    pub resolution: TsResolution,
    /// Seconds added to every timestamp (`if_tsoffset`).
    pub offset: i64,
}

impl Interface {
    pub fn new(linktype: Linktype) -> Self {
        Self {
            linktype,
            resolution: TsResolution::default(),
            offset: 0,
        }
    }
}

/// Interfaces declared in the current pcapng section.
#[derive(Debug, Default)]
pub struct InterfaceTable {
    interfaces: Vec<Interface>,
}

impl InterfaceTable {
    /// A new section restarts interface numbering.
    pub fn reset(&mut self) {
        self.interfaces.clear();
    }

    pub fn declare(&mut self, interface: Interface) {
        self.interfaces.push(interface);
    }

    /// Link type of `if_id`; undeclared interfaces are read as Ethernet.
    pub fn linktype(&self, if_id: u32) -> Linktype {
        self.interfaces
            .get(if_id as usize)
            .map_or(Linktype::ETHERNET, |interface| interface.linktype)
    }

    /// Unix seconds of an enhanced packet captured on `if_id`.
    pub fn timestamp(&self, if_id: u32, ts_high: u32, ts_low: u32) -> f64 {
        let (resolution, offset) = self
            .interfaces
            .get(if_id as usize)
            .map_or((TsResolution::default(), 0), |interface| {
                (interface.resolution, interface.offset)
            });
        offset as f64 + resolution.ticks_to_seconds(ts_high, ts_low)
    }

    /// Interface name recorded on frames: the file name, suffixed with
    /// `#<id>` once the section declares more than one interface.
    pub fn label(&self, file_name: &str, if_id: u32) -> String {
        if self.interfaces.len() > 1 {
            format!("{file_name}#{if_id}")
        } else {
            file_name.to_string()
        }
    }
}
