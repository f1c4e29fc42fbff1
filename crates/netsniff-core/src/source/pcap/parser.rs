use std::fs::File;
use std::path::Path;

use pcap_parser::{
    Block, LegacyPcapReader, Linktype, PcapBlockOwned, PcapError, PcapNGReader,
    traits::PcapReaderIterator,
};

use crate::layers::CapturedFrame;
use crate::source::{PacketSource, SourceError};

use super::error::PcapSourceError;
use super::layout;
use super::reader::{CaptureFormat, Interface, InterfaceTable, TsResolution};

/// Replays the frames of a pcap or pcapng file.
///
/// # Examples
/// ```no_run
/// use std::path::Path;
///
/// use netsniff_core::{PacketSource, PcapFileSource};
///
/// let mut source = PcapFileSource::open(Path::new("capture.pcapng"))?;
/// while let Some(frame) = source.next_frame()? {
///     println!("{} bytes on {}", frame.data.len(), frame.interface);
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct PcapFileSource {
    name: String,
    reader: FileReader,
}

enum FileReader {
    Legacy(LegacyState),
    Ng(NgState),
}

struct LegacyState {
    reader: LegacyPcapReader<File>,
    linktype: Linktype,
    resolution: TsResolution,
}

struct NgState {
    reader: PcapNGReader<File>,
    interfaces: InterfaceTable,
}

impl PcapFileSource {
    /// Open `path`, detecting pcap or pcapng from its magic.
    ///
    /// # Errors
    /// `SourceError::Io` when the file cannot be opened or is shorter than a
    /// magic number; `SourceError::Pcap` when the reader rejects the header.
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let mut file = File::open(path)?;
        let reader = match CaptureFormat::detect(&mut file)? {
            CaptureFormat::PcapNg => FileReader::Ng(NgState {
                reader: PcapNGReader::new(layout::PCAP_READER_BUFFER_SIZE, file)
                    .map_err(|e| PcapSourceError::parse("pcapng reader init", e))?,
                interfaces: InterfaceTable::default(),
            }),
            CaptureFormat::Legacy => FileReader::Legacy(LegacyState {
                reader: LegacyPcapReader::new(layout::PCAP_READER_BUFFER_SIZE, file)
                    .map_err(|e| PcapSourceError::parse("pcap reader init", e))?,
                linktype: Linktype::ETHERNET,
                resolution: TsResolution::MICROS,
            }),
        };
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        log::debug!("opened {name}");
        Ok(Self { name, reader })
    }
}

impl PacketSource for PcapFileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_frame(&mut self) -> Result<Option<CapturedFrame>, SourceError> {
        let frame = match &mut self.reader {
            FileReader::Legacy(state) => state.next_frame(&self.name)?,
            FileReader::Ng(state) => state.next_frame(&self.name)?,
        };
        Ok(frame)
    }
}

impl LegacyState {
    fn next_frame(&mut self, name: &str) -> Result<Option<CapturedFrame>, PcapSourceError> {
        loop {
            match self.reader.next() {
                Ok((offset, block)) => {
                    let frame = match block {
                        PcapBlockOwned::LegacyHeader(header) => {
                            self.linktype = header.network;
                            if header.is_nanosecond_precision() {
                                self.resolution = TsResolution::NANOS;
                            }
                            None
                        }
                        PcapBlockOwned::Legacy(packet) => {
                            let ts = self.resolution.seconds(packet.ts_sec, packet.ts_usec);
                            Some(
                                CapturedFrame::new(Some(ts), self.linktype, packet.data.to_vec())
                                    .with_interface(name),
                            )
                        }
                        _ => None,
                    };
                    self.reader.consume(offset);
                    if frame.is_some() {
                        return Ok(frame);
                    }
                }
                Err(PcapError::Eof) => return Ok(None),
                Err(PcapError::Incomplete(_)) => {
                    self.reader
                        .refill()
                        .map_err(|e| PcapSourceError::parse("pcap reader refill", e))?;
                }
                Err(e) => return Err(PcapSourceError::parse("pcap reader next", e)),
            }
        }
    }
}

impl NgState {
    fn next_frame(&mut self, name: &str) -> Result<Option<CapturedFrame>, PcapSourceError> {
        loop {
            match self.reader.next() {
                Ok((offset, block)) => {
                    let frame = match block {
                        PcapBlockOwned::NG(Block::SectionHeader(_)) => {
                            self.interfaces.reset();
                            None
                        }
                        PcapBlockOwned::NG(Block::InterfaceDescription(intf)) => {
                            let resolution = match intf.ts_resolution() {
                                Some(units) => TsResolution::from_units(units),
                                None => {
                                    log::debug!("{name}: invalid if_tsresol, assuming microseconds");
                                    TsResolution::default()
                                }
                            };
                            self.interfaces.declare(Interface {
                                linktype: intf.linktype,
                                resolution,
                                offset: intf.ts_offset(),
                            });
                            None
                        }
                        PcapBlockOwned::NG(Block::EnhancedPacket(packet)) => {
                            let ts = self.interfaces.timestamp(
                                packet.if_id,
                                packet.ts_high,
                                packet.ts_low,
                            );
                            Some(
                                CapturedFrame::new(
                                    Some(ts),
                                    self.interfaces.linktype(packet.if_id),
                                    packet.data.to_vec(),
                                )
                                .with_interface(self.interfaces.label(name, packet.if_id)),
                            )
                        }
                        // Simple packets carry no timestamp and belong to interface 0.
                        PcapBlockOwned::NG(Block::SimplePacket(packet)) => Some(
                            CapturedFrame::new(
                                None,
                                self.interfaces.linktype(0),
                                packet.data.to_vec(),
                            )
                            .with_interface(self.interfaces.label(name, 0)),
                        ),
                        _ => None,
                    };
                    self.reader.consume(offset);
                    if frame.is_some() {
                        return Ok(frame);
                    }
                }
                Err(PcapError::Eof) => return Ok(None),
                Err(PcapError::Incomplete(_)) => {
                    self.reader
                        .refill()
                        .map_err(|e| PcapSourceError::parse("pcapng reader refill", e))?;
                }
                Err(e) => return Err(PcapSourceError::parse("pcapng reader next", e)),
            }
        }
    }
}
