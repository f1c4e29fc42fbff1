//! Radiotap capture header.
//!
//! Only the leading fields up to the dBm antenna signal are decoded; later
//! fields are never needed and are skipped along with the header.

use super::error::WirelessError;

/// Bits of the `it_present` bitmap.
pub mod present {
    pub const TSFT: u32 = 1 << 0;
    pub const FLAGS: u32 = 1 << 1;
    pub const RATE: u32 = 1 << 2;
    pub const CHANNEL: u32 = 1 << 3;
    pub const FHSS: u32 = 1 << 4;
    pub const DBM_ANTSIGNAL: u32 = 1 << 5;
    pub const EXT: u32 = 1 << 31;
}

/// Bits of the radiotap `flags` field.
pub mod flags {
    /// The 802.11 frame ends with a 4-byte FCS.
    pub const FCS_AT_END: u8 = 0x10;
}

const FIXED_LEN: usize = 8;
const PRESENT_WORD_LEN: usize = 4;
pub const FCS_LEN: usize = 4;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RadiotapHeader {
    pub length: usize,
    pub present: u32,
    pub tsft: Option<u64>,
    pub flags: Option<u8>,
    /// Data rate in 500 kbps units.
    pub rate: Option<u8>,
    pub channel_frequency: Option<u16>,
    pub channel_flags: Option<u16>,
    pub antenna_signal: Option<i8>,
}

impl RadiotapHeader {
    /// Parse the header at the front of `data`.
    ///
    /// Returns the header and the 802.11 frame that follows it, with a
    /// trailing FCS removed when the flags announce one.
    pub fn parse(data: &[u8]) -> Result<(Self, &[u8]), WirelessError> {
        if data.len() < FIXED_LEN {
            return Err(WirelessError::TooShort {
                needed: FIXED_LEN,
                actual: data.len(),
            });
        }
        if data[0] != 0 {
            return Err(WirelessError::UnsupportedRadiotapVersion { version: data[0] });
        }
        let length = u16::from_le_bytes([data[2], data[3]]) as usize;
        if length < FIXED_LEN || length > data.len() {
            return Err(WirelessError::InvalidRadiotapLength {
                length,
                actual: data.len(),
            });
        }
        let header_bytes = &data[..length];
        let present = read_u32(header_bytes, 4)?;

        // Skip extended bitmaps.
        let mut offset = FIXED_LEN;
        let mut word = present;
        while word & present::EXT != 0 {
            word = read_u32(header_bytes, offset)?;
            offset += PRESENT_WORD_LEN;
        }

        let mut header = Self {
            length,
            present,
            ..Self::default()
        };
        let mut fields = FieldCursor {
            data: header_bytes,
            offset,
        };
        if present & present::TSFT != 0 {
            header.tsft = Some(u64::from_le_bytes(fields.take::<8>(8)?));
        }
        if present & present::FLAGS != 0 {
            header.flags = Some(fields.take::<1>(1)?[0]);
        }
        if present & present::RATE != 0 {
            header.rate = Some(fields.take::<1>(1)?[0]);
        }
        if present & present::CHANNEL != 0 {
            let channel = fields.take::<4>(2)?;
            header.channel_frequency = Some(u16::from_le_bytes([channel[0], channel[1]]));
            header.channel_flags = Some(u16::from_le_bytes([channel[2], channel[3]]));
        }
        if present & present::FHSS != 0 {
            fields.take::<2>(1)?;
        }
        if present & present::DBM_ANTSIGNAL != 0 {
            header.antenna_signal = Some(fields.take::<1>(1)?[0] as i8);
        }

        let mut frame = &data[length..];
        if header.has_fcs() && frame.len() >= FCS_LEN {
            frame = &frame[..frame.len() - FCS_LEN];
        }
        Ok((header, frame))
    }

    pub fn has_fcs(&self) -> bool {
        self.flags.is_some_and(|bits| bits & flags::FCS_AT_END != 0)
    }

    /// Channel number derived from the channel frequency.
    pub fn channel(&self) -> Option<u16> {
        self.channel_frequency.and_then(frequency_to_channel)
    }
}

pub fn frequency_to_channel(frequency: u16) -> Option<u16> {
    match frequency {
        2484 => Some(14),
        2412..=2472 => Some((frequency - 2407) / 5),
        5000..=5895 => Some((frequency - 5000) / 5),
        _ => None,
    }
}

fn read_u32(data: &[u8], offset: usize) -> Result<u32, WirelessError> {
    data.get(offset..offset + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(WirelessError::TooShort {
            needed: offset + 4,
            actual: data.len(),
        })
}

/// Walks radiotap fields honouring their natural alignment.
struct FieldCursor<'a> {
    data: &'a [u8],
    offset: usize,
}

impl FieldCursor<'_> {
    fn take<const N: usize>(&mut self, align: usize) -> Result<[u8; N], WirelessError> {
        let start = self.offset.next_multiple_of(align);
        let bytes = self
            .data
            .get(start..start + N)
            .ok_or(WirelessError::TooShort {
                needed: start + N,
                actual: self.data.len(),
            })?;
        self.offset = start + N;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }
}
