//! IEEE 802.11 MAC header and management frame bodies.

use std::fmt;

use super::error::WirelessError;

const ADDR1_OFFSET: usize = 4;
const ADDR2_OFFSET: usize = 10;
const ADDR3_OFFSET: usize = 16;
const SEQUENCE_OFFSET: usize = 22;
const MIN_HEADER_LEN: usize = 10;
const THREE_ADDRESS_HEADER_LEN: usize = 24;
const ADDR4_LEN: usize = 6;
const QOS_CONTROL_LEN: usize = 2;
const HT_CONTROL_LEN: usize = 4;

const FLAG_TO_DS: u8 = 0x01;
const FLAG_FROM_DS: u8 = 0x02;
const FLAG_PROTECTED: u8 = 0x40;
const FLAG_ORDER: u8 = 0x80;

/// Management frame subtypes.
pub mod subtype {
    pub const ASSOC_REQUEST: u8 = 0;
    pub const ASSOC_RESPONSE: u8 = 1;
    pub const PROBE_REQUEST: u8 = 4;
    pub const PROBE_RESPONSE: u8 = 5;
    pub const BEACON: u8 = 8;
    pub const DISASSOCIATION: u8 = 10;
    pub const AUTHENTICATION: u8 = 11;
    pub const DEAUTHENTICATION: u8 = 12;
}

/// Information element ids.
pub mod element {
    pub const SSID: u8 = 0;
    pub const DS_PARAMETER_SET: u8 = 3;
}

/// Timestamp, beacon interval and capability info of beacons and probe
/// responses.
pub const BEACON_FIXED_LEN: usize = 12;
pub const CAPABILITY_PRIVACY: u16 = 0x0010;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    Management,
    Control,
    Data,
    Extension,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    pub const BROADCAST: MacAddr = MacAddr([0xff; 6]);
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl fmt::Debug for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Decoded 802.11 MAC header plus the frame body it borrows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dot11Frame<'a> {
    pub frame_type: FrameType,
    pub subtype: u8,
    pub flags: u8,
    /// Receiver address.
    pub addr1: MacAddr,
    /// Transmitter address (absent in CTS and ACK).
    pub addr2: Option<MacAddr>,
    /// BSSID for management frames.
    pub addr3: Option<MacAddr>,
    pub sequence: Option<u16>,
    pub body: &'a [u8],
}

impl<'a> Dot11Frame<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self, WirelessError> {
        require(data, MIN_HEADER_LEN)?;
        let frame_control = u16::from_le_bytes([data[0], data[1]]);
        let subtype = ((frame_control >> 4) & 0x0f) as u8;
        let flags = data[1];
        let frame_type = match (frame_control >> 2) & 0x03 {
            0 => FrameType::Management,
            1 => FrameType::Control,
            2 => FrameType::Data,
            _ => FrameType::Extension,
        };
        let addr1 = mac_at(data, ADDR1_OFFSET)?;

        if frame_type == FrameType::Control {
            // RTS, PS-Poll, CF-End and block ack carry a transmitter address.
            let header_len = if matches!(subtype, 8..=11 | 14 | 15) {
                ADDR2_OFFSET + 6
            } else {
                MIN_HEADER_LEN
            };
            require(data, header_len)?;
            return Ok(Self {
                frame_type,
                subtype,
                flags,
                addr1,
                addr2: (header_len > MIN_HEADER_LEN)
                    .then(|| mac_at(data, ADDR2_OFFSET))
                    .transpose()?,
                addr3: None,
                sequence: None,
                body: &data[header_len..],
            });
        }

        let mut header_len = THREE_ADDRESS_HEADER_LEN;
        if frame_type == FrameType::Data {
            if flags & (FLAG_TO_DS | FLAG_FROM_DS) == FLAG_TO_DS | FLAG_FROM_DS {
                header_len += ADDR4_LEN;
            }
            if subtype & 0x08 != 0 {
                header_len += QOS_CONTROL_LEN;
                if flags & FLAG_ORDER != 0 {
                    header_len += HT_CONTROL_LEN;
                }
            }
        }
        require(data, header_len)?;
        let sequence = u16::from_le_bytes([data[SEQUENCE_OFFSET], data[SEQUENCE_OFFSET + 1]]) >> 4;

        Ok(Self {
            frame_type,
            subtype,
            flags,
            addr1,
            addr2: Some(mac_at(data, ADDR2_OFFSET)?),
            addr3: Some(mac_at(data, ADDR3_OFFSET)?),
            sequence: Some(sequence),
            body: &data[header_len..],
        })
    }

    pub fn is_management(&self, subtype: u8) -> bool {
        self.frame_type == FrameType::Management && self.subtype == subtype
    }

    pub fn is_protected(&self) -> bool {
        self.flags & FLAG_PROTECTED != 0
    }

    /// Tagged parameters following `fixed_len` bytes of fixed fields.
    pub fn elements(&self, fixed_len: usize) -> Elements<'a> {
        Elements {
            rest: self.body.get(fixed_len..).unwrap_or_default(),
        }
    }
}

/// Iterator over `(id, value)` information elements. Stops at the first
/// truncated element.
#[derive(Debug, Clone)]
pub struct Elements<'a> {
    rest: &'a [u8],
}

impl<'a> Iterator for Elements<'a> {
    type Item = (u8, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let [id, len, tail @ ..] = self.rest else {
            return None;
        };
        let len = *len as usize;
        if tail.len() < len {
            self.rest = &[];
            return None;
        }
        let (value, rest) = tail.split_at(len);
        self.rest = rest;
        Some((*id, value))
    }
}

/// SSID element of a management body; `None` when absent.
pub fn ssid(mut elements: Elements<'_>) -> Option<String> {
    elements
        .find(|(id, _)| *id == element::SSID)
        .map(|(_, value)| {
            let value: &[u8] = if value.iter().all(|&b| b == 0) { &[] } else { value };
            String::from_utf8_lossy(value).into_owned()
        })
}

/// Channel announced in the DS parameter set element.
pub fn ds_channel(mut elements: Elements<'_>) -> Option<u16> {
    elements
        .find(|(id, value)| *id == element::DS_PARAMETER_SET && value.len() == 1)
        .map(|(_, value)| value[0] as u16)
}

fn require(data: &[u8], needed: usize) -> Result<(), WirelessError> {
    if data.len() < needed {
        return Err(WirelessError::TooShort {
            needed,
            actual: data.len(),
        });
    }
    Ok(())
}

fn mac_at(data: &[u8], offset: usize) -> Result<MacAddr, WirelessError> {
    require(data, offset + 6)?;
    let mut addr = [0u8; 6];
    addr.copy_from_slice(&data[offset..offset + 6]);
    Ok(MacAddr(addr))
}
