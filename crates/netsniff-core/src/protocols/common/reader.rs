use std::ops::Range;

use crate::decoder::DecodeError;

/// Bounds-checked reads over an application payload.
///
/// Every accessor reports `DecodeError::TooShort` instead of panicking, so
/// parsers never index payload bytes directly.
#[derive(Clone, Copy)]
pub(crate) struct ByteReader<'a> {
    payload: &'a [u8],
}

impl<'a> ByteReader<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self { payload }
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn require_len(&self, needed: usize) -> Result<(), DecodeError> {
        if self.payload.len() < needed {
            return Err(DecodeError::TooShort {
                needed,
                actual: self.payload.len(),
            });
        }
        Ok(())
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8, DecodeError> {
        self.payload
            .get(offset)
            .copied()
            .ok_or(DecodeError::TooShort {
                needed: offset.saturating_add(1),
                actual: self.payload.len(),
            })
    }

    pub fn read_u16_be(&self, offset: usize) -> Result<u16, DecodeError> {
        let bytes = self.read_array::<2>(offset)?;
        Ok(u16::from_be_bytes(bytes))
    }

    pub fn read_u16_le(&self, offset: usize) -> Result<u16, DecodeError> {
        let bytes = self.read_array::<2>(offset)?;
        Ok(u16::from_le_bytes(bytes))
    }

    pub fn read_u24_be(&self, offset: usize) -> Result<u32, DecodeError> {
        let [a, b, c] = self.read_array::<3>(offset)?;
        Ok(u32::from_be_bytes([0, a, b, c]))
    }

    pub fn read_u32_be(&self, offset: usize) -> Result<u32, DecodeError> {
        let bytes = self.read_array::<4>(offset)?;
        Ok(u32::from_be_bytes(bytes))
    }

    pub fn read_u32_le(&self, offset: usize) -> Result<u32, DecodeError> {
        let bytes = self.read_array::<4>(offset)?;
        Ok(u32::from_le_bytes(bytes))
    }

    pub fn read_slice(&self, range: Range<usize>) -> Result<&'a [u8], DecodeError> {
        self.payload
            .get(range.clone())
            .ok_or(DecodeError::TooShort {
                needed: range.end,
                actual: self.payload.len(),
            })
    }

    /// Read `len` bytes starting at `offset`.
    pub fn read_len(&self, offset: usize, len: usize) -> Result<&'a [u8], DecodeError> {
        let end = offset.checked_add(len).ok_or(DecodeError::InvalidLength {
            field: "range",
            length: len,
        })?;
        self.read_slice(offset..end)
    }

    fn read_array<const N: usize>(&self, offset: usize) -> Result<[u8; N], DecodeError> {
        let bytes = self.read_len(offset, N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::ByteReader;
    use crate::decoder::DecodeError;

    #[test]
    fn reads_both_endiannesses() {
        let reader = ByteReader::new(&[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(reader.read_u16_be(0).unwrap(), 0x0102);
        assert_eq!(reader.read_u16_le(0).unwrap(), 0x0201);
        assert_eq!(reader.read_u24_be(1).unwrap(), 0x020304);
        assert_eq!(reader.read_u32_le(0).unwrap(), 0x04030201);
    }

    #[test]
    fn out_of_bounds_is_too_short() {
        let reader = ByteReader::new(&[0x01, 0x02]);
        assert_eq!(
            reader.read_u32_be(0).unwrap_err(),
            DecodeError::TooShort {
                needed: 4,
                actual: 2
            }
        );
        assert!(reader.read_len(usize::MAX, 2).is_err());
    }
}
