/*
# Bits Reader Module

 Provides utilities for reading binary data from streams and byte buffers with bit-level precision.
 Includes byte-aligned readers over `Read` sources for the big endian integers used by container
 headers, and a `BitCursor` over an in-memory buffer for arbitrary bit-width fields found in
 codec bitstream headers.

 Key components:
 - Stream readers: `read_u8()`, `read_u16_be()`, `read_u32_be()`
 - BitCursor: fail-closed bit reads, `OutOfData` instead of garbage past the end
*/

use crate::errors::CursorError;
use std::io::{self, Read};

/// Mask for the `n` least significant bits.
pub fn mask(n: u32) -> u32 {
    if n == 32 {
        u32::MAX
    } else {
        (1u32 << n) - 1
    }
}

/// Read one byte from a `Read` implementation.
pub fn read_u8<R: Read>(r: &mut R) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Read a 16-bit big endian value from `r`.
pub fn read_u16_be<R: Read>(r: &mut R) -> io::Result<u16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_be_bytes(buf))
}

/// Read a 32-bit big endian value from `r`.
pub fn read_u32_be<R: Read>(r: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

/// `BitCursor` reads MSB-first bit fields from a byte slice.
///
/// Every accessor fails closed: asking for more bits than remain returns
/// `CursorError::OutOfData` and leaves the position untouched.
#[derive(Debug, Clone)]
pub struct BitCursor<'a> {
    data: &'a [u8],
    bit_pos: usize,
}

impl<'a> BitCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, bit_pos: 0 }
    }

    /// Number of bits not consumed yet.
    pub fn remaining_bits(&self) -> usize {
        self.data.len() * 8 - self.bit_pos
    }

    /// Total number of bits read or skipped so far.
    pub fn nr_bits_read(&self) -> usize {
        self.bit_pos
    }

    fn ensure(&self, n: usize) -> Result<(), CursorError> {
        if n > self.remaining_bits() {
            return Err(CursorError::OutOfData {
                wanted: n,
                available: self.remaining_bits(),
            });
        }
        Ok(())
    }

    /// Read `n` (at most 32) bits and return them as the lowest bits of a `u32`.
    pub fn get_bits(&mut self, n: u32) -> Result<u32, CursorError> {
        debug_assert!(n <= 32);
        self.ensure(n as usize)?;
        let mut value = 0u64;
        for _ in 0..n {
            let byte = self.data[self.bit_pos / 8];
            let bit = (byte >> (7 - (self.bit_pos % 8))) & 1;
            value = (value << 1) | u64::from(bit);
            self.bit_pos += 1;
        }
        Ok(value as u32 & mask(n))
    }

    /// Read a single bit interpreted as a boolean flag.
    pub fn get_flag(&mut self) -> Result<bool, CursorError> {
        Ok(self.get_bits(1)? == 1)
    }

    pub fn skip_bits(&mut self, n: usize) -> Result<(), CursorError> {
        self.ensure(n)?;
        self.bit_pos += n;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{mask, read_u16_be, read_u32_be, BitCursor};
    use crate::errors::CursorError;
    use std::io::Cursor;

    #[test]
    fn test_read_bits() {
        let data = [0xffu8, 0x0f];
        let mut r = BitCursor::new(&data);
        assert_eq!(r.get_bits(2).unwrap(), 3); // 11
        assert_eq!(r.get_bits(3).unwrap(), 7); // 111
        assert_eq!(r.get_bits(5).unwrap(), 28); // 11100
        assert_eq!(r.get_bits(3).unwrap(), 1); // 001
        assert_eq!(r.get_bits(3).unwrap(), 7); // 111
        assert_eq!(r.remaining_bits(), 0);
    }

    #[test]
    fn test_read_past_end_fails_closed() {
        let data = [0xa5u8];
        let mut r = BitCursor::new(&data);
        assert_eq!(r.get_bits(4).unwrap(), 0xa);
        assert_eq!(
            r.get_bits(5),
            Err(CursorError::OutOfData {
                wanted: 5,
                available: 4
            })
        );
        // position is unchanged after the failed read
        assert_eq!(r.get_bits(4).unwrap(), 0x5);
        assert!(r.skip_bits(1).is_err());
    }

    #[test]
    fn test_full_width_read() {
        let data = [0xde, 0xad, 0xbe, 0xef, 0x80];
        let mut r = BitCursor::new(&data);
        assert_eq!(r.get_bits(32).unwrap(), 0xdead_beef);
        assert!(r.get_flag().unwrap());
        assert_eq!(r.nr_bits_read(), 33);
    }

    #[test]
    fn test_stream_readers() {
        let mut c = Cursor::new(vec![0x12, 0x34, 0x00, 0x00, 0x01, 0x00]);
        assert_eq!(read_u16_be(&mut c).unwrap(), 0x1234);
        assert_eq!(read_u32_be(&mut c).unwrap(), 0x100);
        assert!(read_u16_be(&mut c).is_err());
    }

    #[test]
    fn test_writer_mask() {
        assert_eq!(mask(8), 0xff);
        assert_eq!(mask(4), 0x0f);
        assert_eq!(mask(32), u32::MAX);
    }
}
