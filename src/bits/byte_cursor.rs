use crate::errors::CursorError;

/// Byte order of a multi-byte field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Big,
    Little,
}

/// Sequential, bounds-checked reader over a byte buffer.
///
/// Header "views" are parsed field by field through this cursor instead of
/// overlaying a struct on the raw bytes.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining_length(&self) -> usize {
        self.data.len() - self.pos
    }

    /// The bytes not consumed yet.
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CursorError> {
        if n > self.remaining_length() {
            return Err(CursorError::OutOfData {
                wanted: n,
                available: self.remaining_length(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn skip(&mut self, n: usize) -> Result<(), CursorError> {
        self.take(n).map(|_| ())
    }

    pub fn read_u8(&mut self) -> Result<u8, CursorError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self, endian: Endian) -> Result<u16, CursorError> {
        let b = self.take(2)?;
        let raw = [b[0], b[1]];
        Ok(match endian {
            Endian::Big => u16::from_be_bytes(raw),
            Endian::Little => u16::from_le_bytes(raw),
        })
    }

    pub fn read_u32(&mut self, endian: Endian) -> Result<u32, CursorError> {
        let b = self.take(4)?;
        let raw = [b[0], b[1], b[2], b[3]];
        Ok(match endian {
            Endian::Big => u32::from_be_bytes(raw),
            Endian::Little => u32::from_le_bytes(raw),
        })
    }

    pub fn read_u16_be(&mut self) -> Result<u16, CursorError> {
        self.read_u16(Endian::Big)
    }

    pub fn read_u32_be(&mut self) -> Result<u32, CursorError> {
        self.read_u32(Endian::Big)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], CursorError> {
        self.take(n)
    }

    /// Read a four character code.
    pub fn read_fourcc(&mut self) -> Result<[u8; 4], CursorError> {
        let b = self.take(4)?;
        Ok([b[0], b[1], b[2], b[3]])
    }

    /// Read a string prefixed by an 8-bit length. Invalid UTF-8 is replaced.
    pub fn read_pascal_string(&mut self) -> Result<String, CursorError> {
        let len = self.read_u8()? as usize;
        Ok(String::from_utf8_lossy(self.take(len)?).into_owned())
    }

    /// Read a string prefixed by a 16-bit big endian length.
    pub fn read_u16_string(&mut self) -> Result<String, CursorError> {
        let len = self.read_u16_be()? as usize;
        Ok(String::from_utf8_lossy(self.take(len)?).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::{ByteCursor, Endian};
    use crate::errors::CursorError;

    #[test]
    fn test_endianness() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x01, 0x02];
        let mut c = ByteCursor::new(&data);
        assert_eq!(c.read_u32(Endian::Big).unwrap(), 0x0102_0304);
        assert_eq!(c.read_u16(Endian::Little).unwrap(), 0x0201);
        assert_eq!(c.remaining_length(), 0);
    }

    #[test]
    fn test_out_of_data_keeps_position() {
        let data = [0xaa, 0xbb, 0xcc];
        let mut c = ByteCursor::new(&data);
        c.skip(1).unwrap();
        assert_eq!(
            c.read_u32_be(),
            Err(CursorError::OutOfData {
                wanted: 4,
                available: 2
            })
        );
        assert_eq!(c.position(), 1);
        assert_eq!(c.read_u16_be().unwrap(), 0xbbcc);
        assert!(c.read_u8().is_err());
    }

    #[test]
    fn test_strings() {
        let data = [3, b'a', b'b', b'c', 0, 2, b'h', b'i', 9];
        let mut c = ByteCursor::new(&data);
        assert_eq!(c.read_pascal_string().unwrap(), "abc");
        assert_eq!(c.read_u16_string().unwrap(), "hi");
        assert_eq!(c.rest(), &[9]);
        // length byte claims more than is left
        let bad = [5, b'x'];
        assert!(ByteCursor::new(&bad).read_pascal_string().is_err());
    }
}
