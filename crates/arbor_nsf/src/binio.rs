//! Little-endian binary reader and writer

use std::io::{Cursor, Read};

/// Reads fixed-width little-endian fields from a byte slice
pub struct BinReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> BinReader<'a> {
    /// Start reading at the beginning of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    /// Current byte offset
    pub fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    /// Read a `u16`. `None` past the end of the data.
    pub fn read_u16(&mut self) -> Option<u16> {
        let mut bytes = [0u8; 2];
        self.cursor.read_exact(&mut bytes).ok()?;
        Some(u16::from_le_bytes(bytes))
    }

    /// Read a `u32`. `None` past the end of the data.
    pub fn read_u32(&mut self) -> Option<u32> {
        let mut bytes = [0u8; 4];
        self.cursor.read_exact(&mut bytes).ok()?;
        Some(u32::from_le_bytes(bytes))
    }
}

/// Accumulates little-endian fields into a buffer
#[derive(Debug, Default)]
pub struct BinWriter {
    buffer: Vec<u8>,
}

impl BinWriter {
    /// Create an empty writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty writer with room for `capacity` bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Append a `u16`
    pub fn write_u16(&mut self, value: u16) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Append a `u32`
    pub fn write_u32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Append raw bytes
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Bytes written so far
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if nothing was written
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Finish and take the buffer
    pub fn finish(self) -> Vec<u8> {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_little_endian() {
        let mut w = BinWriter::new();
        w.write_u16(0x1234);
        w.write_u32(0xAABBCCDD);
        let bytes = w.finish();
        assert_eq!(bytes, vec![0x34, 0x12, 0xDD, 0xCC, 0xBB, 0xAA]);

        let mut r = BinReader::new(&bytes);
        assert_eq!(r.read_u16(), Some(0x1234));
        assert_eq!(r.read_u32(), Some(0xAABBCCDD));
        assert_eq!(r.position(), 6);
    }

    #[test]
    fn test_read_past_end() {
        let mut r = BinReader::new(&[1, 2, 3]);
        assert_eq!(r.read_u16(), Some(0x0201));
        assert_eq!(r.read_u16(), None);
    }
}
