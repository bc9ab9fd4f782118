//! Varint primitives shared by the bytecode and problem encodings

use crate::serialization::{DecodeError, DecodeResult};

/// Longest valid encoding of a u64
pub const MAX_VARINT_LEN: usize = 10;

/// Append-only encoding helpers for byte buffers
pub trait WireWrite {
    /// Write an unsigned LEB128 varint
    fn put_uvarint(&mut self, value: u64);

    /// Write a length-prefixed byte string
    fn put_bytes(&mut self, bytes: &[u8]);
}

impl WireWrite for Vec<u8> {
    fn put_uvarint(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.push(value as u8 | 0x80);
            value >>= 7;
        }
        self.push(value as u8);
    }

    fn put_bytes(&mut self, bytes: &[u8]) {
        self.put_uvarint(bytes.len() as u64);
        self.extend_from_slice(bytes);
    }
}

/// Cursor over an encoded buffer
#[derive(Debug)]
pub struct Decoder<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Number of bytes not consumed yet
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Read an unsigned LEB128 varint
    pub fn read_uvarint(&mut self) -> DecodeResult<u64> {
        let start = self.position;
        let mut value = 0u64;
        let mut shift = 0u32;

        for index in 0..MAX_VARINT_LEN {
            let Some(&byte) = self.data.get(start + index) else {
                return Err(DecodeError::UnexpectedEnd(self.data.len()));
            };

            if index == MAX_VARINT_LEN - 1 && byte > 1 {
                return Err(DecodeError::BadVarint(start));
            }

            value |= u64::from(byte & 0x7F) << shift;
            if byte < 0x80 {
                self.position = start + index + 1;
                return Ok(value);
            }
            shift += 7;
        }

        Err(DecodeError::BadVarint(start))
    }

    /// Read a varint that must fit into `usize`
    pub fn read_usize(&mut self) -> DecodeResult<usize> {
        let value = self.read_uvarint()?;
        usize::try_from(value).map_err(|_| DecodeError::Overflow(value))
    }

    /// Consume exactly `len` raw bytes
    pub fn take(&mut self, len: usize) -> DecodeResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(DecodeError::UnexpectedEnd(self.data.len()));
        }
        let bytes = &self.data[self.position..self.position + len];
        self.position += len;
        Ok(bytes)
    }

    /// Read a length-prefixed byte string
    pub fn read_bytes(&mut self) -> DecodeResult<&'a [u8]> {
        let len = self.read_usize()?;
        self.take(len)
    }

    /// Read a length-prefixed UTF-8 string
    pub fn read_text(&mut self) -> DecodeResult<&'a str> {
        let bytes = self.read_bytes()?;
        std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidText)
    }

    /// Fail if any bytes are left
    pub fn finish(self) -> DecodeResult<()> {
        match self.remaining() {
            0 => Ok(()),
            junk => Err(DecodeError::TrailingBytes(junk)),
        }
    }
}
