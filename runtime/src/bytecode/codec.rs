//! Bit-packed binary form of [`ByteCode`].
//!
//! Layout: `varint count`, then the canonical opcode string with every opcode
//! reduced to a 3-bit index, 8 opcodes per 3 bytes, zero padded:
//!
//! ```text
//! byte 0: 22111000   byte 1: 54443332   byte 2: 77766655
//! ```
//!
//! Jump targets are never stored. Decoding re-assembles the recovered opcode
//! string, so a corrupted payload fails bracket validation instead of
//! producing out-of-range jumps.

use crate::bytecode::compiler::assemble;
use crate::bytecode::{ByteCode, OpCode};
use crate::serialization::wire::{Decoder, WireWrite};
use crate::serialization::{DecodeError, DecodeResult};

impl ByteCode {
    /// Encode into a fresh buffer
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(packed_len(self.len()).unwrap_or(0) + 4);
        self.encode(&mut buf);
        buf
    }

    /// Append the packed form to `buf`
    pub fn encode(&self, buf: &mut Vec<u8>) {
        buf.put_uvarint(self.len() as u64);

        for chunk in self.instructions().chunks(8) {
            let mut ops = [0u8; 8];
            for (slot, instruction) in ops.iter_mut().zip(chunk) {
                *slot = instruction.opcode.packed_index();
            }

            buf.push(ops[2] << 6 | ops[1] << 3 | ops[0]);
            buf.push(ops[5] << 7 | ops[4] << 4 | ops[3] << 1 | ops[2] >> 2);
            buf.push(ops[7] << 5 | ops[6] << 2 | ops[5] >> 1);
        }
    }

    /// Decode a buffer that holds exactly one encoded program
    pub fn from_bytes(data: &[u8]) -> DecodeResult<Self> {
        let mut decoder = Decoder::new(data);
        let code = Self::decode(&mut decoder)?;
        decoder.finish()?;
        Ok(code)
    }

    /// Decode one program from the cursor, consuming only its own bytes
    pub fn decode(decoder: &mut Decoder<'_>) -> DecodeResult<Self> {
        let count = decoder.read_usize()?;
        let expected = packed_len(count).ok_or(DecodeError::Overflow(count as u64))?;

        let found = decoder.remaining();
        if found < expected {
            return Err(DecodeError::BadLength { expected, found });
        }
        let packed = decoder.take(expected)?;

        let mut source = Vec::with_capacity(expected / 3 * 8);
        for bytes in packed.chunks_exact(3) {
            let indices = [
                bytes[0],                    // xxxxx000
                bytes[0] >> 3,               // xx111xxx
                bytes[0] >> 6 | bytes[1] << 2, // 22xxxxxx xxxxxxx2
                bytes[1] >> 1,               // xxxx333x
                bytes[1] >> 4,               // x444xxxx
                bytes[1] >> 7 | bytes[2] << 1, // 5xxxxxxx xxxxxx55
                bytes[2] >> 2,               // xxx666xx
                bytes[2] >> 5,               // 777xxxxx
            ];
            source.extend(indices.iter().map(|&index| OpCode::from_packed_index(index).to_byte()));
        }
        source.truncate(count);

        Ok(assemble(&source, 0, Some(count))?)
    }
}

/// Packed payload size for `count` opcodes
fn packed_len(count: usize) -> Option<usize> {
    count.checked_add(7).map(|padded| padded / 8 * 3)
}
