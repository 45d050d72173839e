//! Byte cursors, varints and zigzag mapping shared by the codecs.

use crate::error::{CodecError, CodecResult, FormatError};

/// Largest number of 7-bit groups a varint may use.
const MAX_VARINT_GROUPS: usize = 5;

/// Read a little-endian base-128 varint starting at `*offset`.
///
/// At most five groups are consumed, which covers every value the codecs
/// write (up to 35 bits). `*offset` is advanced past the varint.
pub fn read_varint(data: &[u8], offset: &mut usize) -> CodecResult<u64> {
    let start = *offset;
    let mut result = 0u64;

    for group in 0..MAX_VARINT_GROUPS {
        let Some(&byte) = data.get(*offset) else {
            return Err(CodecError::truncated(*offset, 1, data.len()));
        };
        *offset += 1;
        result |= u64::from(byte & 0x7f) << (7 * group);
        if byte & 0x80 == 0 {
            return Ok(result);
        }
    }

    Err(FormatError::OverlongVarint(start).into())
}

/// Number of bytes [`write_varint`] uses for `value`.
#[must_use]
pub fn varint_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(7).max(1)
}

/// Map a wrapped 32-bit delta to an unsigned value with small magnitudes first.
#[inline]
pub(crate) fn zigzag32(delta: u32) -> u32 {
    (delta << 1) ^ ((delta as i32 >> 31) as u32)
}

/// Inverse of [`zigzag32`].
#[inline]
pub(crate) fn unzigzag32(value: u32) -> u32 {
    (value >> 1) ^ (value & 1).wrapping_neg()
}

#[inline]
pub(crate) fn zigzag8(delta: u8) -> u8 {
    (delta << 1) ^ ((delta as i8 >> 7) as u8)
}

#[inline]
pub(crate) fn unzigzag8(value: u8) -> u8 {
    (value >> 1) ^ (value & 1).wrapping_neg()
}

/// Bounds-checked reader over an encoded blob.
///
/// `end` may be smaller than the slice length to keep payload reads out of a
/// trailing region such as the vertex tail.
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
    end: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(data: &'a [u8], pos: usize, end: usize) -> Self {
        debug_assert!(pos <= end && end <= data.len());
        Self { data, pos, end }
    }

    pub(crate) fn read_u8(&mut self) -> CodecResult<u8> {
        if self.pos >= self.end {
            return Err(CodecError::truncated(self.pos, 1, self.end));
        }
        let byte = self.data[self.pos];
        self.pos += 1;
        Ok(byte)
    }

    pub(crate) fn read_bytes(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        if self.end - self.pos < len {
            return Err(CodecError::truncated(self.pos, len, self.end));
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    pub(crate) fn read_varint(&mut self) -> CodecResult<u64> {
        read_varint(&self.data[..self.end], &mut self.pos)
    }

    /// Fail unless every byte up to `end` has been consumed.
    pub(crate) fn finish(&self) -> CodecResult<()> {
        if self.pos == self.end {
            Ok(())
        } else {
            Err(FormatError::LengthMismatch {
                consumed: self.pos,
                expected: self.end,
            }
            .into())
        }
    }
}

/// Writer over a caller-provided output slice.
///
/// Encoders size the slice with their `*_bound` function up front, so writes
/// never run past the end.
pub(crate) struct ByteWriter<'a> {
    data: &'a mut [u8],
    pos: usize,
}

impl<'a> ByteWriter<'a> {
    pub(crate) fn new(data: &'a mut [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn write_u8(&mut self, byte: u8) {
        self.data[self.pos] = byte;
        self.pos += 1;
    }

    pub(crate) fn write_bytes(&mut self, bytes: &[u8]) {
        self.data[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
    }

    /// Reserve `len` zeroed bytes and return their offset for later patching.
    pub(crate) fn reserve(&mut self, len: usize) -> usize {
        let at = self.pos;
        self.data[at..at + len].fill(0);
        self.pos += len;
        at
    }

    pub(crate) fn patch_or(&mut self, at: usize, bits: u8) {
        self.data[at] |= bits;
    }

    pub(crate) fn write_varint(&mut self, mut value: u64) {
        loop {
            let group = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                self.write_u8(group);
                return;
            }
            self.write_u8(group | 0x80);
        }
    }
}
