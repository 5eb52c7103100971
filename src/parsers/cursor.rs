use super::{primitive::*, BlendParseError, Endianness, PointerSize, Result};

/// Sequential, seekable reader over the (already decompressed) bytes of a .blend file.
///
/// Every multi-byte read honours the file's endianness and `read_pointer` reads 4 or 8 bytes depending on the pointer
/// size of the machine that wrote the file. Both are fixed once the header has been read, see `ByteCursor::bind`.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    position: usize,
    endianness: Endianness,
    pointer_size: PointerSize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8], endianness: Endianness, pointer_size: PointerSize) -> Self {
        Self {
            data,
            position: 0,
            endianness,
            pointer_size,
        }
    }

    /// Returns a cursor at the same position that reads numbers and pointers with the given layout.
    pub fn bind(self, endianness: Endianness, pointer_size: PointerSize) -> Self {
        Self {
            endianness,
            pointer_size,
            ..self
        }
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    pub fn pointer_size(&self) -> PointerSize {
        self.pointer_size
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    fn truncated(&self, needed: usize) -> BlendParseError {
        BlendParseError::TruncatedStream {
            offset: self.position,
            needed,
            available: self.remaining(),
        }
    }

    /// Moves to an absolute offset. Seeking to the very end is allowed, past it is not.
    pub fn seek(&mut self, offset: usize) -> Result<()> {
        if offset > self.data.len() {
            return Err(BlendParseError::TruncatedStream {
                offset,
                needed: 0,
                available: 0,
            });
        }
        self.position = offset;
        Ok(())
    }

    pub fn skip(&mut self, len: usize) -> Result<()> {
        if len > self.remaining() {
            return Err(self.truncated(len));
        }
        self.position += len;
        Ok(())
    }

    /// Returns exactly `len` bytes or fails with `TruncatedStream` without moving.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(self.truncated(len));
        }
        let data = self.data;
        let bytes = &data[self.position..self.position + len];
        self.position += len;
        Ok(bytes)
    }

    /// With `len == 0` reads up to (and consumes) the next NUL byte, otherwise reads exactly `len` bytes. The result
    /// has leading and trailing whitespace trimmed.
    pub fn read_fixed_or_terminated(&mut self, len: usize) -> Result<String> {
        let bytes = if len == 0 {
            let data = self.data;
            let rest = &data[self.position..];
            let end = match rest.iter().position(|&b| b == 0) {
                Some(end) => end,
                None => return Err(self.truncated(rest.len() + 1)),
            };
            let bytes = &rest[..end];
            self.position += end + 1;
            bytes
        } else {
            self.read_bytes(len)?
        };

        Ok(String::from_utf8_lossy(bytes).trim().to_owned())
    }

    /// Advances to the next multiple of 4, does nothing if already aligned.
    pub fn align_to_4(&mut self) -> Result<()> {
        let trim = self.position % 4;
        if trim != 0 {
            self.skip(4 - trim)?;
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let bytes = self.read_bytes(1)?;
        parse_u8(bytes, self.endianness).ok_or_else(|| self.truncated(1))
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.read_bytes(2)?;
        parse_u16(bytes, self.endianness).ok_or_else(|| self.truncated(2))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        parse_u32(bytes, self.endianness).ok_or_else(|| self.truncated(4))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let bytes = self.read_bytes(8)?;
        parse_u64(bytes, self.endianness).ok_or_else(|| self.truncated(8))
    }

    /// Reads a pointer-sized unsigned integer, widened to `u64`.
    pub fn read_pointer(&mut self) -> Result<u64> {
        match self.pointer_size {
            PointerSize::Bits32 => self.read_u32().map(u64::from),
            PointerSize::Bits64 => self.read_u64(),
        }
    }

    /// `u32` counts and sizes widened to `usize`.
    pub(crate) fn read_len(&mut self) -> Result<usize> {
        self.read_u32().map(|n| n as usize)
    }
}
