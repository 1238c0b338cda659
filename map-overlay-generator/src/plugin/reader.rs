/// Little-endian cursor over a borrowed byte slice with bounds-checked reads.
use crate::error::FormatError;

pub struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    /// Absolute offset of `bytes[0]` within the source file, for error messages.
    base: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self::with_base(bytes, 0)
    }

    pub fn with_base(bytes: &'a [u8], base: usize) -> Self {
        Self {
            bytes,
            pos: 0,
            base,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn absolute(&self) -> usize {
        self.base + self.pos
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Skip to the end so later reads see an empty buffer.
    pub fn exhaust(&mut self) {
        self.pos = self.bytes.len();
    }

    pub fn take(&mut self, needed: usize, what: &'static str) -> Result<&'a [u8], FormatError> {
        if needed > self.remaining() {
            return Err(FormatError::Truncated {
                what,
                offset: self.absolute(),
                needed,
                available: self.remaining(),
            });
        }
        let slice = &self.bytes[self.pos..self.pos + needed];
        self.pos += needed;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self, what: &'static str) -> Result<[u8; N], FormatError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, what)?);
        Ok(out)
    }

    pub fn fourcc(&mut self, what: &'static str) -> Result<[u8; 4], FormatError> {
        self.array(what)
    }

    pub fn u16(&mut self, what: &'static str) -> Result<u16, FormatError> {
        self.array(what).map(u16::from_le_bytes)
    }

    pub fn u32(&mut self, what: &'static str) -> Result<u32, FormatError> {
        self.array(what).map(u32::from_le_bytes)
    }

    pub fn i32(&mut self, what: &'static str) -> Result<i32, FormatError> {
        self.array(what).map(i32::from_le_bytes)
    }

    pub fn f32(&mut self, what: &'static str) -> Result<f32, FormatError> {
        self.array(what).map(f32::from_le_bytes)
    }
}
