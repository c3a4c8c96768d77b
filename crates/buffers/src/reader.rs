//! Bounds-checked little-endian buffer reader with cursor tracking.

use std::str;

use crate::BufferError;

/// A little-endian binary reader over a byte slice.
///
/// Every read is bounds-checked and reports [`BufferError::EndOfBuffer`]
/// instead of panicking.
///
/// # Example
///
/// ```
/// use octmat_buffers::Reader;
///
/// let data = [0x01, 0x03, 0x02];
/// let mut reader = Reader::new(&data);
///
/// assert_eq!(reader.u8().unwrap(), 0x01);
/// assert_eq!(reader.u16().unwrap(), 0x0203);
/// ```
pub struct Reader<'a> {
    /// The underlying byte slice.
    pub uint8: &'a [u8],
    /// Current cursor position.
    pub x: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader for the given byte slice.
    pub fn new(uint8: &'a [u8]) -> Self {
        Self { uint8, x: 0 }
    }

    /// Returns the number of remaining bytes.
    pub fn size(&self) -> usize {
        self.uint8.len() - self.x
    }

    #[inline]
    fn check(&self, n: usize) -> Result<(), BufferError> {
        if self.x + n > self.uint8.len() {
            Err(BufferError::EndOfBuffer)
        } else {
            Ok(())
        }
    }

    #[inline]
    fn take<const N: usize>(&mut self) -> Result<[u8; N], BufferError> {
        self.check(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.uint8[self.x..self.x + N]);
        self.x += N;
        Ok(out)
    }

    /// Advances the cursor by the given number of bytes.
    pub fn skip(&mut self, length: usize) -> Result<(), BufferError> {
        self.check(length)?;
        self.x += length;
        Ok(())
    }

    /// Advances the cursor to the next multiple of `align`.
    pub fn align(&mut self, align: usize) -> Result<(), BufferError> {
        let rem = self.x % align;
        if rem != 0 {
            self.skip(align - rem)?;
        }
        Ok(())
    }

    /// Reads `size` raw bytes and advances the cursor.
    pub fn buf(&mut self, size: usize) -> Result<&'a [u8], BufferError> {
        self.check(size)?;
        let bin = &self.uint8[self.x..self.x + size];
        self.x += size;
        Ok(bin)
    }

    /// Reads an unsigned 8-bit integer.
    pub fn u8(&mut self) -> Result<u8, BufferError> {
        Ok(self.take::<1>()?[0])
    }

    /// Reads a signed 8-bit integer.
    pub fn i8(&mut self) -> Result<i8, BufferError> {
        Ok(self.take::<1>()?[0] as i8)
    }

    /// Reads an unsigned 16-bit integer.
    pub fn u16(&mut self) -> Result<u16, BufferError> {
        self.take().map(u16::from_le_bytes)
    }

    /// Reads a signed 16-bit integer.
    pub fn i16(&mut self) -> Result<i16, BufferError> {
        self.take().map(i16::from_le_bytes)
    }

    /// Reads an unsigned 32-bit integer.
    pub fn u32(&mut self) -> Result<u32, BufferError> {
        self.take().map(u32::from_le_bytes)
    }

    /// Reads a signed 32-bit integer.
    pub fn i32(&mut self) -> Result<i32, BufferError> {
        self.take().map(i32::from_le_bytes)
    }

    /// Reads an unsigned 64-bit integer.
    pub fn u64(&mut self) -> Result<u64, BufferError> {
        self.take().map(u64::from_le_bytes)
    }

    /// Reads a signed 64-bit integer.
    pub fn i64(&mut self) -> Result<i64, BufferError> {
        self.take().map(i64::from_le_bytes)
    }

    /// Reads a 32-bit float.
    pub fn f32(&mut self) -> Result<f32, BufferError> {
        self.take().map(f32::from_le_bytes)
    }

    /// Reads a 64-bit float.
    pub fn f64(&mut self) -> Result<f64, BufferError> {
        self.take().map(f64::from_le_bytes)
    }

    /// Reads a UTF-8 string of `size` bytes.
    pub fn utf8(&mut self, size: usize) -> Result<&'a str, BufferError> {
        let bytes = self.buf(size)?;
        str::from_utf8(bytes).map_err(|_| BufferError::InvalidUtf8)
    }
}
