//! Little-endian binary buffer writer with auto-growing capacity.

/// A little-endian binary buffer writer that grows automatically as needed.
///
/// Besides the plain integer and float writers it can back-patch a
/// previously reserved `u32` slot, which is how length-prefixed elements are
/// emitted before their size is known, and cut off a written tail for
/// post-processing.
///
/// # Example
///
/// ```
/// use octmat_buffers::Writer;
///
/// let mut writer = Writer::new();
/// writer.u8(0x01);
/// writer.u16(0x0203);
/// let data = writer.flush();
/// assert_eq!(data, [0x01, 0x03, 0x02]);
/// ```
pub struct Writer {
    /// The underlying byte buffer.
    pub uint8: Vec<u8>,
    /// Position where last flush happened.
    pub x0: usize,
    /// Current cursor position.
    pub x: usize,
    /// Allocation size when buffer needs to grow.
    alloc_size: usize,
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer {
    /// Creates a new writer with default allocation size (64KB).
    pub fn new() -> Self {
        Self::with_alloc_size(64 * 1024)
    }

    /// Creates a new writer with custom allocation size.
    pub fn with_alloc_size(alloc_size: usize) -> Self {
        let uint8 = vec![0u8; alloc_size];
        Self {
            uint8,
            x0: 0,
            x: 0,
            alloc_size,
        }
    }

    /// Ensures the buffer has at least `capacity` bytes available.
    pub fn ensure_capacity(&mut self, capacity: usize) {
        let remaining = self.uint8.len() - self.x;
        if remaining < capacity {
            let total = self.uint8.len() - self.x0;
            let required = capacity - remaining;
            let total_required = total + required;
            let new_size = if total_required <= self.alloc_size {
                self.alloc_size
            } else {
                total_required * 2
            };
            self.grow(new_size);
        }
    }

    fn grow(&mut self, new_size: usize) {
        let x0 = self.x0;
        let x = self.x;
        let mut new_buf = vec![0u8; new_size];
        new_buf[..x - x0].copy_from_slice(&self.uint8[x0..x]);
        self.uint8 = new_buf;
        self.x = x - x0;
        self.x0 = 0;
    }

    /// Number of bytes written since the last flush.
    #[inline]
    pub fn len(&self) -> usize {
        self.x - self.x0
    }

    /// Returns `true` when nothing was written since the last flush.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x == self.x0
    }

    /// Resets the flush position.
    pub fn reset(&mut self) {
        self.x0 = self.x;
    }

    /// Returns the written data and advances the flush position.
    pub fn flush(&mut self) -> Vec<u8> {
        let result = self.uint8[self.x0..self.x].to_vec();
        self.x0 = self.x;
        result
    }

    /// Removes everything written after relative position `pos` and returns it.
    pub fn split_off(&mut self, pos: usize) -> Vec<u8> {
        let at = (self.x0 + pos).min(self.x);
        let tail = self.uint8[at..self.x].to_vec();
        self.x = at;
        tail
    }

    /// Writes `n` zero bytes.
    pub fn zeros(&mut self, n: usize) {
        self.ensure_capacity(n);
        self.uint8[self.x..self.x + n].fill(0);
        self.x += n;
    }

    /// Reserves a `u32` slot and returns its position for [`Writer::patch_u32`].
    ///
    /// Positions are relative to the last flush, so they stay valid when the
    /// buffer grows.
    pub fn reserve_u32(&mut self) -> usize {
        let pos = self.len();
        self.zeros(4);
        pos
    }

    /// Overwrites a slot previously returned by [`Writer::reserve_u32`].
    pub fn patch_u32(&mut self, pos: usize, val: u32) {
        let at = self.x0 + pos;
        self.uint8[at..at + 4].copy_from_slice(&val.to_le_bytes());
    }

    /// Writes an unsigned 8-bit integer.
    #[inline]
    pub fn u8(&mut self, val: u8) {
        self.ensure_capacity(1);
        self.uint8[self.x] = val;
        self.x += 1;
    }

    /// Writes a signed 8-bit integer.
    #[inline]
    pub fn i8(&mut self, val: i8) {
        self.u8(val as u8);
    }

    /// Writes an unsigned 16-bit integer.
    #[inline]
    pub fn u16(&mut self, val: u16) {
        self.buf(&val.to_le_bytes());
    }

    /// Writes a signed 16-bit integer.
    #[inline]
    pub fn i16(&mut self, val: i16) {
        self.buf(&val.to_le_bytes());
    }

    /// Writes an unsigned 32-bit integer.
    #[inline]
    pub fn u32(&mut self, val: u32) {
        self.buf(&val.to_le_bytes());
    }

    /// Writes a signed 32-bit integer.
    #[inline]
    pub fn i32(&mut self, val: i32) {
        self.buf(&val.to_le_bytes());
    }

    /// Writes an unsigned 64-bit integer.
    #[inline]
    pub fn u64(&mut self, val: u64) {
        self.buf(&val.to_le_bytes());
    }

    /// Writes a signed 64-bit integer.
    #[inline]
    pub fn i64(&mut self, val: i64) {
        self.buf(&val.to_le_bytes());
    }

    /// Writes a 32-bit floating point number.
    #[inline]
    pub fn f32(&mut self, val: f32) {
        self.buf(&val.to_le_bytes());
    }

    /// Writes a 64-bit floating point number.
    #[inline]
    pub fn f64(&mut self, val: f64) {
        self.buf(&val.to_le_bytes());
    }

    /// Writes two `u32` values back to back (a MAT element tag).
    pub fn u32u32(&mut self, a: u32, b: u32) {
        self.ensure_capacity(8);
        self.uint8[self.x..self.x + 4].copy_from_slice(&a.to_le_bytes());
        self.uint8[self.x + 4..self.x + 8].copy_from_slice(&b.to_le_bytes());
        self.x += 8;
    }

    /// Writes a byte slice.
    pub fn buf(&mut self, buf: &[u8]) {
        let length = buf.len();
        self.ensure_capacity(length);
        self.uint8[self.x..self.x + length].copy_from_slice(buf);
        self.x += length;
    }

    /// Writes an ASCII string.
    pub fn ascii(&mut self, s: &str) {
        self.buf(s.as_bytes());
    }
}
