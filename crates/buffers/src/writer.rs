//! Auto-growing binary buffer writer.

/// Writes binary data into an auto-growing buffer.
///
/// `uint8` is the backing storage and `x` the write cursor; bytes past `x` are
/// scratch space reserved by [`Writer::ensure_capacity`]. Encoders may write
/// directly into `uint8[x..]` after reserving, then advance `x`.
#[derive(Debug, Clone)]
pub struct Writer {
    pub uint8: Vec<u8>,
    pub x: usize,
    alloc_size: usize,
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer {
    pub fn new() -> Self {
        Self::with_alloc_size(1024)
    }

    pub fn with_alloc_size(alloc_size: usize) -> Self {
        Self {
            uint8: vec![0; alloc_size],
            x: 0,
            alloc_size,
        }
    }

    /// Number of bytes written since the last flush/reset.
    pub fn len(&self) -> usize {
        self.x
    }

    pub fn is_empty(&self) -> bool {
        self.x == 0
    }

    /// Makes sure at least `capacity` bytes can be written after the cursor.
    #[inline]
    pub fn ensure_capacity(&mut self, capacity: usize) {
        let required = self.x + capacity;
        if required > self.uint8.len() {
            let grown = (self.uint8.len() * 2).max(required).max(self.alloc_size);
            self.uint8.resize(grown, 0);
        }
    }

    /// Drops everything written so far.
    pub fn reset(&mut self) {
        self.x = 0;
    }

    /// Returns the written bytes and resets the cursor.
    pub fn flush(&mut self) -> Vec<u8> {
        let out = self.uint8[..self.x].to_vec();
        self.x = 0;
        out
    }

    /// Returns the written bytes without resetting.
    pub fn as_slice(&self) -> &[u8] {
        &self.uint8[..self.x]
    }

    #[inline]
    pub fn u8(&mut self, byte: u8) {
        self.ensure_capacity(1);
        self.uint8[self.x] = byte;
        self.x += 1;
    }

    #[inline]
    pub fn u16(&mut self, word: u16) {
        self.buf(&word.to_be_bytes());
    }

    #[inline]
    pub fn u32(&mut self, dword: u32) {
        self.buf(&dword.to_be_bytes());
    }

    #[inline]
    pub fn u64(&mut self, qword: u64) {
        self.buf(&qword.to_be_bytes());
    }

    /// Writes a one-byte header followed by a big-endian `u64`.
    pub fn u8u64(&mut self, head: u8, qword: u64) {
        self.u8(head);
        self.u64(qword);
    }

    #[inline]
    pub fn f32(&mut self, float: f32) {
        self.buf(&float.to_be_bytes());
    }

    #[inline]
    pub fn f64(&mut self, float: f64) {
        self.buf(&float.to_be_bytes());
    }

    /// Writes a one-byte header followed by a big-endian `f32`.
    pub fn u8f32(&mut self, head: u8, float: f32) {
        self.u8(head);
        self.f32(float);
    }

    /// Writes a one-byte header followed by a big-endian `f64`.
    pub fn u8f64(&mut self, head: u8, float: f64) {
        self.u8(head);
        self.f64(float);
    }

    pub fn buf(&mut self, bytes: &[u8]) {
        let len = bytes.len();
        self.ensure_capacity(len);
        self.uint8[self.x..self.x + len].copy_from_slice(bytes);
        self.x += len;
    }

    pub fn utf8(&mut self, s: &str) {
        self.buf(s.as_bytes());
    }
}
