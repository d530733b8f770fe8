//! Binary buffer reader with cursor tracking.

use std::str;

use crate::BufferError;

/// A binary buffer reader over a byte slice.
///
/// Unlike an in-process decoder, the codecs built on top of this reader parse
/// bytes received from a remote peer, so every accessor returns
/// [`BufferError::EndOfBuffer`] instead of panicking on truncated input.
///
/// # Example
///
/// ```
/// use structured_protocol_buffers::Reader;
///
/// let data = [0x01, 0x02, 0x03];
/// let mut reader = Reader::new(&data);
///
/// assert_eq!(reader.u8().unwrap(), 0x01);
/// assert_eq!(reader.u16().unwrap(), 0x0203);
/// assert!(reader.u8().is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    /// The underlying byte slice.
    pub uint8: &'a [u8],
    /// Current cursor position.
    pub x: usize,
    /// End position (exclusive).
    pub end: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader for the given byte slice.
    pub fn new(uint8: &'a [u8]) -> Self {
        Self {
            uint8,
            x: 0,
            end: uint8.len(),
        }
    }

    /// Returns the number of remaining bytes.
    pub fn size(&self) -> usize {
        self.end.saturating_sub(self.x)
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Peeks at the current byte without advancing the cursor.
    pub fn peek(&self) -> Result<u8, BufferError> {
        if self.x < self.end {
            Ok(self.uint8[self.x])
        } else {
            Err(BufferError::EndOfBuffer)
        }
    }

    /// Advances the cursor by the given number of bytes.
    pub fn skip(&mut self, length: usize) -> Result<(), BufferError> {
        self.buf(length).map(|_| ())
    }

    /// Returns a subarray of the given size and advances the cursor.
    pub fn buf(&mut self, size: usize) -> Result<&'a [u8], BufferError> {
        let end = self.x.checked_add(size).ok_or(BufferError::EndOfBuffer)?;
        if end > self.end {
            return Err(BufferError::EndOfBuffer);
        }
        let bin = &self.uint8[self.x..end];
        self.x = end;
        Ok(bin)
    }

    /// Creates a new Reader over the next `size` bytes and advances the cursor
    /// past them.
    pub fn cut(&mut self, size: usize) -> Result<Reader<'a>, BufferError> {
        let start = self.x;
        self.buf(size)?;
        Ok(Reader {
            uint8: self.uint8,
            x: start,
            end: self.x,
        })
    }

    #[inline]
    fn array<const N: usize>(&mut self) -> Result<[u8; N], BufferError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.buf(N)?);
        Ok(out)
    }

    /// Reads an unsigned 8-bit integer.
    #[inline]
    pub fn u8(&mut self) -> Result<u8, BufferError> {
        let val = self.peek()?;
        self.x += 1;
        Ok(val)
    }

    /// Reads an unsigned 16-bit integer (big-endian).
    #[inline]
    pub fn u16(&mut self) -> Result<u16, BufferError> {
        self.array().map(u16::from_be_bytes)
    }

    /// Reads an unsigned 32-bit integer (big-endian).
    #[inline]
    pub fn u32(&mut self) -> Result<u32, BufferError> {
        self.array().map(u32::from_be_bytes)
    }

    /// Reads an unsigned 64-bit integer (big-endian).
    #[inline]
    pub fn u64(&mut self) -> Result<u64, BufferError> {
        self.array().map(u64::from_be_bytes)
    }

    /// Reads a 16-bit half precision float (big-endian), widened to `f64`.
    pub fn f16(&mut self) -> Result<f64, BufferError> {
        let half = self.u16()?;
        let exp = (half >> 10) & 0x1f;
        let mant = (half & 0x3ff) as f64;
        let val = match exp {
            0 => mant * 2f64.powi(-24),
            0x1f if mant == 0.0 => f64::INFINITY,
            0x1f => f64::NAN,
            _ => (mant + 1024.0) * 2f64.powi(exp as i32 - 25),
        };
        Ok(if half & 0x8000 != 0 { -val } else { val })
    }

    /// Reads a 32-bit floating point number (big-endian).
    #[inline]
    pub fn f32(&mut self) -> Result<f32, BufferError> {
        self.array().map(f32::from_be_bytes)
    }

    /// Reads a 64-bit floating point number (big-endian).
    #[inline]
    pub fn f64(&mut self) -> Result<f64, BufferError> {
        self.array().map(f64::from_be_bytes)
    }

    /// Reads a UTF-8 string of the given size.
    pub fn utf8(&mut self, size: usize) -> Result<&'a str, BufferError> {
        let bytes = self.buf(size)?;
        str::from_utf8(bytes).map_err(|_| BufferError::InvalidUtf8)
    }
}
