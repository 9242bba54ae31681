//! Byte stream collaborators for the reader and writer.
//!
//! [`ByteSource`] and [`ByteSink`] are the minimal surfaces the codec needs:
//! sequential reads with skipping, and sequential writes with flushing.
//! In-memory implementations are always available; `std::io` adapters
//! require the `std` feature.

use alloc::vec::Vec;

use crate::error::WbmpError;

/// Sequential byte input.
pub trait ByteSource {
    /// Read one byte, or fail with [`WbmpError::UnexpectedEof`].
    fn read_byte(&mut self) -> Result<u8, WbmpError> {
        let mut b = [0u8; 1];
        self.read_exact(&mut b)?;
        Ok(b[0])
    }

    /// Fill `buf` completely, or fail with [`WbmpError::UnexpectedEof`].
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), WbmpError>;

    /// Advance past `n` bytes. Skipping beyond the end is an error.
    fn skip(&mut self, n: u64) -> Result<(), WbmpError>;

    /// Bytes consumed since the source was created.
    fn position(&self) -> u64;

    /// Bytes left before the end of input, if the source knows.
    fn available(&self) -> Option<u64> {
        None
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_byte(&mut self) -> Result<u8, WbmpError> {
        (**self).read_byte()
    }
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), WbmpError> {
        (**self).read_exact(buf)
    }
    fn skip(&mut self, n: u64) -> Result<(), WbmpError> {
        (**self).skip(n)
    }
    fn position(&self) -> u64 {
        (**self).position()
    }
    fn available(&self) -> Option<u64> {
        (**self).available()
    }
}

/// Sequential byte output.
pub trait ByteSink {
    fn write_byte(&mut self, byte: u8) -> Result<(), WbmpError> {
        self.write_all(&[byte])
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<(), WbmpError>;

    fn flush(&mut self) -> Result<(), WbmpError>;
}

impl<K: ByteSink + ?Sized> ByteSink for &mut K {
    fn write_byte(&mut self, byte: u8) -> Result<(), WbmpError> {
        (**self).write_byte(byte)
    }
    fn write_all(&mut self, buf: &[u8]) -> Result<(), WbmpError> {
        (**self).write_all(buf)
    }
    fn flush(&mut self) -> Result<(), WbmpError> {
        (**self).flush()
    }
}

impl ByteSink for Vec<u8> {
    fn write_byte(&mut self, byte: u8) -> Result<(), WbmpError> {
        self.push(byte);
        Ok(())
    }
    fn write_all(&mut self, buf: &[u8]) -> Result<(), WbmpError> {
        self.extend_from_slice(buf);
        Ok(())
    }
    fn flush(&mut self) -> Result<(), WbmpError> {
        Ok(())
    }
}

// ── In-memory source ────────────────────────────────────────────────

/// Cursor over an in-memory byte slice.
#[derive(Clone, Debug)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }
}

impl ByteSource for SliceSource<'_> {
    fn read_byte(&mut self) -> Result<u8, WbmpError> {
        let b = *self.data.get(self.pos).ok_or(WbmpError::UnexpectedEof)?;
        self.pos += 1;
        Ok(b)
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), WbmpError> {
        let end = self
            .pos
            .checked_add(buf.len())
            .ok_or(WbmpError::UnexpectedEof)?;
        let src = self
            .data
            .get(self.pos..end)
            .ok_or(WbmpError::UnexpectedEof)?;
        buf.copy_from_slice(src);
        self.pos = end;
        Ok(())
    }

    fn skip(&mut self, n: u64) -> Result<(), WbmpError> {
        let n = usize::try_from(n).map_err(|_| WbmpError::UnexpectedEof)?;
        if n > self.data.len() - self.pos {
            return Err(WbmpError::UnexpectedEof);
        }
        self.pos += n;
        Ok(())
    }

    fn position(&self) -> u64 {
        self.pos as u64
    }

    fn available(&self) -> Option<u64> {
        Some((self.data.len() - self.pos) as u64)
    }
}

// ── std::io adapters ────────────────────────────────────────────────

/// [`ByteSource`] over any [`std::io::Read`].
///
/// Skips are performed by reading and discarding, so no `Seek` bound is
/// needed. Wrap unbuffered readers in a `BufReader`.
#[cfg(feature = "std")]
#[derive(Debug)]
pub struct IoSource<R> {
    inner: R,
    pos: u64,
}

#[cfg(feature = "std")]
impl<R: std::io::Read> IoSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, pos: 0 }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

#[cfg(feature = "std")]
fn map_read_err(e: std::io::Error) -> WbmpError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        WbmpError::UnexpectedEof
    } else {
        WbmpError::Io(e)
    }
}

#[cfg(feature = "std")]
impl<R: std::io::Read> ByteSource for IoSource<R> {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), WbmpError> {
        self.inner.read_exact(buf).map_err(map_read_err)?;
        self.pos += buf.len() as u64;
        Ok(())
    }

    fn skip(&mut self, n: u64) -> Result<(), WbmpError> {
        use std::io::Read as _;
        let skipped = std::io::copy(&mut (&mut self.inner).take(n), &mut std::io::sink())
            .map_err(map_read_err)?;
        self.pos += skipped;
        if skipped < n {
            return Err(WbmpError::UnexpectedEof);
        }
        Ok(())
    }

    fn position(&self) -> u64 {
        self.pos
    }
}

/// [`ByteSink`] over any [`std::io::Write`].
#[cfg(feature = "std")]
#[derive(Debug)]
pub struct IoSink<W> {
    inner: W,
}

#[cfg(feature = "std")]
impl<W: std::io::Write> IoSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(feature = "std")]
impl<W: std::io::Write> ByteSink for IoSink<W> {
    fn write_all(&mut self, buf: &[u8]) -> Result<(), WbmpError> {
        Ok(self.inner.write_all(buf)?)
    }

    fn flush(&mut self) -> Result<(), WbmpError> {
        Ok(self.inner.flush()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_source_reads_and_skips() {
        let data = [1u8, 2, 3, 4, 5];
        let mut src = SliceSource::new(&data);
        assert_eq!(src.read_byte().unwrap(), 1);
        src.skip(2).unwrap();
        let mut buf = [0u8; 2];
        src.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [4, 5]);
        assert_eq!(src.position(), 5);
        assert!(matches!(src.read_byte(), Err(WbmpError::UnexpectedEof)));
        assert!(matches!(src.skip(1), Err(WbmpError::UnexpectedEof)));
    }

    #[test]
    fn slice_source_short_read_keeps_position() {
        let data = [1u8, 2];
        let mut src = SliceSource::new(&data);
        let mut buf = [0u8; 3];
        assert!(src.read_exact(&mut buf).is_err());
        assert_eq!(src.position(), 0);
    }

    #[cfg(feature = "std")]
    #[test]
    fn io_source_tracks_position() {
        let data = [9u8, 8, 7, 6];
        let mut src = IoSource::new(&data[..]);
        src.skip(1).unwrap();
        assert_eq!(src.read_byte().unwrap(), 8);
        assert_eq!(src.position(), 2);
        assert!(matches!(src.skip(10), Err(WbmpError::UnexpectedEof)));
    }
}
