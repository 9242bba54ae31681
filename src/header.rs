//! WBMP type 0 header: two fixed bytes and two multi-byte dimensions.

use alloc::vec::Vec;

use crate::error::WbmpError;
use crate::io::{ByteSink, ByteSource, SliceSource};
use crate::raster::bytes_per_row;
use crate::varint::{header_eof, multi_byte_len, push_multi_byte, read_multi_byte, write_multi_byte};

/// The only WBMP type in use: uncompressed bilevel, no extension headers.
pub const WBMP_TYPE_0: u8 = 0;

/// Header fields as stored on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WbmpHeader {
    pub type_field: u8,
    pub fix_header_field: u8,
    pub width: u32,
    pub height: u32,
}

impl WbmpHeader {
    /// Type 0 header for a `width` × `height` image.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            type_field: WBMP_TYPE_0,
            fix_header_field: 0,
            width,
            height,
        }
    }

    /// Read and validate a header from the current position of `src`.
    pub fn read_from<S: ByteSource + ?Sized>(src: &mut S) -> Result<Self, WbmpError> {
        let type_field = src.read_byte().map_err(header_eof)?;
        if type_field != WBMP_TYPE_0 {
            return Err(WbmpError::UnsupportedType(type_field));
        }
        let fix_header_field = src.read_byte().map_err(header_eof)?;
        if fix_header_field != 0 {
            return Err(WbmpError::InvalidFixHeader(fix_header_field));
        }
        let width = read_multi_byte(src)?;
        let height = read_multi_byte(src)?;
        if width == 0 || height == 0 {
            return Err(WbmpError::InvalidHeader(alloc::format!(
                "zero dimension {width}x{height}"
            )));
        }
        Ok(Self {
            type_field,
            fix_header_field,
            width,
            height,
        })
    }

    /// Parse a header at the start of `data`, returning it with the offset
    /// of the first pixel byte.
    pub fn parse(data: &[u8]) -> Result<(Self, usize), WbmpError> {
        let mut src = SliceSource::new(data);
        let header = Self::read_from(&mut src)?;
        Ok((header, src.position() as usize))
    }

    pub fn write_to<K: ByteSink + ?Sized>(&self, sink: &mut K) -> Result<(), WbmpError> {
        sink.write_byte(self.type_field)?;
        sink.write_byte(self.fix_header_field)?;
        write_multi_byte(self.width, sink)?;
        write_multi_byte(self.height, sink)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.push(self.type_field);
        out.push(self.fix_header_field);
        push_multi_byte(self.width, &mut out);
        push_multi_byte(self.height, &mut out);
        out
    }

    /// Serialized header size in bytes.
    pub fn encoded_len(&self) -> usize {
        2 + multi_byte_len(self.width) + multi_byte_len(self.height)
    }

    pub fn bytes_per_row(&self) -> usize {
        bytes_per_row(self.width)
    }

    /// Size of the pixel data that follows the header.
    pub fn data_len(&self) -> u64 {
        self.bytes_per_row() as u64 * u64::from(self.height)
    }

    pub fn metadata(&self) -> WbmpMetadata {
        WbmpMetadata {
            wbmp_type: self.type_field,
            width: self.width,
            height: self.height,
        }
    }
}

/// Read-only summary of a parsed header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WbmpMetadata {
    wbmp_type: u8,
    width: u32,
    height: u32,
}

impl WbmpMetadata {
    /// Always [`WBMP_TYPE_0`].
    pub fn wbmp_type(&self) -> u8 {
        self.wbmp_type
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Parse the header of an in-memory WBMP without decoding pixels.
pub fn probe(data: &[u8]) -> Result<WbmpMetadata, WbmpError> {
    WbmpHeader::parse(data).map(|(header, _)| header.metadata())
}

/// Whether `data` looks like a complete WBMP image.
///
/// WBMP has no magic number, so besides a valid header the remaining
/// length must equal exactly the pixel data the header announces.
pub fn can_decode(data: &[u8]) -> bool {
    match WbmpHeader::parse(data) {
        Ok((header, offset)) => (data.len() - offset) as u64 == header.data_len(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reports_data_offset() {
        let bytes = [0x00, 0x00, 0x81, 0x00, 0x02, 0xAA];
        let (h, off) = WbmpHeader::parse(&bytes).unwrap();
        assert_eq!((h.width, h.height, off), (128, 2, 5));
        assert_eq!(h.encoded_len(), 5);
        assert_eq!(h.to_bytes(), bytes[..5]);
    }

    #[test]
    fn rejects_bad_fixed_fields() {
        assert!(matches!(
            WbmpHeader::parse(&[0x01, 0x00, 0x01, 0x01]),
            Err(WbmpError::UnsupportedType(1))
        ));
        assert!(matches!(
            WbmpHeader::parse(&[0x00, 0xFF, 0x01, 0x01]),
            Err(WbmpError::InvalidFixHeader(0xFF))
        ));
    }

    #[test]
    fn truncated_header_is_format_error() {
        for len in 0..4 {
            let err = WbmpHeader::parse(&[0x00, 0x00, 0x81, 0x00][..len]).unwrap_err();
            assert!(err.is_format_error(), "len {len}: {err:?}");
        }
    }

    #[test]
    fn zero_dimension_rejected() {
        assert!(matches!(
            WbmpHeader::parse(&[0x00, 0x00, 0x00, 0x05]),
            Err(WbmpError::InvalidHeader(_))
        ));
    }

    #[test]
    fn can_decode_requires_exact_length() {
        // 9x2 needs 2 bytes per row.
        let mut data = WbmpHeader::new(9, 2).to_bytes();
        data.extend_from_slice(&[0; 3]);
        assert!(!can_decode(&data));
        data.push(0);
        assert!(can_decode(&data));
        data.push(0);
        assert!(!can_decode(&data));
        assert!(!can_decode(&[0x00, 0x01, 0x01, 0x01, 0x00]));
    }

    #[test]
    fn probe_metadata() {
        let meta = probe(&[0x00, 0x00, 0x03, 0x07]).unwrap();
        assert_eq!(meta.wbmp_type(), 0);
        assert_eq!((meta.width(), meta.height()), (3, 7));
    }
}
