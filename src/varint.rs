//! WBMP multi-byte integers.
//!
//! Width and height are stored as big-endian base-128 integers: each byte
//! carries 7 value bits, most significant group first, and the high bit
//! (0x80) is set on every byte except the last.

use crate::error::WbmpError;
use crate::io::{ByteSink, ByteSource};

/// Continuation flag on every byte but the last.
pub const CONTINUATION: u8 = 0x80;

/// Longest encoding of a `u32` (ceil(32 / 7)).
pub const MAX_MULTI_BYTE_LEN: usize = 5;

/// Fold one encoded byte into the accumulator.
///
/// Fails instead of wrapping when the shifted value no longer fits in `u32`.
#[inline]
pub(crate) fn accumulate(acc: u32, byte: u8) -> Result<u32, WbmpError> {
    if acc > (u32::MAX >> 7) {
        return Err(WbmpError::InvalidHeader(
            "multi-byte integer overflows 32 bits".into(),
        ));
    }
    Ok((acc << 7) | u32::from(byte & !CONTINUATION))
}

/// Decode a multi-byte integer from the start of `data`.
///
/// Returns the value and the number of bytes consumed.
pub fn decode_multi_byte(data: &[u8]) -> Result<(u32, usize), WbmpError> {
    let mut acc = 0u32;
    for (i, &byte) in data.iter().enumerate() {
        if i == MAX_MULTI_BYTE_LEN {
            break;
        }
        acc = accumulate(acc, byte)?;
        if byte & CONTINUATION == 0 {
            return Ok((acc, i + 1));
        }
    }
    if data.len() >= MAX_MULTI_BYTE_LEN {
        Err(too_long())
    } else {
        Err(WbmpError::TruncatedHeader)
    }
}

pub(crate) fn too_long() -> WbmpError {
    WbmpError::InvalidHeader(alloc::format!(
        "multi-byte integer longer than {MAX_MULTI_BYTE_LEN} bytes"
    ))
}

/// Number of bytes [`encode_multi_byte`] produces for `value`.
pub fn multi_byte_len(value: u32) -> usize {
    let bits = (u32::BITS - value.leading_zeros()) as usize;
    bits.div_ceil(7).max(1)
}

/// Encode `value` into `out`, returning the number of bytes written.
///
/// The encoding is minimal: no leading zero groups.
pub fn encode_multi_byte(value: u32, out: &mut [u8; MAX_MULTI_BYTE_LEN]) -> usize {
    let len = multi_byte_len(value);
    for (i, slot) in out[..len].iter_mut().enumerate() {
        let shift = 7 * (len - 1 - i);
        let group = ((value >> shift) & 0x7F) as u8;
        *slot = if i + 1 < len { group | CONTINUATION } else { group };
    }
    len
}

/// Append the encoding of `value` to `out`.
pub fn push_multi_byte(value: u32, out: &mut alloc::vec::Vec<u8>) {
    let mut buf = [0u8; MAX_MULTI_BYTE_LEN];
    let len = encode_multi_byte(value, &mut buf);
    out.extend_from_slice(&buf[..len]);
}

/// Read one multi-byte integer from a stream.
///
/// Running out of input here means the header was cut short.
pub fn read_multi_byte<S: ByteSource + ?Sized>(src: &mut S) -> Result<u32, WbmpError> {
    let mut acc = 0u32;
    for _ in 0..MAX_MULTI_BYTE_LEN {
        let byte = src.read_byte().map_err(header_eof)?;
        acc = accumulate(acc, byte)?;
        if byte & CONTINUATION == 0 {
            return Ok(acc);
        }
    }
    Err(too_long())
}

/// Write one multi-byte integer to a sink.
pub fn write_multi_byte<K: ByteSink + ?Sized>(value: u32, sink: &mut K) -> Result<(), WbmpError> {
    let mut buf = [0u8; MAX_MULTI_BYTE_LEN];
    let len = encode_multi_byte(value, &mut buf);
    sink.write_all(&buf[..len])
}

/// End of input while reading header fields is a format error.
pub(crate) fn header_eof(e: WbmpError) -> WbmpError {
    match e {
        WbmpError::UnexpectedEof => WbmpError::TruncatedHeader,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::SliceSource;
    use alloc::vec::Vec;

    fn encode(v: u32) -> Vec<u8> {
        let mut out = Vec::new();
        push_multi_byte(v, &mut out);
        out
    }

    #[test]
    fn small_values_take_one_byte() {
        assert_eq!(encode(0), [0x00]);
        assert_eq!(encode(1), [0x01]);
        assert_eq!(encode(127), [0x7F]);
    }

    #[test]
    fn group_boundaries() {
        assert_eq!(encode(128), [0x81, 0x00]);
        assert_eq!(encode(0x3FFF), [0xFF, 0x7F]);
        assert_eq!(encode(0x4000), [0x81, 0x80, 0x00]);
        assert_eq!(encode(u32::MAX), [0x8F, 0xFF, 0xFF, 0xFF, 0x7F]);
    }

    #[test]
    fn length_matches_bit_length() {
        for bits in 0..=32u32 {
            let v = if bits == 0 { 0 } else { u32::MAX >> (32 - bits) };
            let expected = (bits as usize).div_ceil(7).max(1);
            assert_eq!(multi_byte_len(v), expected, "bits={bits}");
            assert_eq!(encode(v).len(), expected);
        }
    }

    #[test]
    fn decode_inverts_encode() {
        let mut state: u32 = 0x1234_5678;
        for _ in 0..2000 {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let bytes = encode(state);
            assert_eq!(decode_multi_byte(&bytes).unwrap(), (state, bytes.len()));
        }
    }

    #[test]
    fn decode_stops_at_clear_high_bit() {
        let (v, used) = decode_multi_byte(&[0x81, 0x00, 0xAA, 0xBB]).unwrap();
        assert_eq!((v, used), (128, 2));
    }

    #[test]
    fn decode_rejects_overflow() {
        // 0x1F in the leading group needs 33 bits.
        let err = decode_multi_byte(&[0x9F, 0xFF, 0xFF, 0xFF, 0x7F]).unwrap_err();
        assert!(err.is_format_error());
    }

    #[test]
    fn decode_rejects_overlong_padding() {
        let err = decode_multi_byte(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x01]).unwrap_err();
        assert!(matches!(err, WbmpError::InvalidHeader(_)));
    }

    #[test]
    fn stream_helpers_agree_with_slices() {
        let mut bytes = Vec::new();
        for v in [0u32, 5, 300, 0x20_0000, u32::MAX] {
            write_multi_byte(v, &mut bytes).unwrap();
        }
        let mut src = SliceSource::new(&bytes);
        for v in [0u32, 5, 300, 0x20_0000, u32::MAX] {
            assert_eq!(read_multi_byte(&mut src).unwrap(), v);
        }
        assert!(matches!(
            read_multi_byte(&mut src),
            Err(WbmpError::TruncatedHeader)
        ));
    }

    #[test]
    fn decode_truncated() {
        assert!(matches!(
            decode_multi_byte(&[0x81, 0x80]),
            Err(WbmpError::TruncatedHeader)
        ));
        assert!(matches!(
            decode_multi_byte(&[]),
            Err(WbmpError::TruncatedHeader)
        ));
    }
}
