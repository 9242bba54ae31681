//! Conversion between packed bilevel rows and 8-bit gray samples.

use alloc::vec;
use alloc::vec::Vec;

use crate::color::Polarity;
use crate::error::WbmpError;
use crate::raster::{BitRaster, bytes_per_row};

/// Expand one packed row into `out.len()` gray samples (0 or 255).
///
/// With [`Polarity::BlackIsZero`] a set bit becomes 255.
pub(crate) fn expand_row(input: &[u8], out: &mut [u8], polarity: Polarity) {
    let (zero, one) = match polarity {
        Polarity::BlackIsZero => (0x00u8, 0xFFu8),
        Polarity::WhiteIsZero => (0xFF, 0x00),
    };
    let pick = |bit: u8| if bit == 0 { zero } else { one };

    let mut in_iter = input.iter();
    let mut out_iter = out.chunks_exact_mut(8);

    (&mut out_iter)
        .zip(&mut in_iter)
        .for_each(|(out_vals, &in_val)| {
            for (i, o) in out_vals.iter_mut().enumerate() {
                *o = pick((in_val >> (7 - i)) & 0x01);
            }
        });

    let remainder = out_iter.into_remainder();
    if let Some(&in_val) = in_iter.next() {
        for (pos, o) in remainder.iter_mut().enumerate() {
            *o = pick((in_val >> (7 - pos)) & 0x01);
        }
    }
}

/// Pack one row of gray samples; samples at or above `threshold` set the bit
/// when `polarity` is [`Polarity::BlackIsZero`].
pub(crate) fn pack_row(input: &[u8], out: &mut [u8], threshold: u8, polarity: Polarity) {
    let invert = polarity.inverts();
    for (byte, chunk) in out.iter_mut().zip(input.chunks(8)) {
        let mut packed = 0u8;
        for (i, &g) in chunk.iter().enumerate() {
            if (g >= threshold) != invert {
                packed |= 0x80 >> i;
            }
        }
        *byte = packed;
    }
}

/// Unpack a raster into one gray byte per pixel, row-major.
pub fn to_gray8(raster: &BitRaster, polarity: Polarity) -> Result<Vec<u8>, WbmpError> {
    let (w, h) = (raster.width(), raster.height());
    let len = (w as usize)
        .checked_mul(h as usize)
        .ok_or(WbmpError::DimensionsTooLarge {
            width: w,
            height: h,
        })?;
    let mut out = vec![0u8; len];
    if w == 0 {
        return Ok(out);
    }
    for (y, row_out) in out.chunks_exact_mut(w as usize).enumerate() {
        expand_row(raster.row(y as u32), row_out, polarity);
    }
    Ok(out)
}

/// Threshold gray bytes (one per pixel, row-major) into a packed raster.
pub fn from_gray8(
    pixels: &[u8],
    width: u32,
    height: u32,
    threshold: u8,
    polarity: Polarity,
) -> Result<BitRaster, WbmpError> {
    let expected = (width as usize)
        .checked_mul(height as usize)
        .ok_or(WbmpError::DimensionsTooLarge { width, height })?;
    if pixels.len() < expected {
        return Err(WbmpError::BufferTooSmall {
            needed: expected,
            actual: pixels.len(),
        });
    }
    let mut raster = BitRaster::new(width, height)?;
    if width == 0 {
        return Ok(raster);
    }
    let bpr = bytes_per_row(width);
    for (row_in, row_out) in pixels[..expected]
        .chunks_exact(width as usize)
        .zip(raster.data_mut().chunks_exact_mut(bpr))
    {
        pack_row(row_in, row_out, threshold, polarity);
    }
    Ok(raster)
}

/// Unpack into an [`imgref::ImgVec`] of gray bytes.
#[cfg(feature = "imgref")]
pub fn to_imgvec(raster: &BitRaster, polarity: Polarity) -> Result<imgref::ImgVec<u8>, WbmpError> {
    let pixels = to_gray8(raster, polarity)?;
    Ok(imgref::ImgVec::new(
        pixels,
        raster.width() as usize,
        raster.height() as usize,
    ))
}
