//! Bilevel raster model.
//!
//! WBMP pixels are packed 8 per byte, most significant bit first, and
//! every row starts on a byte boundary. [`BitRaster`] owns such a buffer;
//! [`BitRasterView`] borrows a rectangle of one without copying. Any other
//! pixel source can feed the encoder by implementing [`Raster`].

use alloc::vec::Vec;

use crate::error::WbmpError;
use crate::region::Rect;

/// Bytes in one packed row of `width` pixels.
#[inline]
pub fn bytes_per_row(width: u32) -> usize {
    width.div_ceil(8) as usize
}

/// Storage word backing a raster's samples.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SampleStorage {
    U8,
    U16,
    U32,
}

/// Band count, sample depth and storage of a raster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SampleLayout {
    pub bands: u32,
    pub bits_per_sample: u32,
    pub storage: SampleStorage,
}

impl SampleLayout {
    /// One band, one bit per sample, byte storage: the only layout WBMP holds.
    pub const BILEVEL: Self = Self {
        bands: 1,
        bits_per_sample: 1,
        storage: SampleStorage::U8,
    };

    pub fn is_bilevel(&self) -> bool {
        *self == Self::BILEVEL
    }

    pub(crate) fn validate(&self) -> Result<(), WbmpError> {
        if self.bands != 1 {
            return Err(WbmpError::UnsupportedRaster(alloc::format!(
                "expected 1 band, got {}",
                self.bands
            )));
        }
        if self.bits_per_sample != 1 {
            return Err(WbmpError::UnsupportedRaster(alloc::format!(
                "expected 1 bit per sample, got {}",
                self.bits_per_sample
            )));
        }
        if self.storage != SampleStorage::U8 {
            return Err(WbmpError::UnsupportedRaster(alloc::format!(
                "expected byte storage, got {:?}",
                self.storage
            )));
        }
        Ok(())
    }
}

/// Borrowed packed 1-bit rows.
///
/// Pixel `(x, y)` lives at bit `bit_offset + x` of the row starting at
/// `data[y * stride]`, counted from the most significant bit.
#[derive(Clone, Copy, Debug)]
pub struct PackedBits<'a> {
    data: &'a [u8],
    stride: usize,
    bit_offset: usize,
}

impl<'a> PackedBits<'a> {
    /// Byte-aligned rows. Offsets of 8 bits or more are folded into `data`.
    pub fn new(data: &'a [u8], stride: usize, bit_offset: usize) -> Self {
        let skip = (bit_offset >> 3).min(data.len());
        Self {
            data: &data[skip..],
            stride,
            bit_offset: bit_offset & 7,
        }
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Bit position of column 0 within each row (0..8).
    pub fn bit_offset(&self) -> usize {
        self.bit_offset
    }

    /// Child view starting at `(x, y)`; shares the buffer.
    pub fn offset(&self, x: u32, y: u32) -> PackedBits<'a> {
        let start = (y as usize).saturating_mul(self.stride).min(self.data.len());
        PackedBits::new(&self.data[start..], self.stride, self.bit_offset + x as usize)
    }

    /// Sample at `(x, y)`, 0 or 1.
    ///
    /// # Panics
    /// If the position lies outside `data`.
    #[inline]
    pub fn bit(&self, x: u32, y: u32) -> u8 {
        let pos = self.bit_offset + x as usize;
        let byte = self.data[y as usize * self.stride + (pos >> 3)];
        (byte >> (7 - (pos & 7))) & 1
    }

    /// Packed bytes of row `y`, or `None` if the buffer is too short.
    pub(crate) fn row(&self, y: u32, row_bytes: usize) -> Option<&'a [u8]> {
        let start = (y as usize).checked_mul(self.stride)?;
        self.data.get(start..start.checked_add(row_bytes)?)
    }

    /// Bytes needed to hold `height` rows of `width` pixels.
    fn required_len(&self, width: u32, height: u32) -> Option<usize> {
        if height == 0 {
            return Some(0);
        }
        let last_row = (height as usize - 1).checked_mul(self.stride)?;
        let row_bits = self.bit_offset.checked_add(width as usize)?;
        last_row.checked_add(row_bits.div_ceil(8))
    }
}

/// A two-dimensional grid of samples the encoder can read.
///
/// Only [`SampleLayout::BILEVEL`] rasters are writable as WBMP. Rasters
/// that expose their packed bytes through [`Raster::packed_bits`] are
/// cropped and written without copying.
pub trait Raster {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn layout(&self) -> SampleLayout;

    /// Sample value of `band` at `(x, y)`.
    fn sample(&self, x: u32, y: u32, band: u32) -> u32;

    /// Packed 1-bit backing store, if the raster has one.
    fn packed_bits(&self) -> Option<PackedBits<'_>> {
        None
    }
}

// ── Owned raster ────────────────────────────────────────────────────

/// Owned packed bilevel raster.
///
/// Equality compares pixels only; row padding bits are ignored.
#[derive(Clone, Debug)]
pub struct BitRaster {
    data: Vec<u8>,
    width: u32,
    height: u32,
    stride: usize,
}

impl BitRaster {
    /// All-zero raster with tightly packed rows.
    pub fn new(width: u32, height: u32) -> Result<Self, WbmpError> {
        Self::with_stride(width, height, bytes_per_row(width))
    }

    /// All-zero raster with `stride` bytes per row (at least `ceil(width / 8)`).
    pub fn with_stride(width: u32, height: u32, stride: usize) -> Result<Self, WbmpError> {
        check_stride(width, stride)?;
        let len = stride
            .checked_mul(height as usize)
            .ok_or(WbmpError::DimensionsTooLarge { width, height })?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| WbmpError::DimensionsTooLarge { width, height })?;
        data.resize(len, 0);
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Wrap tightly packed rows.
    pub fn from_packed(data: Vec<u8>, width: u32, height: u32) -> Result<Self, WbmpError> {
        Self::from_packed_with_stride(data, width, height, bytes_per_row(width))
    }

    /// Wrap packed rows that are `stride` bytes apart.
    pub fn from_packed_with_stride(
        data: Vec<u8>,
        width: u32,
        height: u32,
        stride: usize,
    ) -> Result<Self, WbmpError> {
        check_stride(width, stride)?;
        let needed = stride
            .checked_mul(height as usize)
            .ok_or(WbmpError::DimensionsTooLarge { width, height })?;
        if data.len() < needed {
            return Err(WbmpError::BufferTooSmall {
                needed,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Copy any bilevel raster into canonical packed form.
    pub fn copy_from(raster: &dyn Raster) -> Result<Self, WbmpError> {
        raster.layout().validate()?;
        let (w, h) = (raster.width(), raster.height());
        let mut out = Self::new(w, h)?;
        for y in 0..h {
            for x in 0..w {
                if raster.sample(x, y, 0) != 0 {
                    out.set(x, y, true);
                }
            }
        }
        Ok(out)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes between the starts of consecutive rows.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Bytes of pixel data per row, excluding stride padding.
    pub fn bytes_per_row(&self) -> usize {
        bytes_per_row(self.width)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Packed bytes of row `y`.
    ///
    /// # Panics
    /// If `y >= height`.
    pub fn row(&self, y: u32) -> &[u8] {
        assert!(y < self.height, "row {y} out of bounds");
        let start = y as usize * self.stride;
        &self.data[start..start + self.bytes_per_row()]
    }

    /// Pixel at `(x, y)`.
    ///
    /// # Panics
    /// If the position is out of bounds.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> bool {
        assert!(x < self.width && y < self.height, "({x}, {y}) out of bounds");
        let byte = self.data[y as usize * self.stride + (x as usize >> 3)];
        (byte >> (7 - (x & 7))) & 1 == 1
    }

    /// Set or clear the pixel at `(x, y)`.
    ///
    /// # Panics
    /// If the position is out of bounds.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        assert!(x < self.width && y < self.height, "({x}, {y}) out of bounds");
        let idx = y as usize * self.stride + (x as usize >> 3);
        let mask = 0x80u8 >> (x & 7);
        if value {
            self.data[idx] |= mask;
        } else {
            self.data[idx] &= !mask;
        }
    }

    /// Zero the unused low bits of each row's last byte.
    pub(crate) fn clear_padding(&mut self) {
        let tail = self.width & 7;
        if tail == 0 || self.height == 0 {
            return;
        }
        let mask = !(0xFFu8 >> tail);
        let last = self.bytes_per_row() - 1;
        for row in self.data.chunks_mut(self.stride).take(self.height as usize) {
            row[last] &= mask;
        }
    }

    /// Zero-copy view of the whole raster.
    pub fn as_view(&self) -> BitRasterView<'_> {
        BitRasterView {
            bits: PackedBits::new(&self.data, self.stride, 0),
            width: self.width,
            height: self.height,
        }
    }

    /// Zero-copy view of `rect`, which must lie inside the raster.
    pub fn view(&self, rect: Rect) -> Result<BitRasterView<'_>, WbmpError> {
        self.as_view().view(rect)
    }
}

fn check_stride(width: u32, stride: usize) -> Result<(), WbmpError> {
    let min = bytes_per_row(width);
    if stride < min {
        return Err(WbmpError::InvalidParameter(alloc::format!(
            "stride {stride} is smaller than the {min} bytes a {width}-pixel row needs"
        )));
    }
    Ok(())
}

impl PartialEq for BitRaster {
    fn eq(&self, other: &Self) -> bool {
        if self.width != other.width || self.height != other.height {
            return false;
        }
        let full = (self.width / 8) as usize;
        let tail = self.width & 7;
        let mask = !(0xFFu8 >> tail);
        (0..self.height).all(|y| {
            let (a, b) = (self.row(y), other.row(y));
            a[..full] == b[..full] && (tail == 0 || (a[full] & mask) == (b[full] & mask))
        })
    }
}

impl Eq for BitRaster {}

impl Raster for BitRaster {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn layout(&self) -> SampleLayout {
        SampleLayout::BILEVEL
    }

    fn sample(&self, x: u32, y: u32, _band: u32) -> u32 {
        u32::from(self.get(x, y))
    }

    fn packed_bits(&self) -> Option<PackedBits<'_>> {
        Some(PackedBits::new(&self.data, self.stride, 0))
    }
}

// ── Borrowed view ───────────────────────────────────────────────────

/// Rectangle of a packed raster, sharing its buffer.
///
/// Column 0 of a view need not be byte-aligned in the parent.
#[derive(Clone, Copy, Debug)]
pub struct BitRasterView<'a> {
    bits: PackedBits<'a>,
    width: u32,
    height: u32,
}

impl<'a> BitRasterView<'a> {
    /// View external packed rows. Fails if `bits` cannot hold the extent.
    pub fn new(bits: PackedBits<'a>, width: u32, height: u32) -> Result<Self, WbmpError> {
        let needed = bits
            .required_len(width, height)
            .ok_or(WbmpError::DimensionsTooLarge { width, height })?;
        if bits.data().len() < needed {
            return Err(WbmpError::BufferTooSmall {
                needed,
                actual: bits.data().len(),
            });
        }
        Ok(Self {
            bits,
            width,
            height,
        })
    }

    /// Nested view; `rect` is relative to this view.
    pub fn view(&self, rect: Rect) -> Result<BitRasterView<'a>, WbmpError> {
        if rect.is_empty() {
            return Err(WbmpError::EmptyRegion);
        }
        if !Rect::from_size(self.width, self.height).contains(&rect) {
            return Err(WbmpError::InvalidParameter(alloc::format!(
                "view {rect:?} exceeds {}x{} raster",
                self.width,
                self.height
            )));
        }
        Ok(Self {
            bits: self.bits.offset(rect.x, rect.y),
            width: rect.width,
            height: rect.height,
        })
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        assert!(x < self.width && y < self.height, "({x}, {y}) out of bounds");
        self.bits.bit(x, y) == 1
    }

    /// Copy into an owned, byte-aligned raster.
    pub fn to_raster(&self) -> Result<BitRaster, WbmpError> {
        BitRaster::copy_from(self)
    }
}

impl Raster for BitRasterView<'_> {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn layout(&self) -> SampleLayout {
        SampleLayout::BILEVEL
    }

    fn sample(&self, x: u32, y: u32, _band: u32) -> u32 {
        u32::from(self.get(x, y))
    }

    fn packed_bits(&self) -> Option<PackedBits<'_>> {
        Some(self.bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn set_get_msb_first() {
        let mut r = BitRaster::new(10, 2).unwrap();
        r.set(0, 0, true);
        r.set(9, 1, true);
        assert_eq!(r.data(), &[0x80, 0x00, 0x00, 0x40]);
        assert!(r.get(9, 1));
        r.set(0, 0, false);
        assert_eq!(r.data()[0], 0);
    }

    #[test]
    fn equality_ignores_padding() {
        let a = BitRaster::from_packed(vec![0b1010_0000], 3, 1).unwrap();
        let b = BitRaster::from_packed(vec![0b1011_1111], 3, 1).unwrap();
        assert_eq!(a, b);
        let c = BitRaster::from_packed(vec![0b1110_0000], 3, 1).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn clear_padding_masks_tail() {
        let mut r = BitRaster::from_packed_with_stride(vec![0xFF, 0xFF, 0xFF, 0xFF], 5, 2, 2)
            .unwrap();
        r.clear_padding();
        assert_eq!(r.data(), &[0xF8, 0xFF, 0xF8, 0xFF]);
    }

    #[test]
    fn unaligned_view_reads_parent_bits() {
        let mut r = BitRaster::new(16, 3).unwrap();
        r.set(5, 1, true);
        r.set(11, 2, true);
        let v = r.view(Rect::new(3, 1, 10, 2)).unwrap();
        assert!(v.get(2, 0));
        assert!(v.get(8, 1));
        assert!(!v.get(0, 0));
        let bits = v.packed_bits().unwrap();
        assert_eq!(bits.bit_offset(), 3);

        let nested = v.view(Rect::new(6, 1, 4, 1)).unwrap();
        assert!(nested.get(2, 0));
        assert_eq!(nested.packed_bits().unwrap().bit_offset(), 1);
        assert_eq!(nested.to_raster().unwrap().data(), &[0b0010_0000]);
    }

    #[test]
    fn view_out_of_bounds() {
        let r = BitRaster::new(4, 4).unwrap();
        assert!(r.view(Rect::new(2, 2, 3, 1)).is_err());
        assert!(matches!(
            r.view(Rect::new(0, 0, 0, 1)),
            Err(WbmpError::EmptyRegion)
        ));
    }

    #[test]
    fn stride_must_cover_row() {
        assert!(BitRaster::with_stride(17, 1, 2).is_err());
        assert!(matches!(
            BitRaster::from_packed(vec![0; 3], 16, 2),
            Err(WbmpError::BufferTooSmall { needed: 4, actual: 3 })
        ));
    }

    #[test]
    fn oversized_allocation_is_error() {
        // 2^29 bytes per row times 2^32 - 1 rows cannot be allocated.
        assert!(matches!(
            BitRaster::new(u32::MAX, u32::MAX),
            Err(WbmpError::DimensionsTooLarge { .. })
        ));
    }

    #[test]
    fn layout_validation() {
        let gray = SampleLayout {
            bands: 1,
            bits_per_sample: 8,
            storage: SampleStorage::U8,
        };
        assert!(matches!(
            gray.validate(),
            Err(WbmpError::UnsupportedRaster(_))
        ));
        assert!(SampleLayout::BILEVEL.validate().is_ok());
    }
}
