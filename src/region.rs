//! Region-of-interest and subsampling geometry.
//!
//! Both directions clip the requested source region to the image, shift
//! it by the subsampling offset, then decimate: the output spans
//! `ceil(width / period)` columns and `ceil(height / period)` rows.

use crate::error::WbmpError;

/// Axis-aligned rectangle in pixel coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle at the origin.
    pub const fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// One past the last column, widened so it cannot overflow.
    pub fn right(&self) -> u64 {
        u64::from(self.x) + u64::from(self.width)
    }

    /// One past the last row.
    pub fn bottom(&self) -> u64 {
        u64::from(self.y) + u64::from(self.height)
    }

    /// Overlap of two rectangles; empty (zero-sized) when disjoint.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 <= u64::from(x0) || y1 <= u64::from(y0) {
            return Rect::new(x0, y0, 0, 0);
        }
        Rect::new(x0, y0, (x1 - u64::from(x0)) as u32, (y1 - u64::from(y0)) as u32)
    }

    /// Whether `other` lies entirely inside `self`.
    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

/// Source decimation: keep every `x`-th column and `y`-th row, starting
/// `offset_x`/`offset_y` pixels into the source region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Subsampling {
    pub x: u32,
    pub y: u32,
    pub offset_x: u32,
    pub offset_y: u32,
}

impl Default for Subsampling {
    fn default() -> Self {
        Self::NONE
    }
}

impl Subsampling {
    /// One-to-one, no offset.
    pub const NONE: Self = Self {
        x: 1,
        y: 1,
        offset_x: 0,
        offset_y: 0,
    };

    pub const fn new(x: u32, y: u32) -> Self {
        Self {
            x,
            y,
            offset_x: 0,
            offset_y: 0,
        }
    }

    pub const fn with_offset(mut self, offset_x: u32, offset_y: u32) -> Self {
        self.offset_x = offset_x;
        self.offset_y = offset_y;
        self
    }

    pub fn is_identity(&self) -> bool {
        self.x == 1 && self.y == 1
    }

    /// Periods must be positive and offsets smaller than their period.
    pub(crate) fn validate(&self) -> Result<(), WbmpError> {
        if self.x == 0 || self.y == 0 {
            return Err(WbmpError::InvalidParameter(alloc::format!(
                "subsampling period must be positive, got {}x{}",
                self.x,
                self.y
            )));
        }
        if self.offset_x >= self.x || self.offset_y >= self.y {
            return Err(WbmpError::InvalidParameter(alloc::format!(
                "subsampling offset ({}, {}) must be smaller than period ({}, {})",
                self.offset_x,
                self.offset_y,
                self.x,
                self.y
            )));
        }
        Ok(())
    }

    /// Clip `requested` to `bounds`, then shift by the offset.
    fn offset_region(&self, bounds: Rect, requested: Option<Rect>) -> Rect {
        let mut region = match requested {
            Some(r) => bounds.intersect(&r),
            None => bounds,
        };
        region.x = region.x.saturating_add(self.offset_x);
        region.y = region.y.saturating_add(self.offset_y);
        region.width = region.width.saturating_sub(self.offset_x);
        region.height = region.height.saturating_sub(self.offset_y);
        region
    }
}

/// Resolved geometry for a decode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ReadRegions {
    /// Pixels of the stored image that are sampled.
    pub source: Rect,
    /// Where the samples land in the destination raster.
    pub dest: Rect,
}

/// Compute source and destination regions for a decode.
///
/// `dest_size` is the size of a caller-supplied destination raster; the
/// destination region is clipped to it and the source region shrunk to
/// match.
pub(crate) fn read_regions(
    width: u32,
    height: u32,
    requested: Option<Rect>,
    sub: &Subsampling,
    dest_offset: (u32, u32),
    dest_size: Option<(u32, u32)>,
) -> Result<ReadRegions, WbmpError> {
    sub.validate()?;
    let mut source = sub.offset_region(Rect::from_size(width, height), requested);
    let sub_w = source.width.div_ceil(sub.x);
    let sub_h = source.height.div_ceil(sub.y);
    let mut dest = Rect::new(dest_offset.0, dest_offset.1, sub_w, sub_h);

    if let Some((dw, dh)) = dest_size {
        let clipped = dest.intersect(&Rect::from_size(dw, dh));
        if clipped.is_empty() {
            return Err(WbmpError::EmptyRegion);
        }
        let over_x = dest.right().saturating_sub(u64::from(dw));
        let over_y = dest.bottom().saturating_sub(u64::from(dh));
        let trim_w = over_x.saturating_mul(u64::from(sub.x));
        let trim_h = over_y.saturating_mul(u64::from(sub.y));
        source.width = (u64::from(source.width).saturating_sub(trim_w)) as u32;
        source.height = (u64::from(source.height).saturating_sub(trim_h)) as u32;
        dest = clipped;
    }

    if source.is_empty() || dest.is_empty() {
        return Err(WbmpError::EmptyRegion);
    }
    log::trace!("read regions: source {source:?} -> dest {dest:?}");
    Ok(ReadRegions { source, dest })
}

/// Resolved geometry for an encode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct WriteRegion {
    /// Pixels of the input raster that are sampled.
    pub source: Rect,
    pub out_width: u32,
    pub out_height: u32,
}

impl WriteRegion {
    /// Whether the output is exactly the input raster.
    pub(crate) fn is_whole(&self, width: u32, height: u32, sub: &Subsampling) -> bool {
        sub.is_identity() && self.source == Rect::from_size(width, height)
    }
}

/// Compute the sampled region and output size for an encode.
pub(crate) fn write_region(
    width: u32,
    height: u32,
    requested: Option<Rect>,
    sub: &Subsampling,
) -> Result<WriteRegion, WbmpError> {
    sub.validate()?;
    let source = sub.offset_region(Rect::from_size(width, height), requested);
    if source.is_empty() {
        return Err(WbmpError::EmptyRegion);
    }
    let region = WriteRegion {
        source,
        out_width: source.width.div_ceil(sub.x),
        out_height: source.height.div_ceil(sub.y),
    };
    log::trace!("write region: {region:?}");
    Ok(region)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersect_disjoint_is_empty() {
        let a = Rect::new(0, 0, 4, 4);
        let b = Rect::new(10, 10, 2, 2);
        assert!(a.intersect(&b).is_empty());
        assert_eq!(
            a.intersect(&Rect::new(2, 1, 10, 2)),
            Rect::new(2, 1, 2, 2)
        );
    }

    #[test]
    fn full_read_is_identity() {
        let r = read_regions(13, 7, None, &Subsampling::NONE, (0, 0), None).unwrap();
        assert_eq!(r.source, Rect::from_size(13, 7));
        assert_eq!(r.dest, Rect::from_size(13, 7));
    }

    #[test]
    fn subsampled_read_rounds_up() {
        let r = read_regions(10, 9, None, &Subsampling::new(3, 2), (0, 0), None).unwrap();
        assert_eq!(r.dest, Rect::from_size(4, 5));
    }

    #[test]
    fn offset_shrinks_region() {
        let sub = Subsampling::new(2, 2).with_offset(1, 1);
        let r = read_regions(8, 8, None, &sub, (0, 0), None).unwrap();
        assert_eq!(r.source, Rect::new(1, 1, 7, 7));
        assert_eq!(r.dest, Rect::from_size(4, 4));
    }

    #[test]
    fn destination_clip_trims_source() {
        let r = read_regions(10, 10, None, &Subsampling::new(3, 1), (0, 0), Some((2, 10)))
            .unwrap();
        assert_eq!(r.dest, Rect::from_size(2, 10));
        assert_eq!(r.source.width, 4);
        assert_eq!(r.source.width.div_ceil(3), r.dest.width);
    }

    #[test]
    fn destination_offset_outside_is_empty() {
        let err = read_regions(4, 4, None, &Subsampling::NONE, (8, 0), Some((4, 4)));
        assert!(matches!(err, Err(WbmpError::EmptyRegion)));
    }

    #[test]
    fn region_outside_image_is_empty() {
        let err = write_region(4, 4, Some(Rect::new(5, 5, 2, 2)), &Subsampling::NONE);
        assert!(matches!(err, Err(WbmpError::EmptyRegion)));
    }

    #[test]
    fn invalid_subsampling() {
        assert!(matches!(
            write_region(4, 4, None, &Subsampling::new(0, 1)),
            Err(WbmpError::InvalidParameter(_))
        ));
        assert!(matches!(
            write_region(4, 4, None, &Subsampling::new(2, 2).with_offset(2, 0)),
            Err(WbmpError::InvalidParameter(_))
        ));
    }

    #[test]
    fn write_region_clips_and_decimates() {
        let w = write_region(9, 5, Some(Rect::new(1, 0, 100, 100)), &Subsampling::new(2, 2))
            .unwrap();
        assert_eq!(w.source, Rect::new(1, 0, 8, 5));
        assert_eq!((w.out_width, w.out_height), (4, 3));
        assert!(!w.is_whole(9, 5, &Subsampling::new(2, 2)));
    }
}
