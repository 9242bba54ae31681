//! WBMP decoder.
//!
//! [`WbmpReader`] reads lazily from a bound [`ByteSource`]: the header is
//! parsed on first demand and cached until a new source is bound, and
//! pixels are decoded on request with optional clipping, subsampling and
//! a caller-supplied destination raster.

use alloc::vec;
use alloc::vec::Vec;

use enough::Stop;

use crate::color::{Polarity, WBMP_PALETTE};
use crate::error::WbmpError;
use crate::expand;
use crate::header::{WbmpHeader, WbmpMetadata};
use crate::io::{ByteSource, SliceSource};
use crate::limits::Limits;
use crate::progress::{self, Completion, ProgressEvent, RowProgress};
use crate::raster::{BitRaster, bytes_per_row};
use crate::region::{self, ReadRegions, Rect, Subsampling};

/// Per-call decode parameters.
#[derive(Clone, Debug, Default)]
pub struct DecodeOptions {
    /// Part of the stored image to read; `None` reads all of it.
    pub source_region: Option<Rect>,
    pub subsampling: Subsampling,
    /// Where the first decoded pixel lands in the destination.
    pub destination_offset: (u32, u32),
    /// Raster to decode into. Decoded bits are OR-ed into it, so clear the
    /// target area first if it is reused.
    pub destination: Option<BitRaster>,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source_region(mut self, region: Rect) -> Self {
        self.source_region = Some(region);
        self
    }

    /// Keep every `x`-th column and `y`-th row.
    pub fn with_subsampling(mut self, x: u32, y: u32) -> Self {
        self.subsampling.x = x;
        self.subsampling.y = y;
        self
    }

    pub fn with_subsampling_offset(mut self, x: u32, y: u32) -> Self {
        self.subsampling.offset_x = x;
        self.subsampling.offset_y = y;
        self
    }

    pub fn with_destination_offset(mut self, x: u32, y: u32) -> Self {
        self.destination_offset = (x, y);
        self
    }

    pub fn with_destination(mut self, raster: BitRaster) -> Self {
        self.destination = Some(raster);
        self
    }
}

/// Decoded pixels without color interpretation.
#[derive(Clone, Debug)]
pub struct DecodedRaster {
    pub raster: BitRaster,
    pub completion: Completion,
}

/// Decoded pixels with the WBMP palette (0 = black, 1 = white).
#[derive(Clone, Debug)]
pub struct DecodedImage {
    pub raster: BitRaster,
    pub palette: [[u8; 3]; 2],
    pub completion: Completion,
}

impl DecodedImage {
    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    /// One gray byte per pixel: 0 for black, 255 for white.
    pub fn to_gray8(&self) -> Result<Vec<u8>, WbmpError> {
        expand::to_gray8(&self.raster, Polarity::BlackIsZero)
    }

    /// Gray pixels as an [`imgref::ImgVec`].
    #[cfg(feature = "imgref")]
    pub fn to_imgvec(&self) -> Result<imgref::ImgVec<u8>, WbmpError> {
        expand::to_imgvec(&self.raster, Polarity::BlackIsZero)
    }
}

/// Stateful WBMP reader bound to at most one input at a time.
#[derive(Debug)]
pub struct WbmpReader<S> {
    source: Option<S>,
    header: Option<WbmpHeader>,
    limits: Option<Limits>,
}

impl<S> Default for WbmpReader<S> {
    fn default() -> Self {
        Self {
            source: None,
            header: None,
            limits: None,
        }
    }
}

impl<S: ByteSource> WbmpReader<S> {
    /// Unbound reader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reader bound to `source`.
    pub fn with_input(source: S) -> Self {
        let mut reader = Self::new();
        reader.set_input(source);
        reader
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Bind a new source. Nothing is read until a query needs it; any
    /// header parsed from a previous source is forgotten.
    pub fn set_input(&mut self, source: S) {
        self.source = Some(source);
        self.header = None;
    }

    /// Unbind and return the current source.
    pub fn take_input(&mut self) -> Option<S> {
        self.header = None;
        self.source.take()
    }

    pub fn input(&self) -> Option<&S> {
        self.source.as_ref()
    }

    /// A WBMP stream holds exactly one image.
    pub fn num_images(&self) -> usize {
        1
    }

    pub fn width(&mut self, image_index: usize) -> Result<u32, WbmpError> {
        Ok(self.header_for(image_index)?.width)
    }

    pub fn height(&mut self, image_index: usize) -> Result<u32, WbmpError> {
        Ok(self.header_for(image_index)?.height)
    }

    pub fn metadata(&mut self, image_index: usize) -> Result<WbmpMetadata, WbmpError> {
        Ok(self.header_for(image_index)?.metadata())
    }

    /// Decode image `image_index` (must be 0).
    pub fn read(
        &mut self,
        image_index: usize,
        options: DecodeOptions,
        stop: impl Stop,
    ) -> Result<DecodedImage, WbmpError> {
        self.read_with_progress(image_index, options, stop, &mut progress::ignore)
    }

    pub fn read_with_progress(
        &mut self,
        image_index: usize,
        options: DecodeOptions,
        stop: impl Stop,
        progress: &mut dyn FnMut(ProgressEvent),
    ) -> Result<DecodedImage, WbmpError> {
        let DecodedRaster { raster, completion } =
            self.read_raster_with_progress(image_index, options, stop, progress)?;
        Ok(DecodedImage {
            raster,
            palette: WBMP_PALETTE,
            completion,
        })
    }

    /// Decode to a bare raster, without palette.
    pub fn read_raster(
        &mut self,
        image_index: usize,
        options: DecodeOptions,
        stop: impl Stop,
    ) -> Result<DecodedRaster, WbmpError> {
        self.read_raster_with_progress(image_index, options, stop, &mut progress::ignore)
    }

    pub fn read_raster_with_progress(
        &mut self,
        image_index: usize,
        options: DecodeOptions,
        stop: impl Stop,
        progress: &mut dyn FnMut(ProgressEvent),
    ) -> Result<DecodedRaster, WbmpError> {
        let header = self.header_for(image_index)?;
        if let Some(limits) = &self.limits {
            limits.check(header.width, header.height)?;
        }
        let source = self.source.as_mut().ok_or(WbmpError::NoInput)?;
        decode_pixels(
            source,
            &header,
            options,
            self.limits.as_ref(),
            &stop,
            progress,
        )
    }

    fn header_for(&mut self, image_index: usize) -> Result<WbmpHeader, WbmpError> {
        if image_index != 0 {
            return Err(WbmpError::InvalidImageIndex(image_index));
        }
        if let Some(header) = self.header {
            return Ok(header);
        }
        let source = self.source.as_mut().ok_or(WbmpError::NoInput)?;
        let header = WbmpHeader::read_from(source)?;
        log::debug!(
            "WBMP header: {}x{}, pixel data at byte {}",
            header.width,
            header.height,
            source.position()
        );
        self.header = Some(header);
        Ok(header)
    }
}

/// Source byte and bit, destination byte and bit, for one output column.
#[derive(Clone, Copy, Debug)]
struct ColumnMap {
    src_byte: usize,
    src_shift: u8,
    dst_byte: usize,
    dst_shift: u8,
}

fn column_maps(regions: &ReadRegions, period_x: u32) -> Vec<ColumnMap> {
    (0..regions.dest.width)
        .map(|i| {
            let x = regions.source.x as usize + i as usize * period_x as usize;
            let d = (regions.dest.x + i) as usize;
            ColumnMap {
                src_byte: x >> 3,
                src_shift: 7 - (x & 7) as u8,
                dst_byte: d >> 3,
                dst_shift: 7 - (d & 7) as u8,
            }
        })
        .collect()
}

/// Stream bytes up to and including the last sampled row.
fn pixel_bytes_needed(row_len: usize, regions: &ReadRegions, sub: &Subsampling) -> u64 {
    let last_row = u64::from(regions.source.y)
        + u64::from(regions.dest.height.saturating_sub(1)) * u64::from(sub.y);
    (row_len as u64).saturating_mul(last_row + 1)
}

fn decode_pixels<S: ByteSource + ?Sized>(
    source: &mut S,
    header: &WbmpHeader,
    options: DecodeOptions,
    limits: Option<&Limits>,
    stop: &dyn Stop,
    callback: &mut dyn FnMut(ProgressEvent),
) -> Result<DecodedRaster, WbmpError> {
    let DecodeOptions {
        source_region,
        subsampling,
        destination_offset,
        destination,
    } = options;
    let (width, height) = (header.width, header.height);
    let regions = region::read_regions(
        width,
        height,
        source_region,
        &subsampling,
        destination_offset,
        destination.as_ref().map(|d| (d.width(), d.height())),
    )?;

    let row_len = bytes_per_row(width);
    let needed = pixel_bytes_needed(row_len, &regions, &subsampling);
    if let Some(available) = source.available() {
        if available < needed {
            log::debug!("WBMP decode: {available} pixel bytes left, {needed} needed");
            return Err(WbmpError::UnexpectedEof);
        }
    }

    let supplied = destination.is_some();
    let mut raster = match destination {
        Some(raster) => raster,
        None => {
            let dest_w = u32::try_from(regions.dest.right()).map_err(|_| {
                WbmpError::InvalidParameter("destination offset overflows u32".into())
            })?;
            let dest_h = u32::try_from(regions.dest.bottom()).map_err(|_| {
                WbmpError::InvalidParameter("destination offset overflows u32".into())
            })?;
            if let Some(limits) = limits {
                limits.check_memory(bytes_per_row(dest_w) as u64 * u64::from(dest_h))?;
            }
            BitRaster::new(dest_w, dest_h)?
        }
    };

    let full = Rect::from_size(width, height);
    let mut progress = RowProgress::start(callback, regions.dest.height);

    // A supplied destination keeps its bits, so it always takes the OR-ing row loop.
    let one_to_one = !supplied
        && subsampling.is_identity()
        && regions.source == full
        && regions.dest == full
        && raster.stride() == row_len;

    let completion = if one_to_one {
        read_whole(source, &mut raster, header, stop, &mut progress)?
    } else {
        read_sampled(
            source,
            &mut raster,
            row_len,
            &regions,
            &subsampling,
            stop,
            &mut progress,
        )?
    };
    progress.finish(&completion);
    Ok(DecodedRaster { raster, completion })
}

/// One bulk read straight into the raster.
fn read_whole<S: ByteSource + ?Sized>(
    source: &mut S,
    raster: &mut BitRaster,
    header: &WbmpHeader,
    stop: &dyn Stop,
    progress: &mut RowProgress<'_>,
) -> Result<Completion, WbmpError> {
    if let Some(reason) = progress::poll(stop) {
        log::debug!("WBMP decode stopped before reading pixels");
        return Ok(Completion::Aborted(reason));
    }
    log::debug!("WBMP decode: bulk read of {} bytes", header.data_len());
    let len = header.data_len() as usize;
    source.read_exact(&mut raster.data_mut()[..len])?;
    raster.clear_padding();
    progress.rows_done(header.height);
    Ok(Completion::Complete)
}

/// Row-by-row read with clipping and decimation.
fn read_sampled<S: ByteSource + ?Sized>(
    source: &mut S,
    raster: &mut BitRaster,
    row_len: usize,
    regions: &ReadRegions,
    sub: &Subsampling,
    stop: &dyn Stop,
    progress: &mut RowProgress<'_>,
) -> Result<Completion, WbmpError> {
    log::debug!(
        "WBMP decode: sampling {:?} every {}x{} into {:?}",
        regions.source,
        sub.x,
        sub.y,
        regions.dest
    );
    let columns = column_maps(regions, sub.x);
    let stride = raster.stride();
    let skip_between = row_len as u64 * u64::from(sub.y - 1);
    let mut row = vec![0u8; row_len];

    source.skip(row_len as u64 * u64::from(regions.source.y))?;

    for j in 0..regions.dest.height {
        if let Some(reason) = progress::poll(stop) {
            log::debug!("WBMP decode stopped after {j} rows");
            return Ok(Completion::Aborted(reason));
        }
        if j > 0 && skip_between > 0 {
            source.skip(skip_between)?;
        }
        source.read_exact(&mut row)?;

        let base = (regions.dest.y + j) as usize * stride;
        let out = &mut raster.data_mut()[base..base + stride];
        for c in &columns {
            let v = (row[c.src_byte] >> c.src_shift) & 1;
            out[c.dst_byte] |= v << c.dst_shift;
        }
        progress.rows_done(j + 1);
    }
    Ok(Completion::Complete)
}

/// Decode a complete in-memory WBMP.
pub fn decode(data: &[u8], stop: impl Stop) -> Result<DecodedImage, WbmpError> {
    decode_with(data, DecodeOptions::default(), None, stop)
}

/// Decode an in-memory WBMP with options and limits.
pub fn decode_with(
    data: &[u8],
    options: DecodeOptions,
    limits: Option<&Limits>,
    stop: impl Stop,
) -> Result<DecodedImage, WbmpError> {
    let mut reader = WbmpReader::with_input(SliceSource::new(data));
    if let Some(limits) = limits {
        reader = reader.with_limits(limits.clone());
    }
    reader.read(0, options, stop)
}
