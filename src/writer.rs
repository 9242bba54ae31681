//! WBMP encoder.
//!
//! [`WbmpWriter`] writes one image per call to a bound [`ByteSink`]. The
//! input raster is validated, optionally cropped and decimated, brought
//! into canonical packed form, and written with the polarity its color
//! model implies.

use alloc::vec;
use alloc::vec::Vec;

use enough::Stop;

use crate::color::{ColorModel, Polarity};
use crate::error::WbmpError;
use crate::header::WbmpHeader;
use crate::io::ByteSink;
use crate::progress::{self, Completion, ProgressEvent, RowProgress};
use crate::raster::{BitRaster, PackedBits, Raster, bytes_per_row};
use crate::region::{self, Rect, Subsampling, WriteRegion};

/// A raster plus how its samples map to colors.
#[derive(Clone, Copy)]
pub struct SourceImage<'a> {
    pub raster: &'a dyn Raster,
    pub color_model: Option<ColorModel<'a>>,
}

impl<'a> SourceImage<'a> {
    pub fn new(raster: &'a dyn Raster) -> Self {
        Self {
            raster,
            color_model: None,
        }
    }

    pub fn with_color_model(mut self, model: ColorModel<'a>) -> Self {
        self.color_model = Some(model);
        self
    }

    /// Raster with a palette; index 0 is `palette[0]`.
    pub fn indexed(raster: &'a dyn Raster, palette: &'a [[u8; 3]]) -> Self {
        Self::new(raster).with_color_model(ColorModel::Indexed(palette))
    }
}

impl core::fmt::Debug for SourceImage<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SourceImage")
            .field("width", &self.raster.width())
            .field("height", &self.raster.height())
            .field("color_model", &self.color_model)
            .finish()
    }
}

/// Per-call encode parameters.
#[derive(Clone, Debug, Default)]
pub struct EncodeOptions {
    /// Part of the raster to write; `None` writes all of it.
    pub source_region: Option<Rect>,
    pub subsampling: Subsampling,
    /// Overrides the polarity derived from the color model.
    pub polarity: Option<Polarity>,
}

impl EncodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source_region(mut self, region: Rect) -> Self {
        self.source_region = Some(region);
        self
    }

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

    pub fn with_polarity(mut self, polarity: Polarity) -> Self {
        self.polarity = Some(polarity);
        self
    }
}

/// Whether `raster` has a layout WBMP can store.
pub fn can_encode(raster: &dyn Raster) -> bool {
    raster.layout().is_bilevel()
}

/// Stateful WBMP writer bound to at most one output at a time.
#[derive(Debug)]
pub struct WbmpWriter<K> {
    sink: Option<K>,
}

impl<K> Default for WbmpWriter<K> {
    fn default() -> Self {
        Self { sink: None }
    }
}

impl<K: ByteSink> WbmpWriter<K> {
    /// Unbound writer.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(sink: K) -> Self {
        Self { sink: Some(sink) }
    }

    pub fn set_output(&mut self, sink: K) {
        self.sink = Some(sink);
    }

    /// Unbind and return the current sink.
    pub fn take_output(&mut self) -> Option<K> {
        self.sink.take()
    }

    pub fn output(&self) -> Option<&K> {
        self.sink.as_ref()
    }

    /// Encode `image`, inverting pixels if its color model says white is zero.
    pub fn write(
        &mut self,
        image: &SourceImage<'_>,
        options: &EncodeOptions,
        stop: impl Stop,
    ) -> Result<Completion, WbmpError> {
        self.write_with_progress(image, options, stop, &mut progress::ignore)
    }

    pub fn write_with_progress(
        &mut self,
        image: &SourceImage<'_>,
        options: &EncodeOptions,
        stop: impl Stop,
        progress: &mut dyn FnMut(ProgressEvent),
    ) -> Result<Completion, WbmpError> {
        let sink = self.sink.as_mut().ok_or(WbmpError::NoOutput)?;
        let polarity = match options.polarity {
            Some(p) => p,
            None => Polarity::of(image.color_model.as_ref())?,
        };
        encode_to(sink, image.raster, options, polarity, &stop, progress)
    }

    /// Encode a bare raster; samples are taken as black-is-zero unless
    /// `options.polarity` says otherwise.
    pub fn write_raster(
        &mut self,
        raster: &dyn Raster,
        options: &EncodeOptions,
        stop: impl Stop,
    ) -> Result<Completion, WbmpError> {
        self.write_raster_with_progress(raster, options, stop, &mut progress::ignore)
    }

    pub fn write_raster_with_progress(
        &mut self,
        raster: &dyn Raster,
        options: &EncodeOptions,
        stop: impl Stop,
        progress: &mut dyn FnMut(ProgressEvent),
    ) -> Result<Completion, WbmpError> {
        let sink = self.sink.as_mut().ok_or(WbmpError::NoOutput)?;
        let polarity = options.polarity.unwrap_or_default();
        encode_to(sink, raster, options, polarity, &stop, progress)
    }
}

impl<K> WbmpWriter<K> {
    /// Consume the writer, returning the sink if one is bound.
    pub fn into_output(self) -> Option<K> {
        self.sink
    }
}

/// Canonical rows ready to write: borrowed from the caller or built here.
enum Prepared<'r> {
    Borrowed(PackedBits<'r>),
    Owned(BitRaster),
}

impl Prepared<'_> {
    fn bits(&self) -> PackedBits<'_> {
        match self {
            Prepared::Borrowed(bits) => *bits,
            Prepared::Owned(raster) => PackedBits::new(raster.data(), raster.stride(), 0),
        }
    }
}

/// Crop, decimate and normalize `raster` for writing.
fn prepare<'r>(
    raster: &'r dyn Raster,
    region: &WriteRegion,
    sub: &Subsampling,
    stop: &dyn Stop,
) -> Result<Prepared<'r>, WbmpError> {
    if sub.is_identity() {
        let child = raster
            .packed_bits()
            .map(|bits| bits.offset(region.source.x, region.source.y))
            .filter(|bits| bits.bit_offset() == 0);
        if let Some(bits) = child {
            return Ok(Prepared::Borrowed(bits));
        }
        log::debug!("WBMP encode: repacking raster with unaligned or missing packed storage");
    }
    resample(raster, region, sub, stop).map(Prepared::Owned)
}

/// Pick every `sub.x`-th column and `sub.y`-th row of the region into a
/// fresh packed raster.
fn resample(
    raster: &dyn Raster,
    region: &WriteRegion,
    sub: &Subsampling,
    stop: &dyn Stop,
) -> Result<BitRaster, WbmpError> {
    let mut out = BitRaster::new(region.out_width, region.out_height)?;
    let src = region.source;
    for j in 0..region.out_height {
        if j % 16 == 0 {
            if let Some(reason) = progress::poll(stop) {
                return Err(WbmpError::Cancelled(reason));
            }
        }
        let y = src.y + j * sub.y;
        for i in 0..region.out_width {
            let x = src.x + i * sub.x;
            if raster.sample(x, y, 0) != 0 {
                out.set(i, j, true);
            }
        }
    }
    Ok(out)
}

fn encode_to<K: ByteSink + ?Sized>(
    sink: &mut K,
    raster: &dyn Raster,
    options: &EncodeOptions,
    polarity: Polarity,
    stop: &dyn Stop,
    callback: &mut dyn FnMut(ProgressEvent),
) -> Result<Completion, WbmpError> {
    raster.layout().validate()?;
    let sub = options.subsampling;
    let region = region::write_region(
        raster.width(),
        raster.height(),
        options.source_region,
        &sub,
    )?;
    let (width, height) = (region.out_width, region.out_height);
    if region.is_whole(raster.width(), raster.height(), &sub) {
        log::debug!("WBMP encode: {width}x{height}");
    } else {
        log::debug!(
            "WBMP encode: {:?} every {}x{} -> {width}x{height}",
            region.source,
            sub.x,
            sub.y
        );
    }
    let mut progress = RowProgress::start(callback, height);

    let prepared = match prepare(raster, &region, &sub, stop) {
        Ok(prepared) => prepared,
        Err(WbmpError::Cancelled(reason)) => {
            log::debug!("WBMP encode stopped while resampling");
            sink.flush()?;
            let completion = Completion::Aborted(reason);
            progress.finish(&completion);
            return Ok(completion);
        }
        Err(e) => return Err(e),
    };
    let bits = prepared.bits();

    WbmpHeader::new(width, height).write_to(sink)?;

    let invert = polarity.inverts();
    let row_len = bytes_per_row(width);

    // Whole-buffer writes only when no row has padding bits to clear.
    let completion = if bits.stride() == row_len && !invert && width % 8 == 0 {
        write_whole(sink, bits, row_len, height, stop, &mut progress)?
    } else {
        write_rows(sink, bits, width, height, invert, stop, &mut progress)?
    };
    sink.flush()?;
    progress.finish(&completion);
    Ok(completion)
}

/// Rows are contiguous, byte-aligned and need no inversion: one write.
fn write_whole<K: ByteSink + ?Sized>(
    sink: &mut K,
    bits: PackedBits<'_>,
    row_len: usize,
    height: u32,
    stop: &dyn Stop,
    progress: &mut RowProgress<'_>,
) -> Result<Completion, WbmpError> {
    if let Some(reason) = progress::poll(stop) {
        log::debug!("WBMP encode stopped before writing pixels");
        return Ok(Completion::Aborted(reason));
    }
    let len = row_len * height as usize;
    let data = bits.data().get(..len).ok_or(WbmpError::BufferTooSmall {
        needed: len,
        actual: bits.data().len(),
    })?;
    sink.write_all(data)?;
    progress.rows_done(height);
    Ok(Completion::Complete)
}

/// Row-by-row write. Padding bits past `width` are cleared, then whole
/// bytes are inverted, so inverted output is the exact complement of the
/// plain output.
fn write_rows<K: ByteSink + ?Sized>(
    sink: &mut K,
    bits: PackedBits<'_>,
    width: u32,
    height: u32,
    invert: bool,
    stop: &dyn Stop,
    progress: &mut RowProgress<'_>,
) -> Result<Completion, WbmpError> {
    let row_len = bytes_per_row(width);
    let tail_mask = match width % 8 {
        0 => 0xFF,
        used => 0xFFu8 << (8 - used),
    };
    let mut scratch = vec![0u8; row_len];
    for y in 0..height {
        if let Some(reason) = progress::poll(stop) {
            log::debug!("WBMP encode stopped after {y} rows");
            return Ok(Completion::Aborted(reason));
        }
        let row = bits.row(y, row_len).ok_or(WbmpError::BufferTooSmall {
            needed: (y as usize) * bits.stride() + row_len,
            actual: bits.data().len(),
        })?;
        scratch.copy_from_slice(row);
        if let Some(last) = scratch.last_mut() {
            *last &= tail_mask;
        }
        if invert {
            for byte in scratch.iter_mut() {
                *byte = !*byte;
            }
        }
        sink.write_all(&scratch)?;
        progress.rows_done(y + 1);
    }
    Ok(Completion::Complete)
}

/// Encode a bare raster (black-is-zero) to an in-memory WBMP.
///
/// Returns [`WbmpError::Cancelled`] if `stop` fires.
pub fn encode(raster: &dyn Raster, stop: impl Stop) -> Result<Vec<u8>, WbmpError> {
    encode_image(&SourceImage::new(raster), &EncodeOptions::default(), stop)
}

/// Encode an image with options to an in-memory WBMP.
///
/// Returns [`WbmpError::Cancelled`] if `stop` fires.
pub fn encode_image(
    image: &SourceImage<'_>,
    options: &EncodeOptions,
    stop: impl Stop,
) -> Result<Vec<u8>, WbmpError> {
    let mut writer = WbmpWriter::with_output(Vec::new());
    match writer.write(image, options, stop)? {
        Completion::Complete => Ok(writer.into_output().unwrap_or_default()),
        Completion::Aborted(reason) => Err(WbmpError::Cancelled(reason)),
    }
}
