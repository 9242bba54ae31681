use std::sync::atomic::{AtomicUsize, Ordering};

use enough::Unstoppable;
use zenwbmp::*;

/// Allows `allowed` checks, then reports cancellation.
struct StopAfter {
    checks: AtomicUsize,
    allowed: usize,
}

impl StopAfter {
    fn new(allowed: usize) -> Self {
        Self {
            checks: AtomicUsize::new(0),
            allowed,
        }
    }
}

impl Stop for StopAfter {
    fn check(&self) -> Result<(), StopReason> {
        if self.checks.fetch_add(1, Ordering::SeqCst) >= self.allowed {
            Err(StopReason::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Bilevel raster with no packed storage: set on the main diagonal.
struct Diagonal(u32);

impl Raster for Diagonal {
    fn width(&self) -> u32 {
        self.0
    }
    fn height(&self) -> u32 {
        self.0
    }
    fn layout(&self) -> SampleLayout {
        SampleLayout::BILEVEL
    }
    fn sample(&self, x: u32, y: u32, _band: u32) -> u32 {
        u32::from(x == y)
    }
}

/// 8-bit gray ramp.
struct Gray8(u32, u32);

impl Raster for Gray8 {
    fn width(&self) -> u32 {
        self.0
    }
    fn height(&self) -> u32 {
        self.1
    }
    fn layout(&self) -> SampleLayout {
        SampleLayout {
            bands: 1,
            bits_per_sample: 8,
            storage: SampleStorage::U8,
        }
    }
    fn sample(&self, x: u32, _y: u32, _band: u32) -> u32 {
        x * 16 % 256
    }
}

fn diagonal_raster(n: u32) -> BitRaster {
    let mut r = BitRaster::new(n, n).unwrap();
    for i in 0..n {
        r.set(i, i, true);
    }
    r
}

#[test]
fn white_first_palette_complements_pixels() {
    let raster = diagonal_raster(5);
    let plain = encode(&raster, Unstoppable).unwrap();
    let palette = [[255, 255, 255], [0, 0, 0]];
    let inverted = encode_image(
        &SourceImage::indexed(&raster, &palette),
        &EncodeOptions::default(),
        Unstoppable,
    )
    .unwrap();

    assert_eq!(plain.len(), inverted.len());
    assert_eq!(plain[..4], inverted[..4]);
    for (a, b) in plain[4..].iter().zip(&inverted[4..]) {
        assert_eq!(*b, !*a);
    }
}

#[test]
fn complement_covers_padding_bits() {
    let mut raster = BitRaster::new(3, 1).unwrap();
    raster.set(0, 0, true);
    let palette = [[255, 255, 255], [0, 0, 0]];
    let plain = encode(&raster, Unstoppable).unwrap();
    let inverted = encode_image(
        &SourceImage::indexed(&raster, &palette),
        &EncodeOptions::default(),
        Unstoppable,
    )
    .unwrap();
    assert_eq!(plain[4], 0b1000_0000);
    assert_eq!(inverted[4], 0b0111_1111);

    // Padding is ignored on the way back in.
    let decoded = decode(&inverted, Unstoppable).unwrap();
    assert_eq!(decoded.raster.row(0), &[0b0110_0000]);
}

#[test]
fn black_first_palette_is_not_inverted() {
    let raster = diagonal_raster(9);
    let palette = [[0, 0, 0], [255, 255, 255]];
    let a = encode(&raster, Unstoppable).unwrap();
    let b = encode_image(
        &SourceImage::indexed(&raster, &palette),
        &EncodeOptions::default(),
        Unstoppable,
    )
    .unwrap();
    assert_eq!(a, b);
}

#[test]
fn polarity_override_wins() {
    let raster = diagonal_raster(6);
    let palette = [[250, 250, 250], [10, 10, 10]];
    let image = SourceImage::indexed(&raster, &palette);
    let as_is = EncodeOptions::new().with_polarity(Polarity::BlackIsZero);
    assert_eq!(
        encode_image(&image, &as_is, Unstoppable).unwrap(),
        encode(&raster, Unstoppable).unwrap()
    );

    let flipped = EncodeOptions::new().with_polarity(Polarity::WhiteIsZero);
    let bytes = encode_image(&SourceImage::new(&raster), &flipped, Unstoppable).unwrap();
    let decoded = decode(&bytes, Unstoppable).unwrap();
    assert!(!decoded.raster.get(2, 2));
    assert!(decoded.raster.get(3, 2));
}

#[test]
fn unsupported_color_models_rejected() {
    let raster = diagonal_raster(4);
    let three = [[0, 0, 0], [128, 128, 128], [255, 255, 255]];
    let err = encode_image(
        &SourceImage::indexed(&raster, &three),
        &EncodeOptions::default(),
        Unstoppable,
    )
    .unwrap_err();
    assert!(matches!(err, WbmpError::UnsupportedColorModel(_)));

    let direct = SourceImage::new(&raster).with_color_model(ColorModel::Direct);
    let err = encode_image(&direct, &EncodeOptions::default(), Unstoppable).unwrap_err();
    assert!(err.is_argument_error());
}

#[test]
fn multi_bit_raster_rejected() {
    let gray = Gray8(4, 4);
    assert!(!can_encode(&gray));
    assert!(can_encode(&diagonal_raster(2)));

    let mut writer = WbmpWriter::with_output(Vec::new());
    let err = writer
        .write_raster(&gray, &EncodeOptions::default(), Unstoppable)
        .unwrap_err();
    assert!(matches!(err, WbmpError::UnsupportedRaster(_)));
    // Nothing was written.
    assert!(writer.output().unwrap().is_empty());
}

#[test]
fn sample_only_raster_is_repacked() {
    assert_eq!(
        encode(&Diagonal(11), Unstoppable).unwrap(),
        encode(&diagonal_raster(11), Unstoppable).unwrap()
    );
}

#[test]
fn empty_region_rejected() {
    let raster = diagonal_raster(4);
    let opts = EncodeOptions::new().with_source_region(Rect::new(4, 0, 2, 2));
    let err = encode_image(&SourceImage::new(&raster), &opts, Unstoppable).unwrap_err();
    assert!(matches!(err, WbmpError::EmptyRegion));

    let opts = EncodeOptions::new().with_subsampling(2, 2).with_subsampling_offset(2, 0);
    let err = encode_image(&SourceImage::new(&raster), &opts, Unstoppable).unwrap_err();
    assert!(matches!(err, WbmpError::InvalidParameter(_)));
}

#[test]
fn unbound_writer_is_state_error() {
    let mut writer: WbmpWriter<Vec<u8>> = WbmpWriter::new();
    let err = writer
        .write_raster(&diagonal_raster(2), &EncodeOptions::default(), Unstoppable)
        .unwrap_err();
    assert!(matches!(err, WbmpError::NoOutput));
    assert!(err.is_state_error());

    writer.set_output(Vec::new());
    assert!(
        writer
            .write_raster(&diagonal_raster(2), &EncodeOptions::default(), Unstoppable)
            .unwrap()
            .is_complete()
    );
    assert_eq!(writer.take_output().unwrap(), [0, 0, 2, 2, 0b1000_0000, 0b0100_0000]);
    assert!(writer.output().is_none());
}

#[test]
fn stop_leaves_header_and_finished_rows() {
    // Padded stride forces the row-by-row path.
    let mut raster = BitRaster::with_stride(8, 5, 2).unwrap();
    for y in 0..5 {
        raster.set(y, y, true);
    }
    let mut writer = WbmpWriter::with_output(Vec::new());
    let mut events = Vec::new();
    let done = writer
        .write_raster_with_progress(
            &raster,
            &EncodeOptions::default(),
            StopAfter::new(2),
            &mut |e| events.push(e),
        )
        .unwrap();
    assert!(done.is_aborted());
    assert_eq!(
        writer.output().unwrap().as_slice(),
        &[0, 0, 8, 5, 0b1000_0000, 0b0100_0000]
    );
    assert_eq!(events.first(), Some(&ProgressEvent::Started));
    assert_eq!(events.last(), Some(&ProgressEvent::Aborted));
}

#[test]
fn stop_during_resample_writes_nothing() {
    let mut writer = WbmpWriter::with_output(Vec::new());
    let opts = EncodeOptions::new().with_subsampling(2, 2);
    let done = writer
        .write_raster(&diagonal_raster(8), &opts, StopAfter::new(0))
        .unwrap();
    assert!(done.is_aborted());
    assert!(writer.output().unwrap().is_empty());
}

#[test]
fn one_shot_encode_reports_cancel() {
    let err = encode(&diagonal_raster(3), StopAfter::new(0)).unwrap_err();
    assert!(err.is_cancelled());
}

#[test]
fn progress_is_monotonic() {
    let raster = diagonal_raster(10);
    let palette = [[255, 255, 255], [0, 0, 0]];
    let mut writer = WbmpWriter::with_output(Vec::new());
    let mut percents = Vec::new();
    let mut last = None;
    writer
        .write_with_progress(
            &SourceImage::indexed(&raster, &palette),
            &EncodeOptions::default(),
            Unstoppable,
            &mut |e| {
                if let ProgressEvent::Percent(p) = e {
                    percents.push(p);
                }
                last = Some(e);
            },
        )
        .unwrap();
    assert_eq!(percents.len(), 10);
    assert!(percents.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(percents.last(), Some(&100.0));
    assert_eq!(last, Some(ProgressEvent::Completed));
}

#[test]
fn writer_is_reusable() {
    let mut writer = WbmpWriter::with_output(Vec::new());
    writer
        .write_raster(&diagonal_raster(3), &EncodeOptions::default(), Unstoppable)
        .unwrap();
    let first = writer.take_output().unwrap();
    writer.set_output(Vec::new());
    writer
        .write_raster(&diagonal_raster(3), &EncodeOptions::default(), Unstoppable)
        .unwrap();
    assert_eq!(writer.into_output().unwrap(), first);
}
