#![no_main]
use libfuzzer_sys::fuzz_target;
use zenwbmp::*;

fuzz_target!(|data: &[u8]| {
    // Bound allocations; headers can claim huge dimensions cheaply.
    let limits = Limits::none().with_max_pixels(1 << 24);

    // Whole-image decode must never panic
    let _ = decode_with(data, DecodeOptions::default(), Some(&limits), enough::Unstoppable);

    // Header-only paths
    let _ = probe(data);
    let _ = can_decode(data);

    // Drive the row loop with parameters taken from the input itself
    if let [a, b, c, d, ..] = *data {
        let opts = DecodeOptions::new()
            .with_source_region(Rect::new(u32::from(a), u32::from(b), 64, 64))
            .with_subsampling(u32::from(c % 5), u32::from(d % 5))
            .with_subsampling_offset(u32::from(c % 3), u32::from(d % 3));
        let _ = decode_with(data, opts, Some(&limits), enough::Unstoppable);
    }
});
