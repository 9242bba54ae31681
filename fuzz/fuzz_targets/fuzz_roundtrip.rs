#![no_main]
use libfuzzer_sys::fuzz_target;
use zenwbmp::*;

fuzz_target!(|data: &[u8]| {
    // If we can decode it, re-encoding and decoding again must produce identical pixels
    let limits = Limits::none().with_max_pixels(1 << 24);
    let Ok(decoded) =
        decode_with(data, DecodeOptions::default(), Some(&limits), enough::Unstoppable)
    else {
        return;
    };

    let reencoded = encode(&decoded.raster, enough::Unstoppable)
        .expect("decoded raster failed to encode");
    let Ok(decoded2) = decode(&reencoded, enough::Unstoppable) else {
        panic!("re-encoded data failed to decode");
    };

    assert_eq!(decoded.raster, decoded2.raster, "roundtrip pixel mismatch");
    assert_eq!(decoded.width(), decoded2.width());
    assert_eq!(decoded.height(), decoded2.height());

    // Stored bytes are canonical once padding is cleared
    assert!(can_decode(&reencoded));
    assert_eq!(encode(&decoded2.raster, enough::Unstoppable).unwrap(), reencoded);
});
