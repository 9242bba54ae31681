#!/usr/bin/env -S cargo +nightly -Zscript
//! Generate seed corpus files for fuzzing.
//! Run: cargo +nightly -Zscript fuzz/generate_seeds.rs

fn main() {
    use std::fs;
    let dir = "fuzz/corpus/fuzz_decode";
    fs::create_dir_all(dir).unwrap();

    // 1x1, single black pixel
    fs::write(format!("{dir}/wbmp_1x1.wbmp"), b"\x00\x00\x01\x01\x00").unwrap();

    // 3x2 with one white pixel
    fs::write(format!("{dir}/wbmp_3x2.wbmp"), b"\x00\x00\x03\x02\x40\x00").unwrap();

    // 9x2 checkerboard: rows span two bytes
    let checker = b"\x00\x00\x09\x02\xaa\x80\x55\x00";
    fs::write(format!("{dir}/wbmp_checker_9x2.wbmp"), checker).unwrap();

    // 130x1: multi-byte width (130 = 0x81 0x02)
    let mut wide = b"\x00\x00\x81\x02\x01".to_vec();
    wide.extend_from_slice(&[0xf0; 17]);
    fs::write(format!("{dir}/wbmp_wide_130x1.wbmp"), wide).unwrap();

    // 16x16 with garbage-free stripes
    let mut stripes = b"\x00\x00\x10\x10".to_vec();
    for y in 0..16u8 {
        let b = if y % 2 == 0 { 0xff } else { 0x00 };
        stripes.extend_from_slice(&[b, b]);
    }
    fs::write(format!("{dir}/wbmp_stripes_16x16.wbmp"), stripes).unwrap();

    // Truncated/malformed seeds for edge coverage
    fs::write(format!("{dir}/empty.bin"), b"").unwrap();
    fs::write(format!("{dir}/type_1.bin"), b"\x01\x00\x01\x01\x00").unwrap();
    fs::write(format!("{dir}/bad_fix.bin"), b"\x00\xff\x01\x01\x00").unwrap();
    fs::write(format!("{dir}/open_varint.bin"), b"\x00\x00\x81\x81").unwrap();
    fs::write(format!("{dir}/overlong_varint.bin"), b"\x00\x00\x80\x80\x80\x80\x80\x01\x01").unwrap();
    fs::write(format!("{dir}/zero_width.bin"), b"\x00\x00\x00\x01").unwrap();
    fs::write(format!("{dir}/short_pixels.bin"), b"\x00\x00\x10\x04\xff").unwrap();

    println!("Generated seed corpus in {dir}/");
}
