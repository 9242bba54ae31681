//! # zenwbmp
//!
//! WBMP (Wireless Application Protocol Bitmap, type 0) decoder and encoder.
//!
//! A WBMP file is two zero bytes, the width and height as base-128
//! multi-byte integers, then the pixels: one bit each, most significant
//! bit first, every row padded to a whole byte. A stored 1 is white.
//!
//! ## Reading
//!
//! [`WbmpReader`] binds to a [`ByteSource`] and reads lazily. The header is
//! parsed on the first query and cached until the next
//! [`set_input`](WbmpReader::set_input); pixels can be clipped to a source
//! region, subsampled, and decoded into a caller-supplied raster.
//!
//! ## Writing
//!
//! [`WbmpWriter`] binds to a [`ByteSink`] and encodes any [`Raster`] with
//! one band and one bit per sample. Rasters whose palette puts white at
//! index 0 are inverted on the way out, so the stored image always reads
//! back with 1 as white.
//!
//! ## Cancellation
//!
//! Pixel loops poll an [`enough::Stop`] between rows. A stopped
//! decode returns the rows read so far and a stopped encode leaves the
//! bytes written so far, both marked [`Completion::Aborted`].
//!
//! ## Non-Goals
//!
//! - WBMP types other than 0 and extension headers
//! - Color management or any conversion beyond bilevel ↔ 8-bit gray
//!
//! ## Usage
//!
//! ```
//! use zenwbmp::{BitRaster, Unstoppable, decode, encode};
//!
//! let mut raster = BitRaster::new(3, 2)?;
//! raster.set(1, 0, true);
//!
//! let bytes = encode(&raster, Unstoppable)?;
//! assert_eq!(bytes, [0x00, 0x00, 0x03, 0x02, 0b0100_0000, 0x00]);
//!
//! let decoded = decode(&bytes, Unstoppable)?;
//! assert!(decoded.completion.is_complete());
//! assert_eq!(decoded.raster, raster);
//! # Ok::<(), zenwbmp::WbmpError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

mod color;
mod error;
mod expand;
mod header;
pub mod io;
mod limits;
mod progress;
mod raster;
mod reader;
mod region;
pub mod varint;
mod writer;

// Re-exports
pub use color::{ColorModel, Polarity, WBMP_PALETTE};
pub use enough::{Stop, StopReason, Unstoppable};
pub use error::WbmpError;
#[cfg(feature = "imgref")]
pub use expand::to_imgvec;
pub use expand::{from_gray8, to_gray8};
pub use header::{WBMP_TYPE_0, WbmpHeader, WbmpMetadata, can_decode, probe};
pub use io::{ByteSink, ByteSource, SliceSource};
#[cfg(feature = "std")]
pub use io::{IoSink, IoSource};
pub use limits::Limits;
pub use progress::{Completion, ProgressEvent};
pub use raster::{
    BitRaster, BitRasterView, PackedBits, Raster, SampleLayout, SampleStorage, bytes_per_row,
};
pub use reader::{DecodeOptions, DecodedImage, DecodedRaster, WbmpReader, decode, decode_with};
pub use region::{Rect, Subsampling};
pub use writer::{EncodeOptions, SourceImage, WbmpWriter, can_encode, encode, encode_image};
