//! Polarity of bilevel samples.
//!
//! WBMP has no palette: a stored 1 is white. Callers whose rasters use
//! the opposite convention describe them with a [`ColorModel`], from
//! which the writer derives whether to invert.

use crate::error::WbmpError;

/// Palette the decoder attaches to WBMP pixels: 0 is black, 1 is white.
pub const WBMP_PALETTE: [[u8; 3]; 2] = [[0, 0, 0], [255, 255, 255]];

/// Which sample value means black.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Polarity {
    /// 0 is black, 1 is white. Written as-is.
    #[default]
    BlackIsZero,
    /// 0 is white, 1 is black. Every byte is inverted on write.
    WhiteIsZero,
}

impl Polarity {
    pub fn inverts(self) -> bool {
        self == Polarity::WhiteIsZero
    }

    /// Polarity for an optional color model; none means [`Polarity::BlackIsZero`].
    pub fn of(model: Option<&ColorModel<'_>>) -> Result<Self, WbmpError> {
        model.map_or(Ok(Polarity::BlackIsZero), ColorModel::polarity)
    }
}

/// How raster samples map to colors.
#[derive(Clone, Copy, Debug)]
pub enum ColorModel<'a> {
    /// Sample value indexes an RGB palette.
    Indexed(&'a [[u8; 3]]),
    /// Samples are color components themselves.
    Direct,
}

impl ColorModel<'_> {
    /// Derive polarity. Only two-entry palettes describe a bilevel image.
    pub fn polarity(&self) -> Result<Polarity, WbmpError> {
        match self {
            ColorModel::Indexed([zero, one]) => {
                if brightness(zero) > brightness(one) {
                    Ok(Polarity::WhiteIsZero)
                } else {
                    Ok(Polarity::BlackIsZero)
                }
            }
            ColorModel::Indexed(palette) => Err(WbmpError::UnsupportedColorModel(
                alloc::format!("indexed palette with {} entries, expected 2", palette.len()),
            )),
            ColorModel::Direct => Err(WbmpError::UnsupportedColorModel(
                "direct color cannot be written as a bilevel image".into(),
            )),
        }
    }
}

fn brightness(rgb: &[u8; 3]) -> u32 {
    rgb.iter().map(|&c| u32::from(c)).sum()
}
