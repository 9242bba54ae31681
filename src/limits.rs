use crate::WbmpError;
use crate::raster::bytes_per_row;

/// Resource limits for decode operations.
///
/// All fields default to `None` (no limit). WBMP has no compression, so
/// a header alone can announce a raster far larger than the stream that
/// follows it; set limits when decoding untrusted input.
#[derive(Clone, Debug, Default)]
pub struct Limits {
    pub max_width: Option<u64>,
    pub max_height: Option<u64>,
    /// Maximum pixel count (width * height).
    pub max_pixels: Option<u64>,
    /// Maximum bytes for the packed output raster.
    pub max_memory_bytes: Option<u64>,
}

impl Limits {
    /// No limits at all.
    pub const fn none() -> Self {
        Self {
            max_width: None,
            max_height: None,
            max_pixels: None,
            max_memory_bytes: None,
        }
    }

    pub fn with_max_dimensions(mut self, width: u64, height: u64) -> Self {
        self.max_width = Some(width);
        self.max_height = Some(height);
        self
    }

    pub fn with_max_pixels(mut self, pixels: u64) -> Self {
        self.max_pixels = Some(pixels);
        self
    }

    pub fn with_max_memory(mut self, bytes: u64) -> Self {
        self.max_memory_bytes = Some(bytes);
        self
    }

    /// Check announced dimensions and the packed raster they imply.
    pub(crate) fn check(&self, width: u32, height: u32) -> Result<(), WbmpError> {
        let exceeded = |what: &str, value: u64, max: u64| {
            WbmpError::LimitExceeded(alloc::format!("{what} {value} exceeds limit {max}"))
        };
        if let Some(max_w) = self.max_width.filter(|&m| u64::from(width) > m) {
            return Err(exceeded("width", u64::from(width), max_w));
        }
        if let Some(max_h) = self.max_height.filter(|&m| u64::from(height) > m) {
            return Err(exceeded("height", u64::from(height), max_h));
        }
        let pixels = u64::from(width) * u64::from(height);
        if let Some(max_px) = self.max_pixels.filter(|&m| pixels > m) {
            return Err(exceeded("pixel count", pixels, max_px));
        }
        let packed = bytes_per_row(width) as u64 * u64::from(height);
        self.check_memory(packed)
    }

    /// Check a raster allocation against the memory limit.
    pub(crate) fn check_memory(&self, bytes: u64) -> Result<(), WbmpError> {
        match self.max_memory_bytes {
            Some(max_mem) if bytes > max_mem => Err(WbmpError::LimitExceeded(alloc::format!(
                "allocation {bytes} bytes exceeds memory limit {max_mem}"
            ))),
            _ => Ok(()),
        }
    }
}
