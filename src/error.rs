use alloc::string::String;
use enough::StopReason;

/// Errors from WBMP decoding and encoding.
///
/// Variants fall into four classes: format (bad header bytes), I/O (the
/// underlying stream failed or ended early), argument (bad request or
/// unsupported input) and state (nothing bound to read from / write to).
/// The `is_*` predicates classify a value.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum WbmpError {
    #[error("unsupported WBMP type field: {0}")]
    UnsupportedType(u8),

    #[error("invalid WBMP fixed header field: {0:#04x}")]
    InvalidFixHeader(u8),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("input ended inside the WBMP header")]
    TruncatedHeader,

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[cfg(feature = "std")]
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid image index {0} (WBMP streams hold exactly one image)")]
    InvalidImageIndex(usize),

    #[error("unsupported raster layout: {0}")]
    UnsupportedRaster(String),

    #[error("unsupported color model: {0}")]
    UnsupportedColorModel(String),

    #[error("empty region after clipping")]
    EmptyRegion,

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("dimensions too large: {width}x{height}")]
    DimensionsTooLarge { width: u32, height: u32 },

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },

    #[error("no input source bound")]
    NoInput,

    #[error("no output sink bound")]
    NoOutput,

    /// Only from one-shot helpers; stateful readers and writers report a
    /// stop through [`crate::Completion`] instead.
    #[error("operation cancelled")]
    Cancelled(StopReason),
}

impl From<StopReason> for WbmpError {
    fn from(r: StopReason) -> Self {
        WbmpError::Cancelled(r)
    }
}

impl WbmpError {
    /// Malformed or unsupported header content.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedType(_)
                | Self::InvalidFixHeader(_)
                | Self::InvalidHeader(_)
                | Self::TruncatedHeader
        )
    }

    /// Failure of the underlying stream, including early end of pixel data.
    pub fn is_io_error(&self) -> bool {
        match self {
            Self::UnexpectedEof => true,
            #[cfg(feature = "std")]
            Self::Io(_) => true,
            _ => false,
        }
    }

    /// Bad request parameters or unsupported input.
    pub fn is_argument_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidImageIndex(_)
                | Self::UnsupportedRaster(_)
                | Self::UnsupportedColorModel(_)
                | Self::EmptyRegion
                | Self::InvalidParameter(_)
                | Self::DimensionsTooLarge { .. }
                | Self::LimitExceeded(_)
                | Self::BufferTooSmall { .. }
        )
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Operation attempted before a source or sink was bound.
    pub fn is_state_error(&self) -> bool {
        matches!(self, Self::NoInput | Self::NoOutput)
    }
}
