use thiserror::Error;

/// Errors raised while encoding or decoding a single trait group.
///
/// Every variant is local to one group: callers processing several groups
/// can log the failure and carry on with the next one.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("{what} exceeds capacity: {count} > {max}")]
    CapacityExceeded {
        what: &'static str,
        count: usize,
        max: usize,
    },

    #[error("invalid color literal '{0}' (expected 6 or 8 hex digits)")]
    InvalidColorLiteral(String),

    #[error("encoded run total {actual} does not match bounding box area {expected}")]
    BoundsInvariantViolation { expected: usize, actual: usize },

    #[error("truncated data reading {field} at offset {offset}: need {needed} bytes, {available} available")]
    TruncatedData {
        field: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("name '{0}' is longer than 255 bytes")]
    NameTooLong(String),

    #[error("invalid pixel grid: {0}")]
    InvalidGrid(String),

    #[error("trait '{0}' needs a transparent palette slot, which an RGB-only palette cannot hold")]
    TransparencyUnsupported(String),

    #[error("color {0} is missing from the palette")]
    MissingPaletteEntry(String),

    #[error("invalid palette index width {0}")]
    InvalidIndexWidth(u8),

    #[error("palette index {index} out of range for palette of {len} colors")]
    PaletteIndexOutOfRange { index: u16, len: usize },

    #[error("invalid run: {0}")]
    InvalidRun(String),

    #[error("name at offset {0} is not valid UTF-8")]
    InvalidName(usize),

    #[error("{0} trailing bytes after the last trait")]
    TrailingBytes(usize),

    #[error("failed decoding group '{group}' after {decoded_traits} traits: {source}")]
    PartialGroup {
        group: String,
        decoded_traits: usize,
        #[source]
        source: Box<CodecError>,
    },
}

impl CodecError {
    /// Strips any `PartialGroup` wrapping and returns the underlying failure.
    pub fn root_cause(&self) -> &CodecError {
        match self {
            CodecError::PartialGroup { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
