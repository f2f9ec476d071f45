use std::io;

use thiserror::Error;

/// Errors raised while decoding or repacking WillPlus engine assets.
///
/// Every variant is terminal for the file or operation it occurred in:
/// decoding is deterministic, so retrying cannot change the outcome, and no
/// partial result is ever handed back to the caller.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Bad magic, unsupported bit-depth, or a malformed archive record.
    #[error("invalid container: {0}")]
    Format(String),

    /// The file ended in the middle of a fixed-layout structure.
    #[error("unexpected end of input while reading {0}")]
    TruncatedInput(&'static str),

    /// The compressed bitstream ended in the middle of a token.
    #[error("unexpected end of compressed stream")]
    TruncatedStream,

    /// Decompressed payload length disagrees with the declared dimensions.
    #[error(
        "decompressed {actual} bytes for a {width}x{height} object at depth {depth} (expected {expected})"
    )]
    SizeMismatch {
        width: u32,
        height: u32,
        depth: u16,
        expected: usize,
        actual: usize,
    },

    /// A mask file carries a different number of objects than its base file.
    #[error("mask holds {mask} objects but base image holds {base}")]
    CountMismatch { base: usize, mask: usize },

    /// An output template that cannot tell multiple objects apart.
    #[error("output template {template:?} cannot distinguish {objects} objects (missing \"{{index}}\")")]
    Configuration { template: String, objects: usize },

    #[error("failed to encode image: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] io::Error),
}
