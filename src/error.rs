use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single encoding job.
///
/// Every variant is fatal to the one asset being encoded and to nothing else;
/// the batch driver records it and carries on with the remaining jobs.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The source file could not be read or was not recognized by the decoder.
    #[error("failed to decode {}: {reason}", .path.display())]
    Decode {
        /// File that failed to decode.
        path: PathBuf,
        /// Decoder-provided description.
        reason: String,
    },
    /// The requested pixel format is not one of the supported formats.
    #[error("unsupported pixel format: {0}")]
    UnsupportedFormat(String),
    /// An animation frame does not have the shape derived from frame 0.
    #[error(
        "frame {frame} is {}x{}, expected {}x{}",
        .actual.0, .actual.1, .expected.0, .expected.1
    )]
    FrameShapeMismatch {
        /// Zero-based index of the offending frame.
        frame: usize,
        /// Width and height derived from frame 0 and the resize target.
        expected: (u32, u32),
        /// Width and height of the offending frame.
        actual: (u32, u32),
    },
    /// A frame index past the end of an animation source was requested.
    #[error("frame {index} requested from a source of {frame_count} frames")]
    FrameOutOfRange {
        /// Requested index.
        index: usize,
        /// Frames the source holds.
        frame_count: usize,
    },
    /// An animation source yielded no frames.
    #[error("animation has no frames")]
    EmptyAnimation,
    /// The font has no glyph for a requested character.
    #[error("no glyph for character {0:?} in font")]
    GlyphNotFound(char),
    /// Error raised by the `image` crate while resizing or re-encoding.
    #[error(transparent)]
    Image(#[from] image::ImageError),
    /// I/O error outside of decoding a single source, such as a failed
    /// directory walk while expanding an include pattern.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EncodeError {
    /// Build an [`EncodeError::Decode`] value.
    pub fn decode(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Decode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Failure of a whole library build: the catalog could not be loaded or an
/// output file could not be written.
#[derive(Debug, Error)]
pub enum BuildError {
    /// I/O error while reading the catalog or writing outputs.
    #[error("{context}: {source}")]
    Io {
        /// What was being done when the error occurred.
        context: String,
        /// Underlying error.
        source: std::io::Error,
    },
    /// RON catalog parse error.
    #[error("failed to parse catalog: {0}")]
    Ron(#[from] ron::error::SpannedError),
    /// JSON catalog parse or output serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// The catalog file extension names no supported format.
    #[error("unsupported catalog format: {} (expected .ron or .json)", .0.display())]
    CatalogFormat(PathBuf),
    /// A glob pattern in the catalog is malformed.
    #[error("invalid include pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

impl BuildError {
    pub(crate) fn io(context: impl Into<String>) -> impl FnOnce(std::io::Error) -> Self {
        let context = context.into();
        move |source| Self::Io { context, source }
    }
}
