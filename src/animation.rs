//! Multi-frame encoding.
//!
//! The output of [`encode_animation`] is frame-major: every frame's packed
//! bytes are contiguous, of identical length, and appear in frame order.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::codecs::gif::GifDecoder;
use image::AnimationDecoder;

use crate::bitmap::{size_advisory, DecodedBitmap, Resize};
use crate::codec::{self, packed_len, EncodedBuffer};
use crate::error::EncodeError;
use crate::format::PixelFormat;

/// A provider of decoded frames keyed by index.
pub trait AnimationSource {
    /// Number of frames; at least 1 for a well-formed source.
    fn frame_count(&self) -> usize;

    /// Decode frame `index`, `0 <= index < frame_count()`.
    fn frame(&mut self, index: usize) -> Result<DecodedBitmap, EncodeError>;
}

/// Frames already decoded into memory.
#[derive(Clone, Debug, Default)]
pub struct FrameSequence {
    frames: Vec<DecodedBitmap>,
}

impl FrameSequence {
    /// Wrap decoded frames, in display order.
    #[must_use]
    pub fn new(frames: Vec<DecodedBitmap>) -> Self {
        Self { frames }
    }

    /// A one-frame animation.
    #[must_use]
    pub fn single(frame: DecodedBitmap) -> Self {
        Self::new(vec![frame])
    }
}

impl AnimationSource for FrameSequence {
    fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn frame(&mut self, index: usize) -> Result<DecodedBitmap, EncodeError> {
        self.frames
            .get(index)
            .cloned()
            .ok_or(EncodeError::FrameOutOfRange {
                index,
                frame_count: self.frames.len(),
            })
    }
}

/// Frames of an animated GIF, composited to the full logical screen.
pub struct GifSource {
    path: PathBuf,
    frames: FrameSequence,
}

impl GifSource {
    /// Decode every frame of the GIF at `path`.
    pub fn open(path: &Path) -> Result<Self, EncodeError> {
        let bytes = std::fs::read(path).map_err(|e| EncodeError::decode(path, e))?;
        Self::from_bytes(path, &bytes)
    }

    /// Decode every frame of an in-memory GIF. `path` is only used in errors.
    pub fn from_bytes(path: &Path, bytes: &[u8]) -> Result<Self, EncodeError> {
        let decoder =
            GifDecoder::new(Cursor::new(bytes)).map_err(|e| EncodeError::decode(path, e))?;
        let frames = decoder
            .into_frames()
            .collect_frames()
            .map_err(|e| EncodeError::decode(path, e))?;
        if frames.is_empty() {
            return Err(EncodeError::decode(path, "no frames"));
        }

        let frames = frames
            .into_iter()
            .map(|frame| DecodedBitmap::new(frame.into_buffer()))
            .collect();
        Ok(Self {
            path: path.to_path_buf(),
            frames: FrameSequence::new(frames),
        })
    }
}

impl AnimationSource for GifSource {
    fn frame_count(&self) -> usize {
        self.frames.frame_count()
    }

    fn frame(&mut self, index: usize) -> Result<DecodedBitmap, EncodeError> {
        self.frames
            .frame(index)
            .map_err(|_| EncodeError::decode(&self.path, format!("no frame {index}")))
    }
}

/// Encoded frames plus the frame count they were produced from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedAnimation {
    /// All frames back to back; `width`/`height` describe a single frame.
    pub buffer: EncodedBuffer,
    /// Number of frames in `buffer`.
    pub frames: usize,
}

/// Encode every frame of `source` into `format`.
///
/// The target size is derived once from frame 0 (fitted into `resize` when
/// given) and every frame is resampled to it. A frame whose shape then
/// disagrees fails the whole call; no partial buffer is returned.
#[tracing::instrument(level = "debug", skip(source))]
pub fn encode_animation<S>(
    source: &mut S,
    format: PixelFormat,
    resize: Option<Resize>,
) -> Result<EncodedAnimation, EncodeError>
where
    S: AnimationSource + ?Sized,
{
    let frame_count = source.frame_count();
    if frame_count == 0 {
        return Err(EncodeError::EmptyAnimation);
    }

    let first = source.frame(0)?;
    let (native_w, native_h) = (first.width(), first.height());
    if let Some(advisory) = size_advisory(native_w, native_h, resize) {
        tracing::warn!("{advisory}");
    }
    let (width, height) = match resize {
        Some(bounds) => bounds.fit(native_w, native_h),
        None => (native_w, native_h),
    };

    let mut next = Some(first);
    let frame_len = packed_len(format, width, height);
    let mut bytes = Vec::with_capacity(frame_len * frame_count);
    for index in 0..frame_count {
        let frame = match next.take() {
            Some(frame) => frame,
            None => source.frame(index)?,
        };
        let frame = if resize.is_some() {
            frame.resized(width, height)
        } else {
            frame
        };
        if (frame.width(), frame.height()) != (width, height) {
            return Err(EncodeError::FrameShapeMismatch {
                frame: index,
                expected: (width, height),
                actual: (frame.width(), frame.height()),
            });
        }

        let encoded = codec::encode(&frame, format);
        tracing::debug!(frame = index, bytes = encoded.len(), "encoded frame");
        bytes.extend_from_slice(&encoded.bytes);
    }

    Ok(EncodedAnimation {
        buffer: EncodedBuffer {
            bytes,
            width,
            height,
        },
        frames: frame_count,
    })
}
