//! Encoders that turn images, animations and TrueType glyphs into the packed
//! pixel buffers an embedded display runtime draws from, plus the batch
//! driver that writes them out as a JSON asset library.
//!
//! # Usage
//! ## Still images
//! ```
//! use display_assets::{encode, DecodedBitmap, PixelFormat};
//!
//! let bitmap = DecodedBitmap::from_rgb(
//!     2,
//!     2,
//!     &[[0, 0, 0], [255, 255, 255], [255, 255, 255], [0, 0, 0]],
//! )
//! .unwrap();
//!
//! assert_eq!(encode(&bitmap, PixelFormat::Grayscale).bytes, [0, 255, 255, 0]);
//! assert_eq!(
//!     encode(&bitmap, PixelFormat::Rgb565).bytes,
//!     [0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00]
//! );
//! ```
//!
//! ## Animations
//! ```
//! use display_assets::{encode_animation, DecodedBitmap, FrameSequence, PixelFormat};
//!
//! let frame = |v| DecodedBitmap::from_rgb(9, 1, &[[v, v, v]; 9]).unwrap();
//! let mut source = FrameSequence::new(vec![frame(255), frame(0)]);
//!
//! let animation = encode_animation(&mut source, PixelFormat::Binary, None).unwrap();
//! assert_eq!(animation.frames, 2);
//! // Rows are padded to whole bytes; white pixels set their bit.
//! assert_eq!(animation.buffer.bytes, [0xFF, 0x80, 0x00, 0x00]);
//! ```
//!
//! ## Asset libraries
//! ```no_run
//! # fn build() -> Result<(), display_assets::BuildError> {
//! use std::path::Path;
//!
//! let catalog = Path::new("config/catalog.ron");
//! let builder = display_assets::LibraryBuilder::from_catalog_file(catalog)?;
//! let report = builder.build()?;
//! for failure in &report.failures {
//!     eprintln!("{}: {}", failure.path.display(), failure.error);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::pedantic)]

pub mod animation;
pub mod asset;
pub mod atlas;
pub mod bitmap;
pub mod catalog;
pub mod codec;
mod error;
pub mod format;
pub mod glyph;
pub mod library;

pub use animation::{
    encode_animation, AnimationSource, EncodedAnimation, FrameSequence, GifSource,
};
pub use asset::{AssetRecord, DataEncoding, PayloadKind};
pub use atlas::{build_font_atlas, GlyphAtlas, GlyphAtlasEntry};
pub use bitmap::{DecodedBitmap, Resize, SizeAdvisory};
pub use catalog::Catalog;
pub use codec::{encode, encode_image, EncodedBuffer};
pub use error::{BuildError, EncodeError};
pub use format::PixelFormat;
pub use glyph::{Glyph, GlyphRasterizer, LineMetrics, RusttypeRasterizer};
pub use library::{BuildReport, LibraryBuilder};
