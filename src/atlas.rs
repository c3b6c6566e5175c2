//! Packing of glyph coverage masks into a single font atlas buffer.

use serde::Serialize;

use crate::error::EncodeError;
use crate::glyph::{GlyphRasterizer, LineMetrics};

/// Characters rasterized when a font job names none.
pub const DEFAULT_GLYPHS: &str =
    " !\"%()+=,-.:/0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz\u{b0}";

/// Point size used when a font job names none.
pub const DEFAULT_FONT_SIZE: u32 = 20;

/// Placement of one glyph inside a [`GlyphAtlas`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GlyphAtlasEntry {
    /// Character the entry was rasterized from.
    pub glyph: char,
    /// Horizontal bearing.
    pub offset_x: i32,
    /// Vertical bearing.
    pub offset_y: i32,
    /// Mask width.
    pub width: u32,
    /// Mask height.
    pub height: u32,
    /// Offset of the first mask element in [`GlyphAtlas::data`].
    pub start: usize,
}

impl GlyphAtlasEntry {
    /// Number of elements the mask occupies in the atlas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Whether the glyph has no mask data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Offset one past the last mask element.
    #[must_use]
    pub fn end(&self) -> usize {
        self.start + self.len()
    }
}

/// Glyph table plus the shared coverage buffer it indexes into.
#[derive(Clone, Debug, PartialEq)]
pub struct GlyphAtlas {
    /// One entry per requested character, in request order.
    pub entries: Vec<GlyphAtlasEntry>,
    /// Masks back to back, one element per pixel: 1 for ink, 0 otherwise.
    pub data: Vec<u8>,
    /// Point size the glyphs were rasterized at.
    pub point_size: f32,
    /// Line metrics at `point_size`.
    pub metrics: LineMetrics,
}

/// Rasterize `chars` in order and pack their masks into one atlas.
///
/// Repeated characters get independent entries. A character the font lacks
/// fails the whole build.
// TODO: bit-pack masks like PixelFormat::Binary once the display runtime can read them.
#[tracing::instrument(level = "debug", skip(rasterizer, chars))]
pub fn build_font_atlas<R, I>(
    rasterizer: &R,
    point_size: f32,
    chars: I,
) -> Result<GlyphAtlas, EncodeError>
where
    R: GlyphRasterizer + ?Sized,
    I: IntoIterator<Item = char>,
{
    let mut entries = Vec::new();
    let mut data = Vec::new();

    for ch in chars {
        let glyph = rasterizer.rasterize(ch, point_size)?;
        let start = data.len();
        data.extend(glyph.coverage.iter().map(|&ink| u8::from(ink)));
        tracing::debug!(
            glyph = %ch,
            start,
            width = glyph.width,
            height = glyph.height,
            "packed glyph"
        );

        entries.push(GlyphAtlasEntry {
            glyph: ch,
            offset_x: glyph.offset_x,
            offset_y: glyph.offset_y,
            width: glyph.width,
            height: glyph.height,
            start,
        });
    }

    Ok(GlyphAtlas {
        entries,
        data,
        point_size,
        metrics: rasterizer.line_metrics(point_size),
    })
}
