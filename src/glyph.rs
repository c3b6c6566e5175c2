//! Glyph rasterization seam and its `rusttype` implementation.

use std::path::Path;

use rusttype::{point, Font, Scale};

use crate::error::EncodeError;

/// Coverage mask of one rasterized character.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Glyph {
    /// Mask width in pixels.
    pub width: u32,
    /// Mask height in pixels.
    pub height: u32,
    /// Row-major ink flags, `width * height` long.
    pub coverage: Vec<bool>,
    /// Horizontal offset from the pen position to the mask's left edge.
    pub offset_x: i32,
    /// Vertical offset from the top of the line to the mask's top edge.
    pub offset_y: i32,
}

impl Glyph {
    /// Build a glyph. Returns `None` if `coverage` is not `width * height` long.
    #[must_use]
    pub fn new(
        width: u32,
        height: u32,
        coverage: Vec<bool>,
        offset_x: i32,
        offset_y: i32,
    ) -> Option<Self> {
        (coverage.len() == width as usize * height as usize).then_some(Self {
            width,
            height,
            coverage,
            offset_x,
            offset_y,
        })
    }

    /// A glyph without ink, such as a space.
    #[must_use]
    pub fn blank(offset_x: i32, offset_y: i32) -> Self {
        Self {
            width: 0,
            height: 0,
            coverage: Vec::new(),
            offset_x,
            offset_y,
        }
    }
}

/// Vertical metrics of a font at one size, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LineMetrics {
    /// Distance from the baseline to the top of the line.
    pub ascent: f32,
    /// Distance from the baseline to the bottom of the line, usually negative.
    pub descent: f32,
    /// Extra spacing between lines.
    pub line_gap: f32,
}

/// Turns characters of one font into coverage masks.
pub trait GlyphRasterizer {
    /// Rasterize `ch` at `point_size`.
    ///
    /// Fails with [`EncodeError::GlyphNotFound`] when the font has no glyph
    /// for `ch`.
    fn rasterize(&self, ch: char, point_size: f32) -> Result<Glyph, EncodeError>;

    /// Line metrics at `point_size`.
    fn line_metrics(&self, point_size: f32) -> LineMetrics;
}

/// [`GlyphRasterizer`] over a TrueType/OpenType font parsed by `rusttype`.
pub struct RusttypeRasterizer {
    font: Font<'static>,
}

impl RusttypeRasterizer {
    /// Load and parse the font file at `path`.
    pub fn open(path: &Path) -> Result<Self, EncodeError> {
        let font_data = std::fs::read(path).map_err(|e| EncodeError::decode(path, e))?;
        Self::from_vec(path, font_data)
    }

    /// Parse font data already in memory. `path` is only used in errors.
    pub fn from_vec(path: &Path, font_data: Vec<u8>) -> Result<Self, EncodeError> {
        let font = Font::try_from_vec(font_data)
            .ok_or_else(|| EncodeError::decode(path, "not a TrueType or OpenType font"))?;
        Ok(Self { font })
    }
}

impl GlyphRasterizer for RusttypeRasterizer {
    fn rasterize(&self, ch: char, point_size: f32) -> Result<Glyph, EncodeError> {
        let glyph = self.font.glyph(ch);
        if glyph.id().0 == 0 {
            return Err(EncodeError::GlyphNotFound(ch));
        }

        let scale = Scale::uniform(point_size);
        let ascent = self.font.v_metrics(scale).ascent.round() as i32;
        let glyph = glyph.scaled(scale).positioned(point(0.0, 0.0));
        let Some(bounding_box) = glyph.pixel_bounding_box() else {
            let left_side_bearing = glyph.unpositioned().h_metrics().left_side_bearing;
            return Ok(Glyph::blank(left_side_bearing.round() as i32, ascent));
        };

        let width = bounding_box.width() as u32;
        let height = bounding_box.height() as u32;
        let mut coverage = vec![false; width as usize * height as usize];
        glyph.draw(|x, y, v| {
            if is_ink(v) {
                coverage[(y * width + x) as usize] = true;
            }
        });

        Ok(Glyph {
            width,
            height,
            coverage,
            offset_x: bounding_box.min.x,
            offset_y: ascent + bounding_box.min.y,
        })
    }

    fn line_metrics(&self, point_size: f32) -> LineMetrics {
        let rusttype::VMetrics {
            ascent,
            descent,
            line_gap,
        } = self.font.v_metrics(Scale::uniform(point_size));
        LineMetrics {
            ascent,
            descent,
            line_gap,
        }
    }
}

/// A pixel counts as ink when more than half of it is covered.
fn is_ink(coverage: f32) -> bool {
    coverage > 0.5
}
