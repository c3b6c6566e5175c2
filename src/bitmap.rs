//! Decoded RGBA rasters and the fit-within-bounds resize rule.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::EncodeError;

/// Larger dimension above which an unresized source triggers a [`SizeAdvisory`].
pub const SIZE_ADVISORY_LIMIT: u32 = 500;

/// A decoded, row-major RGBA raster.
///
/// Codecs only read from it; resizing produces a new bitmap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedBitmap {
    pixels: RgbaImage,
}

impl DecodedBitmap {
    /// Wrap an RGBA buffer produced by the `image` crate.
    #[must_use]
    pub fn new(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    /// Build a bitmap from raw RGBA bytes. Returns `None` when `raw` is not
    /// exactly `4 * width * height` bytes long.
    #[must_use]
    pub fn from_rgba(width: u32, height: u32, raw: Vec<u8>) -> Option<Self> {
        RgbaImage::from_raw(width, height, raw).map(Self::new)
    }

    /// Build a fully opaque bitmap from RGB triples.
    #[must_use]
    pub fn from_rgb(width: u32, height: u32, rgb: &[[u8; 3]]) -> Option<Self> {
        let raw = rgb.iter().flat_map(|&[r, g, b]| [r, g, b, 0xFF]).collect();
        Self::from_rgba(width, height, raw)
    }

    /// Decode an image file with the `image` crate.
    ///
    /// Only the first frame of animated sources is returned; see
    /// [`GifSource`](crate::animation::GifSource) for multi-frame input.
    pub fn open(path: &Path) -> Result<Self, EncodeError> {
        let decoded = image::open(path).map_err(|e| EncodeError::decode(path, e))?;
        Ok(Self::new(decoded.to_rgba8()))
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Number of pixels, `width * height`.
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    /// Pixel at `(x, y)`.
    ///
    /// # Panics
    /// Panics if the coordinates are out of bounds.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.pixels.get_pixel(x, y)
    }

    /// Pixels in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = &Rgba<u8>> {
        self.pixels.pixels()
    }

    /// Underlying `image` buffer.
    #[must_use]
    pub fn as_image(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Resample to exactly `width` x `height`.
    #[must_use]
    pub fn resized(&self, width: u32, height: u32) -> Self {
        if (width, height) == self.pixels.dimensions() || self.pixel_count() == 0 {
            return self.clone();
        }
        Self::new(imageops::resize(&self.pixels, width, height, FilterType::Triangle))
    }

    /// Shrink to fit within `bounds`, preserving the aspect ratio.
    ///
    /// Uses [`Resize::fit_nearest`], so the free side is rounded rather than
    /// floored.
    #[must_use]
    pub fn thumbnail(&self, bounds: Resize) -> Self {
        let (width, height) = bounds.fit_nearest(self.width(), self.height());
        self.resized(width, height)
    }
}

/// Error returned when a resize string is not `<W>x<H>`.
#[derive(Debug, Error)]
#[error("invalid resize {0:?}: expected WIDTHxHEIGHT with positive integers")]
pub struct ParseResizeError(String);

/// Maximum bounds for the fit-within-bounds resize, written `WIDTHxHEIGHT`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Resize {
    /// Maximum output width.
    pub max_width: u32,
    /// Maximum output height.
    pub max_height: u32,
}

impl Resize {
    /// Bounds of `max_width` x `max_height`.
    #[must_use]
    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width,
            max_height,
        }
    }

    /// Dimensions of a `width` x `height` source after fitting it within these
    /// bounds. Sources that already fit are left alone; the limiting side
    /// lands exactly on its bound and the other side is floored, never below 1.
    #[must_use]
    pub fn fit(self, width: u32, height: u32) -> (u32, u32) {
        if width == 0 || height == 0 {
            return (width, height);
        }
        if width <= self.max_width && height <= self.max_height {
            return (width, height);
        }

        let (w, h) = (u64::from(width), u64::from(height));
        let (max_w, max_h) = (u64::from(self.max_width), u64::from(self.max_height));
        // Width is the limiting side when max_w / w <= max_h / h.
        let (new_w, new_h) = if max_w * h <= max_h * w {
            (max_w, h * max_w / w)
        } else {
            (w * max_h / h, max_h)
        };
        (clamp_side(new_w), clamp_side(new_h))
    }

    /// Like [`Resize::fit`], but the free side takes whichever of its floor
    /// or ceiling keeps the source aspect ratio closest. Ties go to the floor.
    #[must_use]
    pub fn fit_nearest(self, width: u32, height: u32) -> (u32, u32) {
        if width == 0 || height == 0 {
            return (width, height);
        }
        if width <= self.max_width && height <= self.max_height {
            return (width, height);
        }

        let (w, h) = (u64::from(width), u64::from(height));
        let (max_w, max_h) = (u64::from(self.max_width), u64::from(self.max_height));
        if max_w * h >= max_h * w {
            // Height limits; the width error is |w * max_h - n * h| / (h * max_h).
            let floor = max_h * w / h;
            let ceil = floor + 1;
            let error = |n: u64| (w * max_h).abs_diff(n * h);
            let new_w = if (max_h * w) % h == 0 || error(floor) <= error(ceil) {
                floor
            } else {
                ceil
            };
            (clamp_side(new_w), clamp_side(max_h))
        } else {
            // Width limits; the aspect error is |w / h - max_w / n|.
            let floor = max_w * h / w;
            let ceil = floor + 1;
            if floor == 0 || (max_w * h) % w == 0 {
                return (clamp_side(max_w), clamp_side(floor));
            }
            // Cross-multiplied |w * n - max_w * h| / n, compared without division.
            let error = |n: u64| u128::from((w * n).abs_diff(max_w * h));
            let new_h = if error(floor) * u128::from(ceil) <= error(ceil) * u128::from(floor) {
                floor
            } else {
                ceil
            };
            (clamp_side(max_w), clamp_side(new_h))
        }
    }
}

fn clamp_side(side: u64) -> u32 {
    u32::try_from(side.max(1)).unwrap_or(u32::MAX)
}

impl fmt::Display for Resize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.max_width, self.max_height)
    }
}

impl FromStr for Resize {
    type Err = ParseResizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseResizeError(s.to_owned());
        let (w, h) = s.trim().split_once(['x', 'X']).ok_or_else(err)?;
        let w: u32 = w.trim().parse().map_err(|_| err())?;
        let h: u32 = h.trim().parse().map_err(|_| err())?;
        if w == 0 || h == 0 {
            return Err(err());
        }
        Ok(Self::new(w, h))
    }
}

impl TryFrom<String> for Resize {
    type Error = ParseResizeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Resize> for String {
    fn from(resize: Resize) -> Self {
        resize.to_string()
    }
}

/// Non-fatal notice that a source is large and no resize was requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SizeAdvisory {
    /// Source width.
    pub width: u32,
    /// Source height.
    pub height: u32,
}

impl fmt::Display for SizeAdvisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "source is {}x{}, larger than {SIZE_ADVISORY_LIMIT}px; consider setting a resize",
            self.width, self.height
        )
    }
}

/// Check whether a `width` x `height` source deserves a [`SizeAdvisory`].
#[must_use]
pub fn size_advisory(width: u32, height: u32, resize: Option<Resize>) -> Option<SizeAdvisory> {
    if resize.is_some() || width.max(height) <= SIZE_ADVISORY_LIMIT {
        return None;
    }
    Some(SizeAdvisory { width, height })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_parse() {
        assert_eq!("64x32".parse::<Resize>().unwrap(), Resize::new(64, 32));
        assert_eq!(" 8 X 8 ".parse::<Resize>().unwrap(), Resize::new(8, 8));
        assert!("64".parse::<Resize>().is_err());
        assert!("0x10".parse::<Resize>().is_err());
        assert!("axb".parse::<Resize>().is_err());
    }

    #[test]
    fn test_fit_preserves_aspect_ratio() {
        assert_eq!(Resize::new(50, 50).fit(200, 100), (50, 25));
        assert_eq!(Resize::new(50, 50).fit(100, 200), (25, 50));
        assert_eq!(Resize::new(64, 32).fit(128, 128), (32, 32));
    }

    #[test]
    fn test_fit_never_enlarges() {
        assert_eq!(Resize::new(100, 100).fit(10, 20), (10, 20));
    }

    #[test]
    fn test_fit_keeps_at_least_one_pixel() {
        assert_eq!(Resize::new(10, 10).fit(1000, 1), (10, 1));
        assert_eq!(Resize::new(4, 4).fit(0, 9), (0, 9));
    }

    #[test]
    fn test_fit_nearest_rounds_free_side() {
        // 8 * 7 / 10 = 5.6
        assert_eq!(Resize::new(8, 8).fit_nearest(10, 7), (8, 6));
        assert_eq!(Resize::new(8, 8).fit(10, 7), (8, 5));
        // 8 * 10 / 7 = 11.4
        assert_eq!(Resize::new(100, 8).fit_nearest(10, 7), (11, 8));
        assert_eq!(Resize::new(8, 8).fit_nearest(7, 10), (6, 8));
    }

    #[test]
    fn test_fit_nearest_ties_and_limits() {
        // 10 * 5 / 20 = 2.5 rounds down.
        assert_eq!(Resize::new(100, 10).fit_nearest(5, 20), (2, 10));
        assert_eq!(Resize::new(50, 50).fit_nearest(200, 100), (50, 25));
        assert_eq!(Resize::new(10, 10).fit_nearest(1000, 1), (10, 1));
        assert_eq!(Resize::new(100, 100).fit_nearest(10, 20), (10, 20));
    }

    #[test]
    fn test_thumbnail_rounds_like_fit_nearest() {
        let bitmap = DecodedBitmap::new(RgbaImage::from_pixel(10, 7, Rgba([1, 2, 3, 255])));
        let thumb = bitmap.thumbnail(Resize::new(8, 8));
        assert_eq!((thumb.width(), thumb.height()), (8, 6));
    }

    #[test]
    fn test_thumbnail_dimensions() {
        let bitmap = DecodedBitmap::new(RgbaImage::from_pixel(40, 20, Rgba([9, 9, 9, 255])));
        let thumb = bitmap.thumbnail(Resize::new(10, 10));
        assert_eq!((thumb.width(), thumb.height()), (10, 5));
        assert_eq!(thumb.pixel(3, 3), Rgba([9, 9, 9, 255]));
    }

    #[test]
    fn test_size_advisory() {
        assert!(size_advisory(500, 500, None).is_none());
        assert_eq!(
            size_advisory(501, 10, None),
            Some(SizeAdvisory {
                width: 501,
                height: 10
            })
        );
        assert!(size_advisory(1000, 1000, Some(Resize::new(10, 10))).is_none());
    }

    #[test]
    fn test_from_rgba_checks_length() {
        assert!(DecodedBitmap::from_rgba(2, 2, vec![0; 15]).is_none());
        assert!(DecodedBitmap::from_rgba(0, 0, Vec::new()).is_some());
    }
}
