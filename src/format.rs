//! The closed set of device pixel formats.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EncodeError;

/// Target pixel layout of an encoded buffer.
///
/// Selecting a format fixes both the bits per pixel and the packing rule
/// applied by [`codec::encode`](crate::codec::encode). In catalogs the format
/// is written by name (`"RGB565"`), in asset records by numeric code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "u8")]
pub enum PixelFormat {
    /// 1 bit per pixel, set for white (background) pixels.
    Binary,
    /// 1 byte of luminance per pixel.
    Grayscale,
    /// 3 bytes per pixel, R, G, B.
    Rgb24,
    /// 1 bit per pixel, set for fully transparent pixels.
    TransparentBinary,
    /// 2 bytes per pixel, big-endian 5-6-5.
    Rgb565,
    /// Alpha coverage only, packed like [`PixelFormat::TransparentBinary`].
    Rgba32Binary,
}

impl PixelFormat {
    /// Format used for still images when a job names none.
    pub const IMAGE_DEFAULT: Self = Self::Rgb24;

    /// Format used for animations when a job names none.
    ///
    /// Differs from [`PixelFormat::IMAGE_DEFAULT`]; existing firmware expects
    /// one-bit animations unless told otherwise.
    pub const ANIMATION_DEFAULT: Self = Self::Binary;

    /// Every supported format, in code order.
    pub const ALL: [Self; 6] = [
        Self::Binary,
        Self::Grayscale,
        Self::Rgb24,
        Self::TransparentBinary,
        Self::Rgb565,
        Self::Rgba32Binary,
    ];

    /// Numeric code written to asset records.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Binary => 0,
            Self::Grayscale => 1,
            Self::Rgb24 => 2,
            Self::TransparentBinary => 3,
            Self::Rgb565 => 4,
            Self::Rgba32Binary => 5,
        }
    }

    /// Catalog name of the format.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Binary => "BINARY",
            Self::Grayscale => "GRAYSCALE",
            Self::Rgb24 => "RGB24",
            Self::TransparentBinary => "TRANSPARENT_BINARY",
            Self::Rgb565 => "RGB565",
            Self::Rgba32Binary => "RGBA32",
        }
    }

    /// Whether the format packs one bit per pixel with byte-aligned rows.
    #[must_use]
    pub const fn is_bit_packed(self) -> bool {
        matches!(
            self,
            Self::Binary | Self::TransparentBinary | Self::Rgba32Binary
        )
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelFormat {
    type Err = EncodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| EncodeError::UnsupportedFormat(s.to_owned()))
    }
}

impl TryFrom<String> for PixelFormat {
    type Error = EncodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<u8> for PixelFormat {
    type Error = EncodeError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|format| format.code() == code)
            .ok_or_else(|| EncodeError::UnsupportedFormat(code.to_string()))
    }
}

impl From<PixelFormat> for u8 {
    fn from(format: PixelFormat) -> Self {
        format.code()
    }
}
