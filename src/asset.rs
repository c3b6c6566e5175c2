//! Asset records: encoder output wrapped with identity and geometry, in the
//! JSON shape the display runtime loads.

use std::fmt;
use std::io::Cursor;
use std::path::Path;

use base64::Engine;
use image::ImageOutputFormat;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};

use crate::animation::EncodedAnimation;
use crate::atlas::{GlyphAtlas, GlyphAtlasEntry};
use crate::bitmap::DecodedBitmap;
use crate::codec::EncodedBuffer;
use crate::error::EncodeError;
use crate::format::PixelFormat;

/// What a record's payload holds; decides the id prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    /// Still image.
    Image,
    /// Multi-frame animation.
    Animation,
    /// Font glyph atlas.
    Font,
}

impl PayloadKind {
    /// Prefix prepended to sanitized ids.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Image => "img_",
            Self::Animation => "anim_",
            Self::Font => "font_",
        }
    }
}

/// File name of `path` up to its first `.`, or the file stem for dotfiles
/// where that would be empty.
#[must_use]
pub fn base_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();
    match file_name.split('.').next() {
        Some(base) if !base.is_empty() => base.to_owned(),
        _ => path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default(),
    }
}

/// Replace every character outside `[0-9a-zA-Z_]` with `_`.
#[must_use]
pub fn sanitize_identifier(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Stable id of the asset loaded from `path`.
///
/// Distinct files with the same sanitized base name get the same id.
#[must_use]
pub fn asset_id(kind: PayloadKind, path: &Path) -> String {
    format!("{}{}", kind.prefix(), sanitize_identifier(&base_name(path)))
}

/// Integer rendered as `0xNN` for `0..=255` and minimal-width hex above,
/// with a leading `-` for negative values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HexWord(pub i64);

impl fmt::Display for HexWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        if magnitude <= 0xFF {
            write!(f, "{sign}0x{magnitude:02X}")
        } else {
            write!(f, "{sign}0x{magnitude:X}")
        }
    }
}

/// How the `data` array of a record is written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataEncoding {
    /// Plain JSON integers.
    #[default]
    Numeric,
    /// Strings rendered by [`HexWord`].
    Hex,
}

/// Payload bytes of a record, serialized per [`DataEncoding`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssetData {
    /// Raw payload.
    pub bytes: Vec<u8>,
    /// Serialization style.
    pub encoding: DataEncoding,
}

impl Serialize for AssetData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.bytes.len()))?;
        for &byte in &self.bytes {
            match self.encoding {
                DataEncoding::Numeric => seq.serialize_element(&byte)?,
                DataEncoding::Hex => {
                    seq.serialize_element(&HexWord(i64::from(byte)).to_string())?;
                }
            }
        }
        seq.end()
    }
}

/// Record of a still image or an animation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ImageRecord {
    /// Derived identifier.
    pub id: String,
    /// Human-readable name, the file's base name.
    pub name: String,
    /// Source path as listed in the catalog.
    pub path: String,
    /// Pixel format code.
    #[serde(rename = "type")]
    pub format: PixelFormat,
    /// Encoded width.
    pub width: u32,
    /// Encoded height.
    pub height: u32,
    /// Frame count, animations only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frames: Option<usize>,
    /// Packed pixel data.
    pub data: AssetData,
    /// Preview as a `data:` URL.
    pub dataurl: String,
}

/// Record of a rasterized font.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FontRecord {
    /// Derived identifier.
    pub id: String,
    /// Catalog name of the font.
    pub name: String,
    /// Font file path as listed in the catalog.
    pub path: String,
    /// Point size.
    pub height: u32,
    /// Requested characters, in order.
    pub glyphstr: String,
    /// Rounded ascent in pixels.
    pub ascent: i32,
    /// Rounded descent in pixels.
    pub descent: i32,
    /// Glyph table.
    pub glyphs: Vec<GlyphAtlasEntry>,
    /// Coverage data indexed by `glyphs[..].start`.
    pub data: AssetData,
}

/// One entry of an asset library file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AssetRecord {
    /// Still image or animation.
    Image(ImageRecord),
    /// Font.
    Font(FontRecord),
}

impl AssetRecord {
    /// Derived identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Image(record) => &record.id,
            Self::Font(record) => &record.id,
        }
    }

    /// Source path.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Image(record) => &record.path,
            Self::Font(record) => &record.path,
        }
    }
}

/// PNG rendition of `bitmap` as a `data:image/png;base64,` URL.
pub fn png_data_url(bitmap: &DecodedBitmap) -> Result<String, EncodeError> {
    let mut png = Vec::new();
    bitmap
        .as_image()
        .write_to(&mut Cursor::new(&mut png), ImageOutputFormat::Png)?;
    Ok(format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png)
    ))
}

/// Raw GIF file bytes as a `data:image/gif;base64,` URL.
#[must_use]
pub fn gif_data_url(gif: &[u8]) -> String {
    format!(
        "data:image/gif;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(gif)
    )
}

/// Assemble the record of a still image. `preview` is what the device draws,
/// see [`codec::preview`](crate::codec::preview).
pub fn image_record(
    path: &Path,
    buffer: EncodedBuffer,
    format: PixelFormat,
    preview: &DecodedBitmap,
    encoding: DataEncoding,
) -> Result<AssetRecord, EncodeError> {
    Ok(AssetRecord::Image(ImageRecord {
        id: asset_id(PayloadKind::Image, path),
        name: base_name(path),
        path: path.display().to_string(),
        format,
        width: buffer.width,
        height: buffer.height,
        frames: None,
        data: AssetData {
            bytes: buffer.bytes,
            encoding,
        },
        dataurl: png_data_url(preview)?,
    }))
}

/// Assemble the record of an animation. `source` is the original file content.
#[must_use]
pub fn animation_record(
    path: &Path,
    animation: EncodedAnimation,
    format: PixelFormat,
    source: &[u8],
    encoding: DataEncoding,
) -> AssetRecord {
    AssetRecord::Image(ImageRecord {
        id: asset_id(PayloadKind::Animation, path),
        name: base_name(path),
        path: path.display().to_string(),
        format,
        width: animation.buffer.width,
        height: animation.buffer.height,
        frames: Some(animation.frames),
        data: AssetData {
            bytes: animation.buffer.bytes,
            encoding,
        },
        dataurl: gif_data_url(source),
    })
}

/// Assemble the record of a font atlas built from the file at `path`.
#[must_use]
pub fn font_record(
    name: &str,
    path: &Path,
    glyphstr: &str,
    atlas: GlyphAtlas,
    encoding: DataEncoding,
) -> AssetRecord {
    AssetRecord::Font(FontRecord {
        id: asset_id(PayloadKind::Font, path),
        name: name.to_owned(),
        path: path.display().to_string(),
        height: atlas.point_size.round() as u32,
        glyphstr: glyphstr.to_owned(),
        ascent: atlas.metrics.ascent.round() as i32,
        descent: atlas.metrics.descent.round() as i32,
        glyphs: atlas.entries,
        data: AssetData {
            bytes: atlas.data,
            encoding,
        },
    })
}
