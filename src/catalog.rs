//! Catalog of encoding jobs.
//!
//! A catalog is a RON or JSON file, picked by extension:
//!
//! ```text
//! Catalog(
//!     library: (name: "stock", buildpath: Some("build/stock")),
//!     images: [(name: "icons", files: [(include: "icons/*.png", resize: Some("32x32"), type: Some("BINARY"))])],
//!     animations: [(name: "anim", files: [(include: "anim/*.gif")])],
//!     fonts: [(name: "fonts", files: [(name: "small", file: "fonts/Roboto.ttf", size: 12)])],
//!     screens: [],
//! )
//! ```
//!
//! Pixel formats and resize bounds are validated while parsing, so a bad
//! value rejects the whole catalog before any encoding starts.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::asset::DataEncoding;
use crate::atlas::{DEFAULT_FONT_SIZE, DEFAULT_GLYPHS};
use crate::bitmap::Resize;
use crate::error::BuildError;
use crate::format::PixelFormat;

/// Top-level catalog document.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Catalog {
    /// Library identity and output settings.
    #[serde(default)]
    pub library: LibrarySettings,
    /// Still image folders.
    #[serde(default)]
    pub images: Vec<Folder<ImageJob>>,
    /// Animation folders.
    #[serde(default)]
    pub animations: Vec<Folder<ImageJob>>,
    /// Font folders.
    #[serde(default)]
    pub fonts: Vec<Folder<FontJob>>,
    /// Screen presets, copied verbatim into the library.
    #[serde(default)]
    pub screens: Vec<ScreenPreset>,
}

impl Catalog {
    /// Load a catalog from a `.ron` or `.json` file.
    pub fn load(path: &Path) -> Result<Self, BuildError> {
        let text = fs::read_to_string(path)
            .map_err(BuildError::io(format!("failed to read {}", path.display())))?;
        match path.extension().and_then(OsStr::to_str) {
            Some("ron") => Self::from_ron(&text),
            Some("json") => Self::from_json(&text),
            _ => Err(BuildError::CatalogFormat(path.to_path_buf())),
        }
    }

    /// Parse a RON catalog.
    pub fn from_ron(text: &str) -> Result<Self, BuildError> {
        Ok(ron::from_str(text)?)
    }

    /// Parse a JSON catalog.
    pub fn from_json(text: &str) -> Result<Self, BuildError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Library identity and output settings.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Library name.
    pub name: String,
    /// Library version.
    pub version: String,
    /// Output directory; `build/<name>` when unset.
    pub buildpath: Option<PathBuf>,
    /// Free-form description.
    pub description: String,
    /// Directory the finished build is copied to, replacing its content.
    pub publish: Option<PathBuf>,
    /// How record `data` arrays are written.
    pub data_encoding: DataEncoding,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            name: "stock".to_owned(),
            version: "0.0.0".to_owned(),
            buildpath: None,
            description: "A custom asset library".to_owned(),
            publish: None,
            data_encoding: DataEncoding::Numeric,
        }
    }
}

impl LibrarySettings {
    /// Output directory, before resolving against the catalog directory.
    #[must_use]
    pub fn build_path(&self) -> PathBuf {
        self.buildpath
            .clone()
            .unwrap_or_else(|| Path::new("build").join(&self.name))
    }
}

/// A named group of jobs written to one output file.
#[derive(Clone, Debug, Deserialize)]
pub struct Folder<J> {
    /// Sub-directory of the build path holding the folder's output.
    pub name: String,
    /// Jobs of this folder.
    #[serde(default = "Vec::new")]
    pub files: Vec<J>,
}

/// Still image or animation job.
#[derive(Clone, Debug, Deserialize)]
pub struct ImageJob {
    /// Glob pattern of source files.
    pub include: String,
    /// Optional fit-within bounds.
    #[serde(default)]
    pub resize: Option<Resize>,
    /// Target format; the call site default applies when unset.
    #[serde(default, rename = "type")]
    pub format: Option<PixelFormat>,
}

/// Font job.
#[derive(Clone, Debug, Deserialize)]
pub struct FontJob {
    /// Font name written to the record.
    pub name: String,
    /// Font file.
    pub file: PathBuf,
    /// Point size.
    #[serde(default = "default_font_size")]
    pub size: u32,
    /// Characters to rasterize, in order.
    #[serde(default = "default_glyphs")]
    pub glyphs: String,
}

fn default_font_size() -> u32 {
    DEFAULT_FONT_SIZE
}

fn default_glyphs() -> String {
    DEFAULT_GLYPHS.to_owned()
}

/// Display preset offered by the editor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScreenPreset {
    /// Preset name.
    pub name: String,
    /// Color mode label.
    pub colormode: String,
    /// Background color, passed through as-is.
    pub background: serde_json::Value,
    /// Screen width in pixels.
    pub width: u32,
    /// Screen height in pixels.
    pub height: u32,
    /// Preview scale.
    pub scale: f64,
    /// Whether the editor grid is shown.
    pub showgrid: bool,
    /// Editor grid size.
    pub gridsize: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    const RON_CATALOG: &str = r#"
        Catalog(
            library: (name: "demo", version: "1.2.0", data_encoding: hex),
            images: [
                (name: "icons", files: [(include: "icons/*.png", resize: Some("16x16"), type: Some("RGB565"))]),
            ],
            animations: [(name: "anim", files: [(include: "anim/*.gif")])],
            fonts: [(name: "fonts", files: [(name: "small", file: "fonts/tiny.ttf", size: 8)])],
            screens: [(
                name: "oled",
                colormode: "BINARY",
                background: "black",
                width: 128,
                height: 64,
                scale: 2.0,
                showgrid: true,
                gridsize: 8,
            )],
        )
    "#;

    #[test]
    fn test_ron_catalog() {
        let catalog = Catalog::from_ron(RON_CATALOG).unwrap();
        assert_eq!(catalog.library.name, "demo");
        assert_eq!(catalog.library.version, "1.2.0");
        assert_eq!(catalog.library.data_encoding, DataEncoding::Hex);
        assert_eq!(catalog.library.build_path(), Path::new("build/demo"));

        let icon_job = &catalog.images[0].files[0];
        assert_eq!(icon_job.resize, Some(Resize::new(16, 16)));
        assert_eq!(icon_job.format, Some(PixelFormat::Rgb565));
        assert_eq!(catalog.animations[0].files[0].format, None);

        let font = &catalog.fonts[0].files[0];
        assert_eq!(font.size, 8);
        assert_eq!(font.glyphs, DEFAULT_GLYPHS);
        assert_eq!(catalog.screens[0].gridsize, 8);
    }

    #[test]
    fn test_json_catalog_defaults() {
        let catalog = Catalog::from_json(
            r#"{"images": [{"name": "pics", "files": [{"include": "*.png", "type": "grayscale"}]}]}"#,
        )
        .unwrap();
        assert_eq!(catalog.library.name, "stock");
        assert_eq!(catalog.library.description, "A custom asset library");
        assert_eq!(catalog.images[0].files[0].format, Some(PixelFormat::Grayscale));
        assert!(catalog.fonts.is_empty());
    }

    #[test]
    fn test_unknown_format_rejects_catalog() {
        let err = Catalog::from_json(
            r#"{"images": [{"name": "pics", "files": [{"include": "*.png", "type": "RGB332"}]}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("RGB332"), "{err}");
    }

    #[test]
    fn test_bad_resize_rejects_catalog() {
        let err = Catalog::from_json(
            r#"{"animations": [{"name": "a", "files": [{"include": "*.gif", "resize": "big"}]}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("big"), "{err}");
    }

    #[test]
    fn test_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.yaml");
        fs::write(&path, "library: {}").unwrap();
        assert!(matches!(Catalog::load(&path), Err(BuildError::CatalogFormat(_))));
    }
}
