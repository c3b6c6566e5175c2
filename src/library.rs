//! Batch driver: runs every catalog job and writes the asset library.
//!
//! Jobs are independent. Each folder's jobs are fanned out across the rayon
//! pool and collected back in catalog order before the folder file is
//! written. A failing job is reported and skipped; only catalog and output
//! I/O errors abort the build.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;

use crate::animation::{encode_animation, GifSource};
use crate::asset::{self, AssetRecord, DataEncoding};
use crate::atlas::build_font_atlas;
use crate::bitmap::DecodedBitmap;
use crate::catalog::{Catalog, Folder, FontJob, ImageJob};
use crate::codec;
use crate::error::{BuildError, EncodeError};
use crate::format::PixelFormat;
use crate::glyph::RusttypeRasterizer;

/// Kind of file listed in the manifest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryFileKind {
    /// `images.json` of one folder.
    Images,
    /// `animations.json` of one folder.
    Animations,
    /// `fonts.json` of one folder.
    Fonts,
    /// `screen_presets.json`.
    Screens,
}

impl LibraryFileKind {
    fn file_name(self) -> &'static str {
        match self {
            Self::Images => "images.json",
            Self::Animations => "animations.json",
            Self::Fonts => "fonts.json",
            Self::Screens => "screen_presets.json",
        }
    }
}

/// One generated file, as listed in `manifest.json`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ManifestFile {
    /// Path relative to the build directory, `/`-separated.
    pub path: String,
    /// File kind.
    #[serde(rename = "type")]
    pub kind: LibraryFileKind,
    /// Size in bytes.
    pub size: u64,
}

#[derive(Serialize)]
struct Manifest<'a> {
    name: &'a str,
    version: &'a str,
    buildpath: String,
    description: &'a str,
    files: &'a [ManifestFile],
}

/// A job that failed; the rest of the build went on without it.
#[derive(Debug)]
pub struct JobFailure {
    /// Source file of the job.
    pub path: PathBuf,
    /// Why it failed.
    pub error: EncodeError,
}

/// Records of one output file that share an id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdCollision {
    /// Output file, relative to the build directory.
    pub file: String,
    /// Shared id.
    pub id: String,
    /// Source paths of the colliding records, in output order.
    pub paths: Vec<String>,
}

/// Outcome of [`LibraryBuilder::build`].
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Resolved build directory.
    pub build_dir: PathBuf,
    /// Files listed in the manifest.
    pub files: Vec<ManifestFile>,
    /// Number of records written.
    pub records: usize,
    /// Jobs that failed.
    pub failures: Vec<JobFailure>,
    /// Id collisions detected per output file.
    pub collisions: Vec<IdCollision>,
}

/// Runs a [`Catalog`] and writes the asset library.
pub struct LibraryBuilder {
    catalog: Catalog,
    root: PathBuf,
}

impl LibraryBuilder {
    /// Relative paths in `catalog` are resolved against `root`.
    pub fn new(catalog: Catalog, root: impl Into<PathBuf>) -> Self {
        Self {
            catalog,
            root: root.into(),
        }
    }

    /// Load the catalog at `path`; its directory becomes the root.
    pub fn from_catalog_file(path: &Path) -> Result<Self, BuildError> {
        let catalog = Catalog::load(path)?;
        let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(Self::new(catalog, root))
    }

    /// The catalog being built.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    /// Path written to records: relative to the root when possible.
    fn display_path(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root).unwrap_or(path).to_path_buf()
    }

    /// Encode every job, write the folder files, `screen_presets.json` and
    /// `manifest.json`, then publish when configured.
    #[tracing::instrument(skip(self), fields(library = %self.catalog.library.name))]
    pub fn build(&self) -> Result<BuildReport, BuildError> {
        let library = &self.catalog.library;
        let build_dir = self.resolve(&library.build_path());
        fs::create_dir_all(&build_dir)
            .map_err(BuildError::io(format!("failed to create {}", build_dir.display())))?;

        let mut report = BuildReport {
            build_dir: build_dir.clone(),
            ..BuildReport::default()
        };

        for folder in &self.catalog.images {
            let tasks = self.expand_includes(folder, &mut report)?;
            self.write_folder(
                &folder.name,
                LibraryFileKind::Images,
                tasks,
                &mut report,
                |job, path| self.encode_image(job, path),
            )?;
        }
        for folder in &self.catalog.animations {
            let tasks = self.expand_includes(folder, &mut report)?;
            self.write_folder(
                &folder.name,
                LibraryFileKind::Animations,
                tasks,
                &mut report,
                |job, path| self.encode_animation(job, path),
            )?;
        }
        for folder in &self.catalog.fonts {
            let tasks: Vec<_> = folder
                .files
                .iter()
                .map(|job| (job, self.resolve(&job.file)))
                .collect();
            self.write_folder(
                &folder.name,
                LibraryFileKind::Fonts,
                tasks,
                &mut report,
                |job, path| self.encode_font(job, path),
            )?;
        }

        let screens = serde_json::to_string_pretty(&self.catalog.screens)?;
        let screens_file = LibraryFileKind::Screens.file_name();
        let size = write_library_file(&build_dir, screens_file, &screens)?;
        report.files.push(ManifestFile {
            path: screens_file.to_owned(),
            kind: LibraryFileKind::Screens,
            size,
        });

        let manifest = Manifest {
            name: &library.name,
            version: &library.version,
            buildpath: library.build_path().display().to_string(),
            description: &library.description,
            files: &report.files,
        };
        let manifest = serde_json::to_string_pretty(&manifest)?;
        write_library_file(&build_dir, "manifest.json", &manifest)?;
        tracing::info!("manifest generated: {}", build_dir.join("manifest.json").display());

        if let Some(publish) = &library.publish {
            let destination = self.resolve(publish);
            publish_library(&build_dir, &destination)?;
        }

        Ok(report)
    }

    /// Expand the glob of every job in `folder`, in catalog order.
    fn expand_includes<'a>(
        &self,
        folder: &'a Folder<ImageJob>,
        report: &mut BuildReport,
    ) -> Result<Vec<(&'a ImageJob, PathBuf)>, BuildError> {
        let root = glob::Pattern::escape(&self.root.to_string_lossy());
        let mut tasks = Vec::new();
        for job in &folder.files {
            let pattern = if Path::new(&job.include).is_absolute() || root.is_empty() {
                job.include.clone()
            } else {
                format!("{root}/{}", job.include)
            };

            let mut matched = 0;
            for entry in glob::glob(&pattern)? {
                match entry {
                    Ok(path) if path.is_file() => {
                        tasks.push((job, path));
                        matched += 1;
                    }
                    Ok(_) => {}
                    Err(e) => report.failures.push(JobFailure {
                        path: e.path().to_path_buf(),
                        error: EncodeError::Io(e.into_error()),
                    }),
                }
            }
            if matched == 0 {
                tracing::warn!("no files match {}", job.include);
            }
        }
        Ok(tasks)
    }

    fn write_folder<J, F>(
        &self,
        folder: &str,
        kind: LibraryFileKind,
        tasks: Vec<(&J, PathBuf)>,
        report: &mut BuildReport,
        encode: F,
    ) -> Result<(), BuildError>
    where
        J: Sync,
        F: Fn(&J, &Path) -> Result<AssetRecord, EncodeError> + Sync,
    {
        let folder_dir = report.build_dir.join(folder);
        fs::create_dir_all(&folder_dir)
            .map_err(BuildError::io(format!("failed to create {}", folder_dir.display())))?;

        let results: Vec<_> = tasks
            .into_par_iter()
            .map(|(job, path)| {
                let result = encode(job, &path);
                (path, result)
            })
            .collect();

        let mut records = Vec::with_capacity(results.len());
        for (path, result) in results {
            match result {
                Ok(record) => records.push(record),
                Err(error) => {
                    tracing::error!("{}: {error}", path.display());
                    report.failures.push(JobFailure { path, error });
                }
            }
        }

        let relative = format!("{folder}/{}", kind.file_name());
        report.collisions.extend(find_collisions(&relative, &records));
        let json = serde_json::to_string_pretty(&records)?;
        let size = write_library_file(&report.build_dir, &relative, &json)?;
        tracing::info!(
            "{} file {relative} generated: {:.2} kB",
            kind.file_name().trim_end_matches(".json"),
            size as f64 / 1024.0
        );

        report.records += records.len();
        report.files.push(ManifestFile {
            path: relative,
            kind,
            size,
        });
        Ok(())
    }

    fn data_encoding(&self) -> DataEncoding {
        self.catalog.library.data_encoding
    }

    fn encode_image(&self, job: &ImageJob, path: &Path) -> Result<AssetRecord, EncodeError> {
        let format = job.format.unwrap_or(PixelFormat::IMAGE_DEFAULT);
        let bitmap = DecodedBitmap::open(path)?;
        let prepared = codec::prepare_image(&bitmap, job.resize);
        let buffer = codec::encode(&prepared, format);
        tracing::debug!("{}: {}x{} {format}", path.display(), buffer.width, buffer.height);
        asset::image_record(
            &self.display_path(path),
            buffer,
            format,
            &codec::preview(&prepared, format),
            self.data_encoding(),
        )
    }

    fn encode_animation(&self, job: &ImageJob, path: &Path) -> Result<AssetRecord, EncodeError> {
        let format = job.format.unwrap_or(PixelFormat::ANIMATION_DEFAULT);
        let bytes = fs::read(path).map_err(|e| EncodeError::decode(path, e))?;
        let mut source = GifSource::from_bytes(path, &bytes)?;
        let animation = encode_animation(&mut source, format, job.resize)?;
        Ok(asset::animation_record(
            &self.display_path(path),
            animation,
            format,
            &bytes,
            self.data_encoding(),
        ))
    }

    fn encode_font(&self, job: &FontJob, path: &Path) -> Result<AssetRecord, EncodeError> {
        let rasterizer = RusttypeRasterizer::open(path)?;
        let atlas = build_font_atlas(&rasterizer, job.size as f32, job.glyphs.chars())?;
        Ok(asset::font_record(
            &job.name,
            &self.display_path(path),
            &job.glyphs,
            atlas,
            self.data_encoding(),
        ))
    }
}

fn find_collisions(file: &str, records: &[AssetRecord]) -> Vec<IdCollision> {
    let mut by_id: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for record in records {
        by_id
            .entry(record.id())
            .or_default()
            .push(record.path().to_owned());
    }

    by_id
        .into_iter()
        .filter(|(_, paths)| paths.len() > 1)
        .map(|(id, paths)| {
            tracing::warn!("{file}: id {id} is shared by {}", paths.join(", "));
            IdCollision {
                file: file.to_owned(),
                id: id.to_owned(),
                paths,
            }
        })
        .collect()
}

fn write_library_file(build_dir: &Path, relative: &str, content: &str) -> Result<u64, BuildError> {
    let path = build_dir.join(relative);
    fs::write(&path, content)
        .map_err(BuildError::io(format!("failed to write {}", path.display())))?;
    Ok(content.len() as u64)
}

/// Replace `destination` with a copy of `build_dir`.
fn publish_library(build_dir: &Path, destination: &Path) -> Result<(), BuildError> {
    if destination.exists() {
        tracing::info!("deleting {}", destination.display());
        fs::remove_dir_all(destination)
            .map_err(BuildError::io(format!("failed to delete {}", destination.display())))?;
    }
    tracing::info!("copying {} to {}", build_dir.display(), destination.display());
    copy_dir(build_dir, destination)
        .map_err(BuildError::io(format!("failed to copy to {}", destination.display())))
}

fn copy_dir(from: &Path, to: &Path) -> std::io::Result<()> {
    fs::create_dir_all(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::ImageRecord;

    fn record(id: &str, path: &str) -> AssetRecord {
        AssetRecord::Image(ImageRecord {
            id: id.to_owned(),
            name: id.to_owned(),
            path: path.to_owned(),
            format: PixelFormat::Binary,
            width: 1,
            height: 1,
            frames: None,
            data: asset::AssetData::default(),
            dataurl: String::new(),
        })
    }

    #[test]
    fn test_collisions_are_reported_not_dropped() {
        let records = vec![
            record("img_logo", "a/logo.png"),
            record("img_icon", "icon.png"),
            record("img_logo", "b/logo.png"),
        ];
        let collisions = find_collisions("icons/images.json", &records);
        assert_eq!(
            collisions,
            vec![IdCollision {
                file: "icons/images.json".to_owned(),
                id: "img_logo".to_owned(),
                paths: vec!["a/logo.png".to_owned(), "b/logo.png".to_owned()],
            }]
        );
    }

    #[test]
    fn test_copy_dir_is_recursive() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("from");
        fs::create_dir_all(from.join("nested")).unwrap();
        fs::write(from.join("nested/a.json"), "[]").unwrap();
        fs::write(from.join("manifest.json"), "{}").unwrap();

        let to = dir.path().join("to");
        publish_library(&from, &to).unwrap();
        assert_eq!(fs::read_to_string(to.join("nested/a.json")).unwrap(), "[]");

        fs::write(to.join("stale.json"), "x").unwrap();
        publish_library(&from, &to).unwrap();
        assert!(!to.join("stale.json").exists());
    }

    #[test]
    fn test_manifest_file_kind_names() {
        let file = ManifestFile {
            path: "fonts/fonts.json".to_owned(),
            kind: LibraryFileKind::Fonts,
            size: 3,
        };
        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(json["type"], "fonts");
    }
}
