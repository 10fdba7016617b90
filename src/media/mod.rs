//! Media decoding layer.
//!
//! The indexing pipeline talks to files only through the [`Media`] trait.
//! Capabilities that can fail for a given file (EXIF, a JPEG representation,
//! related files, thumbnails, colors) return `Result`, so callers can treat a
//! missing capability as "skip" without knowing the concrete file kind.

pub mod colors;
pub mod file;
pub mod hashing;
pub mod metadata;
pub mod thumbnails;

use chrono::{DateTime, Utc};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::Result;

pub use colors::Colors;
pub use file::MediaFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FileType {
    Jpeg,
    Png,
    Tiff,
    Raw,
    Heif,
    Movie,
    Xmp,
    Aae,
    #[default]
    Other,
}

impl FileType {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Self::Jpeg,
            "png" => Self::Png,
            "tif" | "tiff" => Self::Tiff,
            "raw" | "cr2" | "cr3" | "nef" | "arw" | "dng" | "raf" | "orf" | "rw2" | "pef" | "srw" => {
                Self::Raw
            }
            "heic" | "heif" => Self::Heif,
            "mov" | "mp4" | "m4v" => Self::Movie,
            "xmp" => Self::Xmp,
            "aae" => Self::Aae,
            _ => Self::Other,
        }
    }

    pub fn from_type_str(s: &str) -> Self {
        match s {
            "jpg" => Self::Jpeg,
            "png" => Self::Png,
            "tiff" => Self::Tiff,
            "raw" => Self::Raw,
            "heif" => Self::Heif,
            "mov" => Self::Movie,
            "xmp" => Self::Xmp,
            "aae" => Self::Aae,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Tiff => "tiff",
            Self::Raw => "raw",
            Self::Heif => "heif",
            Self::Movie => "mov",
            Self::Xmp => "xmp",
            Self::Aae => "aae",
            Self::Other => "other",
        }
    }

    /// Files that start a photo group. Everything else only joins one.
    pub fn is_photo(&self) -> bool {
        matches!(self, Self::Jpeg | Self::Raw | Self::Heif)
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn mime_type_for_extension(ext: &str) -> &'static str {
    match ext.to_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "tif" | "tiff" => "image/tiff",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "cr2" => "image/x-canon-cr2",
        "cr3" => "image/x-canon-cr3",
        "nef" => "image/x-nikon-nef",
        "arw" => "image/x-sony-arw",
        "dng" => "image/x-adobe-dng",
        "raf" => "image/x-fuji-raf",
        "orf" => "image/x-olympus-orf",
        "rw2" => "image/x-panasonic-rw2",
        "mov" => "video/quicktime",
        "mp4" | "m4v" => "video/mp4",
        "xmp" => "application/rdf+xml",
        _ => "application/octet-stream",
    }
}

/// File name up to the first dot: `IMG_0001.CR2.xmp` -> `IMG_0001`.
pub fn base_name(file_name: &str) -> &str {
    match file_name.find('.') {
        Some(end) => &file_name[..end],
        None => file_name,
    }
}

/// Fields read from embedded EXIF metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExifData {
    pub lat: f64,
    pub lng: f64,
    pub artist: String,
    pub camera_make: String,
    pub camera_model: String,
    pub lens_make: String,
    pub lens_model: String,
    pub focal_length: i32,
    pub aperture: f64,
    pub taken_at: Option<DateTime<Utc>>,
    pub orientation: u32,
}

impl ExifData {
    pub fn has_coordinates(&self) -> bool {
        self.lat != 0.0 || self.lng != 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailKind {
    /// Centre square.
    Tile224,
    Left224,
    Right224,
}

impl ThumbnailKind {
    pub const SIZE: u32 = 224;

    pub fn name(&self) -> &'static str {
        match self {
            Self::Tile224 => "tile_224",
            Self::Left224 => "left_224",
            Self::Right224 => "right_224",
        }
    }
}

/// A capture group: the representative main file plus every file sharing its base name.
#[derive(Debug, Clone)]
pub struct RelatedFiles<M> {
    pub main: M,
    pub files: Vec<M>,
}

pub trait Media: Sized + Sync {
    fn filename(&self) -> &Path;

    fn hash(&self) -> Result<String>;

    fn file_type(&self) -> FileType;

    fn mime_type(&self) -> String;

    /// Capture time from EXIF, falling back to the file's modification time.
    fn date_created(&self) -> DateTime<Utc>;

    fn exif(&self) -> Result<ExifData>;

    /// Width after applying the EXIF orientation. Zero when unknown.
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    fn orientation(&self) -> u32;

    /// The JPEG representation of this file: itself, or a JPEG sibling.
    fn jpeg(&self) -> Result<Self>;

    fn related_files(&self) -> Result<RelatedFiles<Self>>;

    fn thumbnail(&self, thumbnails_path: &Path, kind: ThumbnailKind) -> Result<PathBuf>;

    fn colors(&self, thumbnails_path: &Path) -> Result<Colors>;

    fn base_name(&self) -> String {
        self.filename()
            .file_name()
            .map(|n| base_name(&n.to_string_lossy()).to_string())
            .unwrap_or_default()
    }

    /// Name shared by every file of one photo: the base name, without any
    /// directory. Same-named files in different directories therefore end up
    /// in the same photo.
    fn canonical_name_from_file(&self) -> String {
        self.base_name()
    }

    fn relative_filename(&self, root: &Path) -> String {
        let path = self.filename();
        path.strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string()
    }

    fn is_photo(&self) -> bool {
        self.file_type().is_photo()
    }

    fn is_jpeg(&self) -> bool {
        self.file_type() == FileType::Jpeg
    }

    fn camera_model(&self) -> String {
        self.exif().map(|e| e.camera_model).unwrap_or_default()
    }

    fn camera_make(&self) -> String {
        self.exif().map(|e| e.camera_make).unwrap_or_default()
    }

    fn lens_model(&self) -> String {
        self.exif().map(|e| e.lens_model).unwrap_or_default()
    }

    fn lens_make(&self) -> String {
        self.exif().map(|e| e.lens_make).unwrap_or_default()
    }

    fn focal_length(&self) -> i32 {
        self.exif().map(|e| e.focal_length).unwrap_or_default()
    }

    fn aperture(&self) -> f64 {
        self.exif().map(|e| e.aperture).unwrap_or_default()
    }

    /// Width / height rounded to two decimals, 0 when dimensions are unknown.
    fn aspect_ratio(&self) -> f64 {
        let (width, height) = (self.width(), self.height());
        if width == 0 || height == 0 {
            return 0.0;
        }
        (width as f64 / height as f64 * 100.0).round() / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_from_extension() {
        assert_eq!(FileType::from_extension("JPG"), FileType::Jpeg);
        assert_eq!(FileType::from_extension("jpeg"), FileType::Jpeg);
        assert_eq!(FileType::from_extension("CR2"), FileType::Raw);
        assert_eq!(FileType::from_extension("heic"), FileType::Heif);
        assert_eq!(FileType::from_extension("mov"), FileType::Movie);
        assert_eq!(FileType::from_extension("txt"), FileType::Other);

        assert!(FileType::Raw.is_photo());
        assert!(!FileType::Movie.is_photo());
        assert!(!FileType::Png.is_photo());
    }

    #[test]
    fn test_file_type_str_roundtrip() {
        for file_type in [FileType::Jpeg, FileType::Raw, FileType::Heif, FileType::Movie, FileType::Xmp] {
            assert_eq!(FileType::from_type_str(file_type.as_str()), file_type);
        }
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("IMG_0001.jpg"), "IMG_0001");
        assert_eq!(base_name("IMG_0001.CR2.xmp"), "IMG_0001");
        assert_eq!(base_name("README"), "README");
    }
}
