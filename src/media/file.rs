use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::{
    base_name, colors, hashing, metadata, mime_type_for_extension, thumbnails, Colors, ExifData,
    FileType, Media, RelatedFiles, ThumbnailKind,
};
use crate::error::{Error, Result};

/// A file on disk. Hash, EXIF and dimensions are read once and cached.
#[derive(Debug, Clone)]
pub struct MediaFile {
    path: PathBuf,
    extension: String,
    file_type: FileType,
    hash: OnceLock<String>,
    exif: OnceLock<Option<ExifData>>,
    dimensions: OnceLock<Option<(u32, u32)>>,
}

impl MediaFile {
    pub fn open(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("not a regular file: {}", path.display()),
            )));
        }

        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        Ok(Self {
            path: path.to_path_buf(),
            file_type: FileType::from_extension(&extension),
            extension,
            hash: OnceLock::new(),
            exif: OnceLock::new(),
            dimensions: OnceLock::new(),
        })
    }

    fn cached_exif(&self) -> Option<&ExifData> {
        self.exif
            .get_or_init(|| match metadata::read_exif(&self.path) {
                Ok(data) => Some(data),
                Err(e) => {
                    tracing::debug!(path = %self.path.display(), error = %e, "no EXIF data");
                    None
                }
            })
            .as_ref()
    }

    /// Pixel dimensions as stored, before orientation is applied.
    fn raw_dimensions(&self) -> Option<(u32, u32)> {
        *self.dimensions.get_or_init(|| {
            if !matches!(self.file_type, FileType::Jpeg | FileType::Png | FileType::Tiff) {
                return None;
            }
            image::ImageReader::open(&self.path)
                .ok()?
                .with_guessed_format()
                .ok()?
                .into_dimensions()
                .ok()
        })
    }

    /// Regular, non-hidden files in the same directory sharing this file's base name.
    fn siblings(&self) -> Result<Vec<PathBuf>> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let base = self.base_name();

        let mut siblings: Vec<PathBuf> = std::fs::read_dir(dir)?
            .flatten()
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().to_string();
                if name.starts_with('.') || base_name(&name) != base {
                    None
                } else {
                    Some(dir.join(name))
                }
            })
            .collect();

        siblings.sort();
        Ok(siblings)
    }

    fn file_name_len(&self) -> usize {
        self.path
            .file_name()
            .map(|n| n.len())
            .unwrap_or(usize::MAX)
    }
}

impl Media for MediaFile {
    fn filename(&self) -> &Path {
        &self.path
    }

    fn hash(&self) -> Result<String> {
        if let Some(hash) = self.hash.get() {
            return Ok(hash.clone());
        }
        let hash = hashing::sha256_file(&self.path)?;
        let _ = self.hash.set(hash.clone());
        Ok(hash)
    }

    fn file_type(&self) -> FileType {
        self.file_type
    }

    fn mime_type(&self) -> String {
        mime_type_for_extension(&self.extension).to_string()
    }

    fn date_created(&self) -> DateTime<Utc> {
        if let Some(taken_at) = self.cached_exif().and_then(|e| e.taken_at) {
            return taken_at;
        }

        std::fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now())
    }

    fn exif(&self) -> Result<ExifData> {
        self.cached_exif()
            .cloned()
            .ok_or_else(|| Error::NoExif(self.path.clone()))
    }

    fn width(&self) -> u32 {
        match self.raw_dimensions() {
            Some((_, height)) if self.orientation() > 4 => height,
            Some((width, _)) => width,
            None => 0,
        }
    }

    fn height(&self) -> u32 {
        match self.raw_dimensions() {
            Some((width, _)) if self.orientation() > 4 => width,
            Some((_, height)) => height,
            None => 0,
        }
    }

    fn orientation(&self) -> u32 {
        self.cached_exif().map(|e| e.orientation).unwrap_or(1)
    }

    fn jpeg(&self) -> Result<Self> {
        if self.is_jpeg() {
            return Ok(self.clone());
        }

        for sibling in self.siblings()? {
            if FileType::from_extension(
                &sibling.extension().map(|e| e.to_string_lossy().to_string()).unwrap_or_default(),
            ) == FileType::Jpeg
            {
                return MediaFile::open(&sibling);
            }
        }

        Err(Error::NoJpeg(self.path.clone()))
    }

    fn related_files(&self) -> Result<RelatedFiles<Self>> {
        let files: Vec<MediaFile> = self
            .siblings()?
            .iter()
            .filter_map(|path| MediaFile::open(path).ok())
            .collect();

        let main = files
            .iter()
            .find(|f| f.file_type == FileType::Raw)
            .or_else(|| files.iter().find(|f| f.file_type == FileType::Heif))
            .or_else(|| {
                files
                    .iter()
                    .filter(|f| f.file_type == FileType::Jpeg)
                    .min_by_key(|f| f.file_name_len())
            })
            .cloned()
            .ok_or_else(|| Error::NoMainFile(self.path.clone()))?;

        Ok(RelatedFiles { main, files })
    }

    fn thumbnail(&self, thumbnails_path: &Path, kind: ThumbnailKind) -> Result<PathBuf> {
        let hash = self.hash()?;
        thumbnails::create(&self.path, &hash, thumbnails_path, kind)
    }

    fn colors(&self, thumbnails_path: &Path) -> Result<Colors> {
        let thumbnail = self.thumbnail(thumbnails_path, ThumbnailKind::Tile224)?;
        colors::extract(&thumbnail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::fs::{self, File};
    use tempfile::tempdir;

    fn write_jpeg(path: &Path, width: u32, height: u32) {
        RgbImage::from_pixel(width, height, Rgb([40, 90, 200])).save(path).unwrap();
    }

    #[test]
    fn test_open_detects_type_and_mime() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("IMG_0001.JPG");
        write_jpeg(&path, 64, 32);

        let media = MediaFile::open(&path).unwrap();
        assert_eq!(media.file_type(), FileType::Jpeg);
        assert_eq!(media.mime_type(), "image/jpeg");
        assert!(media.is_photo());
        assert_eq!(media.canonical_name_from_file(), "IMG_0001");
        assert_eq!(media.relative_filename(dir.path()), "IMG_0001.JPG");
    }

    #[test]
    fn test_dimensions_and_aspect_ratio() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wide.jpg");
        write_jpeg(&path, 300, 200);

        let media = MediaFile::open(&path).unwrap();
        assert_eq!(media.width(), 300);
        assert_eq!(media.height(), 200);
        assert_eq!(media.orientation(), 1);
        assert_eq!(media.aspect_ratio(), 1.5);
    }

    #[test]
    fn test_open_rejects_directories() {
        let dir = tempdir().unwrap();
        assert!(MediaFile::open(dir.path()).is_err());
    }

    #[test]
    fn test_related_files_prefers_raw_as_main() {
        let dir = tempdir().unwrap();
        write_jpeg(&dir.path().join("IMG_0002.jpg"), 8, 8);
        fs::write(dir.path().join("IMG_0002.CR2"), b"raw bytes").unwrap();
        File::create(dir.path().join("IMG_0002.CR2.xmp")).unwrap();
        File::create(dir.path().join("IMG_00021.jpg")).unwrap();
        File::create(dir.path().join(".IMG_0002.jpg")).unwrap();

        let media = MediaFile::open(&dir.path().join("IMG_0002.jpg")).unwrap();
        let related = media.related_files().unwrap();

        assert_eq!(related.main.file_type(), FileType::Raw);
        assert_eq!(related.files.len(), 3);
    }

    #[test]
    fn test_related_files_shortest_jpeg_is_main() {
        let dir = tempdir().unwrap();
        write_jpeg(&dir.path().join("IMG_0003.edit.jpg"), 8, 8);
        write_jpeg(&dir.path().join("IMG_0003.jpg"), 8, 8);

        let media = MediaFile::open(&dir.path().join("IMG_0003.edit.jpg")).unwrap();
        let related = media.related_files().unwrap();

        assert_eq!(related.main.filename(), dir.path().join("IMG_0003.jpg"));
    }

    #[test]
    fn test_related_files_without_main() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("clip.mov")).unwrap();

        let media = MediaFile::open(&dir.path().join("clip.mov")).unwrap();
        assert!(matches!(media.related_files(), Err(Error::NoMainFile(_))));
    }

    #[test]
    fn test_jpeg_sibling_of_raw() {
        let dir = tempdir().unwrap();
        write_jpeg(&dir.path().join("IMG_0004.jpg"), 8, 8);
        fs::write(dir.path().join("IMG_0004.NEF"), b"raw bytes").unwrap();
        fs::write(dir.path().join("IMG_0005.NEF"), b"raw bytes").unwrap();

        let raw = MediaFile::open(&dir.path().join("IMG_0004.NEF")).unwrap();
        assert_eq!(raw.jpeg().unwrap().filename(), dir.path().join("IMG_0004.jpg"));

        let lonely = MediaFile::open(&dir.path().join("IMG_0005.NEF")).unwrap();
        assert!(matches!(lonely.jpeg(), Err(Error::NoJpeg(_))));
    }

    #[test]
    fn test_colors_from_thumbnail() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blue.jpg");
        write_jpeg(&path, 64, 64);

        let media = MediaFile::open(&path).unwrap();
        let colors = media.colors(&dir.path().join("thumbs")).unwrap();

        assert_eq!(colors.colors.len(), 9);
        assert_eq!(colors.luminance.len(), 9);
    }

    #[test]
    fn test_date_created_falls_back_to_mtime() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("noexif.jpg");
        write_jpeg(&path, 8, 8);

        let media = MediaFile::open(&path).unwrap();
        let age = Utc::now() - media.date_created();
        assert!(age.num_seconds().abs() < 60);
    }
}
