//! In-memory stand-ins for the media layer, classifier and geocoder.

use anyhow::anyhow;
use chrono::{DateTime, TimeZone, Utc};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::classify::{Classifier, Label};
use crate::db::{Location, SqliteCatalog};
use crate::error::{Error, Result};
use crate::geo::Geocoder;
use crate::media::{
    mime_type_for_extension, Colors, ExifData, FileType, Media, RelatedFiles, ThumbnailKind,
};

pub fn catalog() -> SqliteCatalog {
    let catalog = SqliteCatalog::open_in_memory().unwrap();
    catalog.initialize().unwrap();
    catalog
}

pub fn paris() -> Location {
    Location {
        id: 98765,
        lat: 48.8584,
        lng: 2.2945,
        name: "Eiffel Tower".to_string(),
        category: "tourism".to_string(),
        place_type: "attraction".to_string(),
        city: "Paris".to_string(),
        county: "Paris".to_string(),
        state: "Île-de-France".to_string(),
        country: "France".to_string(),
        country_code: "fr".to_string(),
    }
}

/// A media file that exists only in memory, rooted under `/originals`.
#[derive(Debug, Clone)]
pub struct FakeMedia {
    path: PathBuf,
    file_type: FileType,
    hash: String,
    exif: Option<ExifData>,
    taken_at: DateTime<Utc>,
    width: u32,
    height: u32,
    unreadable: bool,
    group: Option<(Box<FakeMedia>, Vec<FakeMedia>)>,
}

impl FakeMedia {
    fn new(name: &str, file_type: FileType) -> Self {
        let (width, height) = if file_type.is_photo() { (100, 100) } else { (0, 0) };
        Self {
            path: Path::new("/originals").join(name),
            file_type,
            hash: format!("hash:{}", name),
            exif: None,
            taken_at: Utc.with_ymd_and_hms(2020, 8, 15, 13, 0, 0).unwrap(),
            width,
            height,
            unreadable: false,
            group: None,
        }
    }

    pub fn jpeg(name: &str) -> Self {
        Self::new(name, FileType::Jpeg)
    }

    pub fn raw(name: &str) -> Self {
        Self::new(name, FileType::Raw)
    }

    pub fn other(name: &str) -> Self {
        let ext = Path::new(name)
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();
        Self::new(name, FileType::from_extension(&ext))
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_exif(mut self, exif: ExifData) -> Self {
        self.exif = Some(exif);
        self
    }

    pub fn with_hash(mut self, hash: &str) -> Self {
        self.hash = hash.to_string();
        self
    }

    pub fn taken_at(mut self, taken_at: DateTime<Utc>) -> Self {
        self.taken_at = taken_at;
        self
    }

    pub fn with_group(mut self, main: FakeMedia, files: Vec<FakeMedia>) -> Self {
        self.group = Some((Box::new(main), files));
        self
    }

    /// Hashing fails, as for a file removed mid-run.
    pub fn unreadable(mut self) -> Self {
        self.unreadable = true;
        self
    }
}

impl Media for FakeMedia {
    fn filename(&self) -> &Path {
        &self.path
    }

    fn hash(&self) -> Result<String> {
        if self.unreadable {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "file vanished",
            )));
        }
        Ok(self.hash.clone())
    }

    fn file_type(&self) -> FileType {
        self.file_type
    }

    fn mime_type(&self) -> String {
        let ext = self
            .path
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();
        mime_type_for_extension(&ext).to_string()
    }

    fn date_created(&self) -> DateTime<Utc> {
        self.exif
            .as_ref()
            .and_then(|e| e.taken_at)
            .unwrap_or(self.taken_at)
    }

    fn exif(&self) -> Result<ExifData> {
        self.exif.clone().ok_or_else(|| Error::NoExif(self.path.clone()))
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn orientation(&self) -> u32 {
        self.exif.as_ref().map(|e| e.orientation).unwrap_or(1)
    }

    fn jpeg(&self) -> Result<Self> {
        if self.is_jpeg() {
            Ok(self.clone())
        } else {
            Err(Error::NoJpeg(self.path.clone()))
        }
    }

    fn related_files(&self) -> Result<RelatedFiles<Self>> {
        match &self.group {
            Some((main, files)) => Ok(RelatedFiles {
                main: (**main).clone(),
                files: files.clone(),
            }),
            None => Err(Error::NoMainFile(self.path.clone())),
        }
    }

    fn thumbnail(&self, thumbnails_path: &Path, kind: ThumbnailKind) -> Result<PathBuf> {
        Ok(thumbnails_path.join(format!("{}_{}.jpg", self.hash, kind.name())))
    }

    fn colors(&self, _thumbnails_path: &Path) -> Result<Colors> {
        if !self.is_jpeg() {
            return Err(Error::NoJpeg(self.path.clone()));
        }
        Ok(Colors {
            main_color: "blue".to_string(),
            colors: "666666666".to_string(),
            luminance: "222222222".to_string(),
            chroma: 100,
        })
    }
}

/// Returns the same labels for every thumbnail, plus per-thumbnail extras.
pub struct FakeClassifier {
    labels: Vec<Label>,
    extra: Vec<(&'static str, Vec<Label>)>,
    failing: Option<&'static str>,
    calls: AtomicUsize,
}

fn to_labels(labels: &[(&str, f32)]) -> Vec<Label> {
    labels.iter().map(|(l, p)| Label::new(l, *p)).collect()
}

impl FakeClassifier {
    pub fn new(labels: &[(&str, f32)]) -> Self {
        Self {
            labels: to_labels(labels),
            extra: Vec::new(),
            failing: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Also return `labels` for thumbnails whose path contains `kind`.
    pub fn with_extra(mut self, kind: &'static str, labels: &[(&str, f32)]) -> Self {
        self.extra.push((kind, to_labels(labels)));
        self
    }

    pub fn failing_on(mut self, kind: &'static str) -> Self {
        self.failing = Some(kind);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Classifier for FakeClassifier {
    fn classify(&self, thumbnail: &Path) -> Result<Vec<Label>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let path = thumbnail.to_string_lossy();

        if self.failing.is_some_and(|kind| path.contains(kind)) {
            return Err(Error::Classifier(anyhow!("model crashed on {}", path)));
        }

        let mut labels = self.labels.clone();
        for (kind, extra) in &self.extra {
            if path.contains(kind) {
                labels.extend(extra.iter().cloned());
            }
        }
        Ok(labels)
    }
}

pub struct FakeGeocoder {
    location: Option<Location>,
}

impl FakeGeocoder {
    pub fn new(location: Location) -> Self {
        Self { location: Some(location) }
    }

    pub fn failing() -> Self {
        Self { location: None }
    }
}

impl Geocoder for FakeGeocoder {
    fn reverse(&self, lat: f64, lng: f64) -> Result<Location> {
        self.location
            .clone()
            .ok_or_else(|| Error::Geocoder(anyhow!("no route to geocoder for {}, {}", lat, lng)))
    }
}
