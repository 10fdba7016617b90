//! Catalog entities.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::media::FileType;

/// Sentinel used for camera and lens identities that EXIF does not name.
pub const UNKNOWN: &str = "Unknown";

/// Country code used when a location carries none.
pub const UNKNOWN_COUNTRY_CODE: &str = "zz";

/// A logical photo. Identity is the canonical name, not any file path.
#[derive(Debug, Clone)]
pub struct Photo {
    pub id: i64,
    pub canonical_name: String,
    pub taken_at: DateTime<Utc>,
    pub title: Option<String>,
    pub favorite: bool,
    pub lat: f64,
    pub lng: f64,
    pub artist: String,
    pub focal_length: i32,
    pub aperture: f64,
    pub camera: Option<Camera>,
    pub lens: Option<Lens>,
    pub location: Option<Location>,
    pub country: Option<Country>,
    pub tags: Vec<Tag>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Photo {
    pub fn new(canonical_name: &str, taken_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            canonical_name: canonical_name.to_string(),
            taken_at,
            title: None,
            favorite: false,
            lat: 0.0,
            lng: 0.0,
            artist: String::new(),
            focal_length: 0,
            aperture: 0.0,
            camera: None,
            lens: None,
            location: None,
            country: None,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_location(&self) -> bool {
        self.location.is_some()
    }
}

/// One physical file belonging to a photo.
#[derive(Debug, Clone, Default)]
pub struct File {
    pub id: i64,
    pub photo_id: i64,
    /// Path relative to the originals root.
    pub name: String,
    pub hash: String,
    pub file_type: FileType,
    pub mime: String,
    pub orientation: u32,
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: f64,
    pub portrait: bool,
    pub main_color: String,
    pub colors: String,
    pub luminance: String,
    pub chroma: u32,
    pub primary: bool,
    pub missing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: i64,
    /// Always lowercase.
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Camera {
    pub id: i64,
    pub model: String,
    pub make: String,
}

impl Camera {
    pub fn is_unknown(&self) -> bool {
        self.model.is_empty() || self.model == UNKNOWN
    }
}

impl fmt::Display for Camera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.make.is_empty() || self.model.starts_with(&self.make) || self.is_unknown() {
            write!(f, "{}", self.model)
        } else {
            write!(f, "{} {}", self.make, self.model)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lens {
    pub id: i64,
    pub model: String,
    pub make: String,
}

/// A reverse-geocoded place. `id` is the geocoder's place identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Location {
    pub id: i64,
    pub lat: f64,
    pub lng: f64,
    pub name: String,
    pub category: String,
    pub place_type: String,
    pub city: String,
    pub county: String,
    pub state: String,
    pub country: String,
    pub country_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Country {
    pub code: String,
    pub name: String,
}

/// Row counts, used for run summaries and idempotence checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogStats {
    pub photos: i64,
    pub files: i64,
    pub tags: i64,
    pub cameras: i64,
    pub lenses: i64,
    pub locations: i64,
    pub countries: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_display() {
        let camera = Camera { id: 1, model: "X100V".to_string(), make: "FUJIFILM".to_string() };
        assert_eq!(camera.to_string(), "FUJIFILM X100V");

        let camera = Camera { id: 2, model: "Canon EOS 5D".to_string(), make: "Canon".to_string() };
        assert_eq!(camera.to_string(), "Canon EOS 5D");

        let camera = Camera { id: 3, model: UNKNOWN.to_string(), make: String::new() };
        assert!(camera.is_unknown());
        assert_eq!(camera.to_string(), "Unknown");
    }
}
