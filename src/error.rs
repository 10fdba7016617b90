use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("EXIF parsing error: {0}")]
    Exif(#[from] exif::Error),

    #[error("no EXIF data in {}", .0.display())]
    NoExif(PathBuf),

    #[error("no JPEG representation for {}", .0.display())]
    NoJpeg(PathBuf),

    #[error("no main file found for {}", .0.display())]
    NoMainFile(PathBuf),

    #[error("invalid timestamp in catalog: {0}")]
    InvalidTimestamp(String),

    #[error("no location found at {lat}, {lng}")]
    LocationNotFound { lat: f64, lng: f64 },

    #[error("classifier error: {0}")]
    Classifier(anyhow::Error),

    #[error("geocoder error: {0}")]
    Geocoder(anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
