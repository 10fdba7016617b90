use chrono::{Duration, Utc};
use std::path::Path;

use super::{title, LocationResolver, MergeOutcome, TagResolver};
use crate::classify::Classifier;
use crate::db::{CatalogStore, Photo};
use crate::error::Result;
use crate::geo::Geocoder;
use crate::media::{FileType, Media};

/// Existing photos are only refreshed when their last update is older than this.
pub const STALE_AFTER_MINUTES: i64 = 10;

/// Upserts the photo and file records for one physical file.
pub struct RecordMerger<'a> {
    store: &'a dyn CatalogStore,
    originals_path: &'a Path,
    thumbnails_path: &'a Path,
    tags: TagResolver<'a>,
    location: LocationResolver<'a>,
}

impl<'a> RecordMerger<'a> {
    pub fn new(
        store: &'a dyn CatalogStore,
        classifier: Option<&'a dyn Classifier>,
        geocoder: Option<&'a dyn Geocoder>,
        originals_path: &'a Path,
        thumbnails_path: &'a Path,
    ) -> Self {
        let tags = TagResolver::new(store, classifier, thumbnails_path);
        Self {
            store,
            originals_path,
            thumbnails_path,
            tags,
            location: LocationResolver::new(store, geocoder, tags),
        }
    }

    pub fn originals_path(&self) -> &Path {
        self.originals_path
    }

    /// Merge `media` into the catalog, creating or refreshing its photo first.
    ///
    /// Enrichment failures (EXIF, classifier, colors) only leave fields at
    /// their defaults. Errors returned here come from the hash or the store.
    pub fn merge_file<M: Media>(&self, media: &M) -> Result<MergeOutcome> {
        let canonical_name = media.canonical_name_from_file();
        let hash = media.hash()?;
        let relative_name = media.relative_filename(self.originals_path);

        let photo = match self.store.find_photo_by_canonical_name(&canonical_name)? {
            None => self.create_photo(media, &canonical_name)?,
            Some(mut photo) => {
                if Utc::now() - photo.updated_at > Duration::minutes(STALE_AFTER_MINUTES) {
                    self.refresh_photo(media, &mut photo)?;
                }
                photo
            }
        };

        let is_jpeg = media.file_type() == FileType::Jpeg;
        let primary = match self.store.find_primary_file(photo.id)? {
            None => is_jpeg,
            Some(current) => is_jpeg && (current.name == relative_name || current.hash == hash),
        };

        let existing = self.store.find_file(&hash, &relative_name)?;
        let mut file = existing.clone().unwrap_or_default();

        file.photo_id = photo.id;
        file.primary = primary;
        file.missing = false;
        file.name = relative_name;
        file.hash = hash;
        file.file_type = media.file_type();
        file.mime = media.mime_type();
        file.orientation = media.orientation();

        match media.colors(self.thumbnails_path) {
            Ok(colors) => {
                file.main_color = colors.main_color;
                file.colors = colors.colors;
                file.luminance = colors.luminance;
                file.chroma = colors.chroma;
            }
            Err(e) => {
                tracing::debug!(file = %file.name, error = %e, "No color information");
            }
        }

        let (width, height) = (media.width(), media.height());
        if width > 0 && height > 0 {
            file.width = width;
            file.height = height;
            file.aspect_ratio = media.aspect_ratio();
            file.portrait = width < height;
        }

        let outcome = if existing.is_some() {
            self.store.save_file(&file)?;
            MergeOutcome::Updated
        } else {
            self.store.create_file(&mut file)?;
            MergeOutcome::Added
        };

        // A new primary supersedes the old one
        if file.primary {
            self.store.clear_primary(photo.id, file.id)?;
        }

        Ok(outcome)
    }

    fn create_photo<M: Media>(&self, media: &M, canonical_name: &str) -> Result<Photo> {
        let taken_at = media.date_created();
        let mut photo = Photo::new(canonical_name, taken_at);

        match media.jpeg() {
            Ok(jpeg) => {
                match jpeg.exif() {
                    Ok(exif) => {
                        photo.lat = exif.lat;
                        photo.lng = exif.lng;
                        photo.artist = exif.artist;
                    }
                    Err(e) => tracing::debug!(file = %jpeg.filename().display(), error = %e, "No EXIF data"),
                }
                photo.tags = self.tags.resolve_tags(&jpeg)?;
            }
            Err(e) => tracing::debug!(error = %e, "No JPEG to enrich from"),
        }

        self.location.resolve(&mut photo, media)?;

        photo.camera = Some(
            self.store
                .first_or_create_camera(&media.camera_model(), &media.camera_make())?,
        );
        photo.lens = Some(self.store.first_or_create_lens(&media.lens_model(), &media.lens_make())?);
        photo.focal_length = media.focal_length();
        photo.aperture = media.aperture();
        photo.favorite = false;

        if photo.title.is_none() {
            photo.title = Some(title::compose(
                photo.location.as_ref(),
                &photo.tags,
                photo.camera.as_ref(),
                taken_at,
            ));
        }
        tracing::debug!(photo = %canonical_name, title = ?photo.title, "New photo");

        photo.updated_at = Utc::now();
        self.store.create_photo(&mut photo)?;
        Ok(photo)
    }

    /// Re-read equipment and EXIF fields. Title, tags, favorite and an
    /// already resolved location are left untouched.
    fn refresh_photo<M: Media>(&self, media: &M, photo: &mut Photo) -> Result<()> {
        if let Ok(jpeg) = media.jpeg() {
            photo.camera = Some(
                self.store
                    .first_or_create_camera(&media.camera_model(), &media.camera_make())?,
            );
            photo.lens = Some(self.store.first_or_create_lens(&media.lens_model(), &media.lens_make())?);
            photo.focal_length = media.focal_length();
            photo.aperture = media.aperture();

            if let Ok(exif) = jpeg.exif() {
                photo.lat = exif.lat;
                photo.lng = exif.lng;
                photo.artist = exif.artist;
            }
        }

        if !photo.has_location() {
            self.location.approximate(photo)?;
        }

        photo.updated_at = Utc::now();
        self.store.save_photo(photo)
    }
}
