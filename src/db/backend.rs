//! Catalog store abstraction.
//!
//! The indexing components only see this trait, so the SQLite backend can be
//! swapped for another store (or an in-memory database in tests).

use chrono::{DateTime, Utc};

use super::models::{CatalogStats, Camera, Country, File, Lens, Location, Photo, Tag};
use crate::error::Result;

/// Durable storage for catalog entities.
///
/// Every `first_or_create_*` operation is a lookup-or-create by natural key and
/// must be atomic: two callers racing on the same key get the same row.
pub trait CatalogStore {
    // === Photos ===

    /// Look up a photo (with camera, lens, location, country and tags) by canonical name.
    fn find_photo_by_canonical_name(&self, canonical_name: &str) -> Result<Option<Photo>>;

    /// Insert a new photo and link its tags. Sets `photo.id`.
    fn create_photo(&self, photo: &mut Photo) -> Result<()>;

    /// Persist an existing photo. Tags are added, never removed.
    fn save_photo(&self, photo: &Photo) -> Result<()>;

    /// The photo whose capture time is closest to `taken_at`, ignoring `exclude_id`.
    fn find_photo_nearest_date(
        &self,
        taken_at: DateTime<Utc>,
        exclude_id: Option<i64>,
    ) -> Result<Option<Photo>>;

    fn photo_tags(&self, photo_id: i64) -> Result<Vec<Tag>>;

    // === Files ===

    /// The primary JPEG of a photo, if one has been designated.
    fn find_primary_file(&self, photo_id: i64) -> Result<Option<File>>;

    /// A file matching either the content hash or the relative name.
    fn find_file(&self, hash: &str, name: &str) -> Result<Option<File>>;

    fn files_for_photo(&self, photo_id: i64) -> Result<Vec<File>>;

    /// Insert a new file. Sets `file.id`.
    fn create_file(&self, file: &mut File) -> Result<()>;

    fn save_file(&self, file: &File) -> Result<()>;

    /// Drop the primary flag from every file of the photo except `keep_id`.
    fn clear_primary(&self, photo_id: i64, keep_id: i64) -> Result<()>;

    // === Shared lookup-or-create tables ===

    /// Case-insensitive on the label; stores it lowercase.
    fn first_or_create_tag(&self, label: &str) -> Result<Tag>;

    fn first_or_create_camera(&self, model: &str, make: &str) -> Result<Camera>;

    fn first_or_create_lens(&self, model: &str, make: &str) -> Result<Lens>;

    fn first_or_create_location(&self, location: &Location) -> Result<Location>;

    fn first_or_create_country(&self, code: &str, name: &str) -> Result<Country>;

    // === Reporting ===

    fn stats(&self) -> Result<CatalogStats>;
}
