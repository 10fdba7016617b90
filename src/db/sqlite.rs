//! SQLite backend implementation.

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

use super::backend::CatalogStore;
use super::models::{
    CatalogStats, Camera, Country, File, Lens, Location, Photo, Tag, UNKNOWN, UNKNOWN_COUNTRY_CODE,
};
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::media::FileType;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const PHOTO_COLUMNS: &str = "id, canonical_name, taken_at, title, favorite, lat, lng, artist, \
     focal_length, aperture, camera_id, lens_id, location_id, country_code, created_at, updated_at";

const FILE_COLUMNS: &str = "id, photo_id, name, hash, file_type, mime, orientation, width, height, \
     aspect_ratio, portrait, main_color, colors, luminance, chroma, is_primary, missing";

const LOCATION_COLUMNS: &str =
    "id, lat, lng, name, category, place_type, city, county, state, country, country_code";

pub struct SqliteCatalog {
    pub(crate) conn: Connection,
}

/// A photo row before its references are resolved.
struct PhotoRow {
    id: i64,
    canonical_name: String,
    taken_at: String,
    title: Option<String>,
    favorite: bool,
    lat: f64,
    lng: f64,
    artist: String,
    focal_length: i32,
    aperture: f64,
    camera_id: Option<i64>,
    lens_id: Option<i64>,
    location_id: Option<i64>,
    country_code: Option<String>,
    created_at: String,
    updated_at: String,
}

impl SqliteCatalog {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    pub fn initialize(&self) -> Result<()> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    fn hydrate_photo(&self, row: PhotoRow) -> Result<Photo> {
        let camera = match row.camera_id {
            Some(id) => self.get_camera(id)?,
            None => None,
        };
        let lens = match row.lens_id {
            Some(id) => self.get_lens(id)?,
            None => None,
        };
        let location = match row.location_id {
            Some(id) => self.get_location(id)?,
            None => None,
        };
        let country = match row.country_code.as_deref() {
            Some(code) => self.get_country(code)?,
            None => None,
        };

        Ok(Photo {
            id: row.id,
            canonical_name: row.canonical_name,
            taken_at: parse_timestamp(&row.taken_at)?,
            title: row.title,
            favorite: row.favorite,
            lat: row.lat,
            lng: row.lng,
            artist: row.artist,
            focal_length: row.focal_length,
            aperture: row.aperture,
            camera,
            lens,
            location,
            country,
            tags: self.photo_tags(row.id)?,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }

    fn get_camera(&self, id: i64) -> Result<Option<Camera>> {
        let camera = self
            .conn
            .query_row(
                "SELECT id, model, make FROM cameras WHERE id = ?",
                [id],
                |row| Ok(Camera { id: row.get(0)?, model: row.get(1)?, make: row.get(2)? }),
            )
            .optional()?;
        Ok(camera)
    }

    fn get_lens(&self, id: i64) -> Result<Option<Lens>> {
        let lens = self
            .conn
            .query_row(
                "SELECT id, model, make FROM lenses WHERE id = ?",
                [id],
                |row| Ok(Lens { id: row.get(0)?, model: row.get(1)?, make: row.get(2)? }),
            )
            .optional()?;
        Ok(lens)
    }

    fn get_location(&self, id: i64) -> Result<Option<Location>> {
        let location = self
            .conn
            .query_row(
                &format!("SELECT {} FROM locations WHERE id = ?", LOCATION_COLUMNS),
                [id],
                row_to_location,
            )
            .optional()?;
        Ok(location)
    }

    fn get_country(&self, code: &str) -> Result<Option<Country>> {
        let country = self
            .conn
            .query_row(
                "SELECT code, name FROM countries WHERE code = ?",
                [code],
                |row| Ok(Country { code: row.get(0)?, name: row.get(1)? }),
            )
            .optional()?;
        Ok(country)
    }

    fn link_tags(&self, photo: &Photo) -> Result<()> {
        for tag in &photo.tags {
            self.conn.execute(
                "INSERT OR IGNORE INTO photo_tags (photo_id, tag_id) VALUES (?, ?)",
                rusqlite::params![photo.id, tag.id],
            )?;
        }
        Ok(())
    }

    fn count(&self, table: &str) -> Result<i64> {
        let count = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count)
    }
}

impl CatalogStore for SqliteCatalog {
    // ========================================================================
    // Photo operations
    // ========================================================================

    fn find_photo_by_canonical_name(&self, canonical_name: &str) -> Result<Option<Photo>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {} FROM photos WHERE canonical_name = ?", PHOTO_COLUMNS),
                [canonical_name],
                row_to_photo,
            )
            .optional()?;

        row.map(|row| self.hydrate_photo(row)).transpose()
    }

    fn create_photo(&self, photo: &mut Photo) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO photos (
                canonical_name, taken_at, title, favorite, lat, lng, artist,
                focal_length, aperture, camera_id, lens_id, location_id, country_code,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            rusqlite::params![
                photo.canonical_name,
                format_timestamp(&photo.taken_at),
                photo.title,
                photo.favorite,
                photo.lat,
                photo.lng,
                photo.artist,
                photo.focal_length,
                photo.aperture,
                photo.camera.as_ref().map(|c| c.id),
                photo.lens.as_ref().map(|l| l.id),
                photo.location.as_ref().map(|l| l.id),
                photo.country.as_ref().map(|c| c.code.as_str()),
                format_timestamp(&photo.created_at),
                format_timestamp(&photo.updated_at),
            ],
        )?;
        photo.id = self.conn.last_insert_rowid();
        self.link_tags(photo)?;
        Ok(())
    }

    fn save_photo(&self, photo: &Photo) -> Result<()> {
        self.conn.execute(
            r#"
            UPDATE photos SET
                canonical_name = ?, taken_at = ?, title = ?, favorite = ?,
                lat = ?, lng = ?, artist = ?, focal_length = ?, aperture = ?,
                camera_id = ?, lens_id = ?, location_id = ?, country_code = ?,
                updated_at = ?
            WHERE id = ?
            "#,
            rusqlite::params![
                photo.canonical_name,
                format_timestamp(&photo.taken_at),
                photo.title,
                photo.favorite,
                photo.lat,
                photo.lng,
                photo.artist,
                photo.focal_length,
                photo.aperture,
                photo.camera.as_ref().map(|c| c.id),
                photo.lens.as_ref().map(|l| l.id),
                photo.location.as_ref().map(|l| l.id),
                photo.country.as_ref().map(|c| c.code.as_str()),
                format_timestamp(&photo.updated_at),
                photo.id,
            ],
        )?;
        self.link_tags(photo)?;
        Ok(())
    }

    fn find_photo_nearest_date(
        &self,
        taken_at: DateTime<Utc>,
        exclude_id: Option<i64>,
    ) -> Result<Option<Photo>> {
        let row = self
            .conn
            .query_row(
                &format!(
                    r#"
                    SELECT {} FROM photos
                    WHERE id != ?1
                    ORDER BY ABS(julianday(taken_at) - julianday(?2)) ASC, id ASC
                    LIMIT 1
                    "#,
                    PHOTO_COLUMNS
                ),
                rusqlite::params![exclude_id.unwrap_or(-1), format_timestamp(&taken_at)],
                row_to_photo,
            )
            .optional()?;

        row.map(|row| self.hydrate_photo(row)).transpose()
    }

    fn photo_tags(&self, photo_id: i64) -> Result<Vec<Tag>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT t.id, t.label
            FROM tags t
            JOIN photo_tags pt ON pt.tag_id = t.id
            WHERE pt.photo_id = ?
            ORDER BY t.id
            "#,
        )?;
        let tags = stmt
            .query_map([photo_id], |row| Ok(Tag { id: row.get(0)?, label: row.get(1)? }))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }

    // ========================================================================
    // File operations
    // ========================================================================

    fn find_primary_file(&self, photo_id: i64) -> Result<Option<File>> {
        let file = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM files WHERE photo_id = ? AND file_type = ? AND is_primary = 1 LIMIT 1",
                    FILE_COLUMNS
                ),
                rusqlite::params![photo_id, FileType::Jpeg.as_str()],
                row_to_file,
            )
            .optional()?;
        Ok(file)
    }

    fn find_file(&self, hash: &str, name: &str) -> Result<Option<File>> {
        // Prefer the row carrying this name so a rename-by-hash never collides
        // with another row's unique name.
        let file = self
            .conn
            .query_row(
                &format!(
                    r#"
                    SELECT {} FROM files
                    WHERE hash = ?1 OR name = ?2
                    ORDER BY CASE WHEN name = ?2 THEN 0 ELSE 1 END, id
                    LIMIT 1
                    "#,
                    FILE_COLUMNS
                ),
                rusqlite::params![hash, name],
                row_to_file,
            )
            .optional()?;
        Ok(file)
    }

    fn files_for_photo(&self, photo_id: i64) -> Result<Vec<File>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM files WHERE photo_id = ? ORDER BY name",
            FILE_COLUMNS
        ))?;
        let files = stmt
            .query_map([photo_id], row_to_file)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(files)
    }

    fn create_file(&self, file: &mut File) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO files (
                photo_id, name, hash, file_type, mime, orientation, width, height,
                aspect_ratio, portrait, main_color, colors, luminance, chroma,
                is_primary, missing
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            rusqlite::params![
                file.photo_id,
                file.name,
                file.hash,
                file.file_type.as_str(),
                file.mime,
                file.orientation,
                file.width,
                file.height,
                file.aspect_ratio,
                file.portrait,
                file.main_color,
                file.colors,
                file.luminance,
                file.chroma,
                file.primary,
                file.missing,
            ],
        )?;
        file.id = self.conn.last_insert_rowid();
        Ok(())
    }

    fn save_file(&self, file: &File) -> Result<()> {
        self.conn.execute(
            r#"
            UPDATE files SET
                photo_id = ?, name = ?, hash = ?, file_type = ?, mime = ?, orientation = ?,
                width = ?, height = ?, aspect_ratio = ?, portrait = ?,
                main_color = ?, colors = ?, luminance = ?, chroma = ?,
                is_primary = ?, missing = ?, updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
            rusqlite::params![
                file.photo_id,
                file.name,
                file.hash,
                file.file_type.as_str(),
                file.mime,
                file.orientation,
                file.width,
                file.height,
                file.aspect_ratio,
                file.portrait,
                file.main_color,
                file.colors,
                file.luminance,
                file.chroma,
                file.primary,
                file.missing,
                file.id,
            ],
        )?;
        Ok(())
    }

    fn clear_primary(&self, photo_id: i64, keep_id: i64) -> Result<()> {
        self.conn.execute(
            "UPDATE files SET is_primary = 0 WHERE photo_id = ? AND id != ? AND is_primary = 1",
            rusqlite::params![photo_id, keep_id],
        )?;
        Ok(())
    }

    // ========================================================================
    // Lookup-or-create
    // ========================================================================

    fn first_or_create_tag(&self, label: &str) -> Result<Tag> {
        let label = label.to_lowercase();
        self.conn
            .execute("INSERT OR IGNORE INTO tags (label) VALUES (?)", [&label])?;
        let tag = self.conn.query_row(
            "SELECT id, label FROM tags WHERE label = ?",
            [&label],
            |row| Ok(Tag { id: row.get(0)?, label: row.get(1)? }),
        )?;
        Ok(tag)
    }

    fn first_or_create_camera(&self, model: &str, make: &str) -> Result<Camera> {
        let model = if model.is_empty() { UNKNOWN } else { model };
        self.conn.execute(
            "INSERT OR IGNORE INTO cameras (model, make) VALUES (?, ?)",
            rusqlite::params![model, make],
        )?;
        let camera = self.conn.query_row(
            "SELECT id, model, make FROM cameras WHERE model = ? AND make = ?",
            rusqlite::params![model, make],
            |row| Ok(Camera { id: row.get(0)?, model: row.get(1)?, make: row.get(2)? }),
        )?;
        Ok(camera)
    }

    fn first_or_create_lens(&self, model: &str, make: &str) -> Result<Lens> {
        let model = if model.is_empty() { UNKNOWN } else { model };
        self.conn.execute(
            "INSERT OR IGNORE INTO lenses (model, make) VALUES (?, ?)",
            rusqlite::params![model, make],
        )?;
        let lens = self.conn.query_row(
            "SELECT id, model, make FROM lenses WHERE model = ? AND make = ?",
            rusqlite::params![model, make],
            |row| Ok(Lens { id: row.get(0)?, model: row.get(1)?, make: row.get(2)? }),
        )?;
        Ok(lens)
    }

    fn first_or_create_location(&self, location: &Location) -> Result<Location> {
        self.conn.execute(
            &format!(
                "INSERT OR IGNORE INTO locations ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                LOCATION_COLUMNS
            ),
            rusqlite::params![
                location.id,
                location.lat,
                location.lng,
                location.name,
                location.category,
                location.place_type,
                location.city,
                location.county,
                location.state,
                location.country,
                location.country_code,
            ],
        )?;
        let stored = self.conn.query_row(
            &format!("SELECT {} FROM locations WHERE id = ?", LOCATION_COLUMNS),
            [location.id],
            row_to_location,
        )?;
        Ok(stored)
    }

    fn first_or_create_country(&self, code: &str, name: &str) -> Result<Country> {
        let (code, name) = if code.is_empty() {
            (UNKNOWN_COUNTRY_CODE.to_string(), UNKNOWN)
        } else {
            (code.to_lowercase(), name)
        };
        self.conn.execute(
            "INSERT OR IGNORE INTO countries (code, name) VALUES (?, ?)",
            rusqlite::params![code, name],
        )?;
        let country = self.conn.query_row(
            "SELECT code, name FROM countries WHERE code = ?",
            [&code],
            |row| Ok(Country { code: row.get(0)?, name: row.get(1)? }),
        )?;
        Ok(country)
    }

    fn stats(&self) -> Result<CatalogStats> {
        Ok(CatalogStats {
            photos: self.count("photos")?,
            files: self.count("files")?,
            tags: self.count("tags")?,
            cameras: self.count("cameras")?,
            lenses: self.count("lenses")?,
            locations: self.count("locations")?,
            countries: self.count("countries")?,
        })
    }
}

fn row_to_photo(row: &rusqlite::Row) -> rusqlite::Result<PhotoRow> {
    Ok(PhotoRow {
        id: row.get(0)?,
        canonical_name: row.get(1)?,
        taken_at: row.get(2)?,
        title: row.get(3)?,
        favorite: row.get(4)?,
        lat: row.get(5)?,
        lng: row.get(6)?,
        artist: row.get(7)?,
        focal_length: row.get(8)?,
        aperture: row.get(9)?,
        camera_id: row.get(10)?,
        lens_id: row.get(11)?,
        location_id: row.get(12)?,
        country_code: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}

fn row_to_file(row: &rusqlite::Row) -> rusqlite::Result<File> {
    let file_type: String = row.get(4)?;
    Ok(File {
        id: row.get(0)?,
        photo_id: row.get(1)?,
        name: row.get(2)?,
        hash: row.get(3)?,
        file_type: FileType::from_type_str(&file_type),
        mime: row.get(5)?,
        orientation: row.get(6)?,
        width: row.get(7)?,
        height: row.get(8)?,
        aspect_ratio: row.get(9)?,
        portrait: row.get(10)?,
        main_color: row.get(11)?,
        colors: row.get(12)?,
        luminance: row.get(13)?,
        chroma: row.get(14)?,
        primary: row.get(15)?,
        missing: row.get(16)?,
    })
}

fn row_to_location(row: &rusqlite::Row) -> rusqlite::Result<Location> {
    Ok(Location {
        id: row.get(0)?,
        lat: row.get(1)?,
        lng: row.get(2)?,
        name: row.get(3)?,
        category: row.get(4)?,
        place_type: row.get(5)?,
        city: row.get(6)?,
        county: row.get(7)?,
        state: row.get(8)?,
        country: row.get(9)?,
        country_code: row.get(10)?,
    })
}

fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(timestamp: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)
        .map(|dt| dt.and_utc())
        .map_err(|_| Error::InvalidTimestamp(timestamp.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn catalog() -> SqliteCatalog {
        let catalog = SqliteCatalog::open_in_memory().unwrap();
        catalog.initialize().unwrap();
        catalog
    }

    fn photo_at(catalog: &SqliteCatalog, name: &str, taken_at: DateTime<Utc>, country: Option<Country>) -> Photo {
        let mut photo = Photo::new(name, taken_at);
        photo.country = country;
        catalog.create_photo(&mut photo).unwrap();
        photo
    }

    #[test]
    fn test_tag_lookup_is_case_insensitive() {
        let catalog = catalog();

        let first = catalog.first_or_create_tag("Paris").unwrap();
        let second = catalog.first_or_create_tag("PARIS").unwrap();

        assert_eq!(first, second);
        assert_eq!(first.label, "paris");
        assert_eq!(catalog.stats().unwrap().tags, 1);
    }

    #[test]
    fn test_camera_without_model_is_unknown() {
        let catalog = catalog();

        let a = catalog.first_or_create_camera("", "").unwrap();
        let b = catalog.first_or_create_camera("", "").unwrap();
        let c = catalog.first_or_create_camera("X-T3", "FUJIFILM").unwrap();

        assert_eq!(a, b);
        assert!(a.is_unknown());
        assert_ne!(a.id, c.id);
        assert_eq!(catalog.stats().unwrap().cameras, 2);
    }

    #[test]
    fn test_country_without_code_maps_to_unknown() {
        let catalog = catalog();

        let unknown = catalog.first_or_create_country("", "").unwrap();
        assert_eq!(unknown.code, UNKNOWN_COUNTRY_CODE);

        let france = catalog.first_or_create_country("FR", "France").unwrap();
        assert_eq!(france.code, "fr");
        assert_eq!(catalog.first_or_create_country("fr", "Frankreich").unwrap().name, "France");
    }

    #[test]
    fn test_photo_roundtrip_with_references() {
        let catalog = catalog();
        let taken_at = Utc.with_ymd_and_hms(2021, 6, 1, 12, 30, 0).unwrap();

        let mut photo = Photo::new("IMG_0001", taken_at);
        photo.title = Some("Sunset / June 2021".to_string());
        photo.camera = Some(catalog.first_or_create_camera("iPhone X", "Apple").unwrap());
        photo.country = Some(catalog.first_or_create_country("de", "Germany").unwrap());
        photo.tags = vec![
            catalog.first_or_create_tag("beach").unwrap(),
            catalog.first_or_create_tag("sea").unwrap(),
        ];
        catalog.create_photo(&mut photo).unwrap();

        let loaded = catalog.find_photo_by_canonical_name("IMG_0001").unwrap().unwrap();
        assert_eq!(loaded.id, photo.id);
        assert_eq!(loaded.taken_at, taken_at);
        assert_eq!(loaded.title.as_deref(), Some("Sunset / June 2021"));
        assert_eq!(loaded.camera.unwrap().model, "iPhone X");
        assert_eq!(loaded.country.unwrap().code, "de");
        assert_eq!(loaded.tags.len(), 2);
        assert!(catalog.find_photo_by_canonical_name("IMG_0002").unwrap().is_none());
    }

    #[test]
    fn test_nearest_date_excludes_self() {
        let catalog = catalog();
        let italy = catalog.first_or_create_country("it", "Italy").unwrap();
        let spain = catalog.first_or_create_country("es", "Spain").unwrap();

        let near = photo_at(&catalog, "near", Utc.with_ymd_and_hms(2020, 5, 10, 0, 0, 0).unwrap(), Some(italy));
        photo_at(&catalog, "far", Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap(), Some(spain));

        let target = Utc.with_ymd_and_hms(2020, 5, 12, 0, 0, 0).unwrap();
        let found = catalog.find_photo_nearest_date(target, None).unwrap().unwrap();
        assert_eq!(found.canonical_name, "near");
        assert_eq!(found.country.unwrap().code, "it");

        let found = catalog.find_photo_nearest_date(target, Some(near.id)).unwrap().unwrap();
        assert_eq!(found.canonical_name, "far");
    }

    #[test]
    fn test_nearest_date_on_empty_catalog() {
        let catalog = catalog();
        assert!(catalog.find_photo_nearest_date(Utc::now(), None).unwrap().is_none());
    }

    #[test]
    fn test_find_file_by_hash_or_name() {
        let catalog = catalog();
        let mut photo = Photo::new("IMG_0001", Utc::now());
        catalog.create_photo(&mut photo).unwrap();

        let mut file = File {
            photo_id: photo.id,
            name: "2021/IMG_0001.jpg".to_string(),
            hash: "abc".to_string(),
            file_type: FileType::Jpeg,
            primary: true,
            ..Default::default()
        };
        catalog.create_file(&mut file).unwrap();

        assert_eq!(catalog.find_file("abc", "moved/IMG_0001.jpg").unwrap().unwrap().id, file.id);
        assert_eq!(catalog.find_file("changed", "2021/IMG_0001.jpg").unwrap().unwrap().id, file.id);
        assert!(catalog.find_file("other", "other.jpg").unwrap().is_none());

        let primary = catalog.find_primary_file(photo.id).unwrap().unwrap();
        assert_eq!(primary.file_type, FileType::Jpeg);
        assert!(primary.primary);
    }

    #[test]
    fn test_clear_primary_keeps_one_file() {
        let catalog = catalog();
        let mut photo = Photo::new("IMG_0002", Utc::now());
        catalog.create_photo(&mut photo).unwrap();

        let mut ids = Vec::new();
        for name in ["a/IMG_0002.jpg", "b/IMG_0002.jpg"] {
            let mut file = File {
                photo_id: photo.id,
                name: name.to_string(),
                hash: name.to_string(),
                file_type: FileType::Jpeg,
                primary: true,
                ..Default::default()
            };
            catalog.create_file(&mut file).unwrap();
            ids.push(file.id);
        }

        catalog.clear_primary(photo.id, ids[1]).unwrap();

        let primaries: Vec<i64> = catalog
            .files_for_photo(photo.id)
            .unwrap()
            .into_iter()
            .filter(|f| f.primary)
            .map(|f| f.id)
            .collect();
        assert_eq!(primaries, [ids[1]]);
    }
}
