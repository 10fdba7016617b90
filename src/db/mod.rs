mod schema;
pub mod backend;
pub mod models;
pub mod sqlite;

pub use backend::CatalogStore;
pub use models::{
    CatalogStats, Camera, Country, File, Lens, Location, Photo, Tag, UNKNOWN, UNKNOWN_COUNTRY_CODE,
};
pub use schema::SCHEMA;
pub use sqlite::SqliteCatalog;
