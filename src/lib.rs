//! Photo catalog indexing.
//!
//! Walks a tree of originals, groups related files (RAW, JPEG, sidecars) into
//! logical photos and enriches them with EXIF data, classifier tags, reverse
//! geocoded locations and generated titles, storing everything in a SQLite
//! catalog.

pub mod classify;
pub mod config;
pub mod db;
pub mod error;
pub mod geo;
pub mod index;
pub mod logging;
pub mod media;

pub use error::{Error, Result};
