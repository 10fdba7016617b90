//! Reverse geocoding.

mod nominatim;

use crate::db::Location;
use crate::error::Result;

pub use nominatim::Nominatim;

/// Resolves coordinates to a place.
pub trait Geocoder: Send + Sync {
    fn reverse(&self, lat: f64, lng: f64) -> Result<Location>;
}
