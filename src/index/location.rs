use super::TagResolver;
use crate::db::{CatalogStore, Location, Photo};
use crate::error::Result;
use crate::geo::Geocoder;
use crate::media::Media;

/// How a photo's location was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Geolocation {
    /// Reverse-geocoded from the file's own coordinates.
    Precise,
    /// Country borrowed from the photo taken closest in time.
    Approximate,
    Unknown,
}

pub struct LocationResolver<'a> {
    store: &'a dyn CatalogStore,
    geocoder: Option<&'a dyn Geocoder>,
    tags: TagResolver<'a>,
}

impl<'a> LocationResolver<'a> {
    pub fn new(
        store: &'a dyn CatalogStore,
        geocoder: Option<&'a dyn Geocoder>,
        tags: TagResolver<'a>,
    ) -> Self {
        Self {
            store,
            geocoder,
            tags,
        }
    }

    /// Set the photo's location and country, appending location tags to
    /// `photo.tags`. Falls back to [`approximate`](Self::approximate) when the
    /// file carries no usable coordinates.
    pub fn resolve<M: Media>(&self, photo: &mut Photo, media: &M) -> Result<Geolocation> {
        let Some(place) = self.lookup(media) else {
            tracing::debug!(file = %media.filename().display(), "Location cannot be determined precisely");
            return self.approximate(photo);
        };

        let location = self.store.first_or_create_location(&place)?;
        let country = self
            .store
            .first_or_create_country(&location.country_code, &location.country)?;

        // Places without a country code are tagged with the "Unknown" country
        let labels = [
            &location.city,
            &location.county,
            &country.name,
            &location.category,
            &location.name,
            &location.place_type,
        ];

        for label in labels {
            self.tags.append_tag(&mut photo.tags, label)?;
        }

        photo.location = Some(location);
        photo.country = Some(country);
        Ok(Geolocation::Precise)
    }

    /// Adopt the country of the photo taken closest in time to this one.
    ///
    /// Best effort: the neighbour may well have been taken elsewhere.
    pub fn approximate(&self, photo: &mut Photo) -> Result<Geolocation> {
        let exclude = (photo.id != 0).then_some(photo.id);

        let country = self
            .store
            .find_photo_nearest_date(photo.taken_at, exclude)?
            .and_then(|nearest| nearest.country);

        match country {
            Some(country) => {
                tracing::debug!(photo = %photo.canonical_name, country = %country.name, "Approximate location");
                photo.country = Some(country);
                Ok(Geolocation::Approximate)
            }
            None => Ok(Geolocation::Unknown),
        }
    }

    fn lookup<M: Media>(&self, media: &M) -> Option<Location> {
        let geocoder = self.geocoder?;
        let exif = media.exif().ok().filter(|e| e.has_coordinates())?;

        match geocoder.reverse(exif.lat, exif.lng) {
            Ok(location) => Some(location),
            Err(e) => {
                tracing::warn!(lat = exif.lat, lng = exif.lng, error = %e, "Reverse geocoding failed");
                None
            }
        }
    }
}
