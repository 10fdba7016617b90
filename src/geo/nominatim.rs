use anyhow::anyhow;
use serde::Deserialize;
use std::time::Duration;

use super::Geocoder;
use crate::config::GeocoderConfig;
use crate::db::{Location, UNKNOWN, UNKNOWN_COUNTRY_CODE};
use crate::error::{Error, Result};

/// OpenStreetMap Nominatim reverse geocoder.
pub struct Nominatim {
    agent: ureq::Agent,
    endpoint: String,
}

impl Nominatim {
    pub fn new(config: &GeocoderConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(30))
            .build();

        Self {
            agent,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        }
    }
}

impl Geocoder for Nominatim {
    fn reverse(&self, lat: f64, lng: f64) -> Result<Location> {
        let url = format!("{}/reverse", self.endpoint);

        let response = self
            .agent
            .get(&url)
            .query("format", "jsonv2")
            .query("addressdetails", "1")
            .query("zoom", "18")
            .query("lat", &lat.to_string())
            .query("lon", &lng.to_string())
            .call()
            .map_err(|e| Error::Geocoder(anyhow!("reverse lookup failed: {}", e)))?;

        let place: NominatimPlace = serde_json::from_reader(response.into_reader())
            .map_err(|e| Error::Geocoder(anyhow!("invalid response: {}", e)))?;

        place
            .into_location()
            .ok_or(Error::LocationNotFound { lat, lng })
    }
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    place_id: Option<i64>,
    #[serde(default)]
    lat: String,
    #[serde(default)]
    lon: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    category: String,
    #[serde(default, rename = "type")]
    place_type: String,
    #[serde(default)]
    address: Address,
}

#[derive(Debug, Default, Deserialize)]
struct Address {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    county: Option<String>,
    state: Option<String>,
    country: Option<String>,
    country_code: Option<String>,
}

impl NominatimPlace {
    /// `None` when Nominatim answered with an error object instead of a place.
    fn into_location(self) -> Option<Location> {
        let id = self.place_id?;
        let address = self.address;

        let city = address
            .city
            .or(address.town)
            .or(address.village)
            .unwrap_or_default();

        let (country_code, country) = match address.country_code.filter(|c| !c.is_empty()) {
            Some(code) => (code.to_lowercase(), address.country.unwrap_or_default()),
            None => (UNKNOWN_COUNTRY_CODE.to_string(), UNKNOWN.to_string()),
        };

        Some(Location {
            id,
            lat: self.lat.parse().unwrap_or_default(),
            lng: self.lon.parse().unwrap_or_default(),
            name: self.name,
            category: self.category,
            place_type: self.place_type,
            city,
            county: address.county.unwrap_or_default(),
            state: address.state.unwrap_or_default(),
            country,
            country_code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_place() {
        let json = r#"{
            "place_id": 88812345,
            "lat": "48.8582599",
            "lon": "2.2945006",
            "category": "tourism",
            "type": "attraction",
            "name": "Tour Eiffel",
            "display_name": "Tour Eiffel, 5, Avenue Anatole France, Paris, France",
            "address": {
                "tourism": "Tour Eiffel",
                "town": "Paris",
                "county": "Paris",
                "state": "Île-de-France",
                "country": "France",
                "country_code": "FR"
            }
        }"#;

        let place: NominatimPlace = serde_json::from_str(json).unwrap();
        let location = place.into_location().unwrap();

        assert_eq!(location.id, 88812345);
        assert_eq!(location.name, "Tour Eiffel");
        assert_eq!(location.category, "tourism");
        assert_eq!(location.place_type, "attraction");
        assert_eq!(location.city, "Paris");
        assert_eq!(location.country_code, "fr");
        assert_eq!(location.country, "France");
        assert!((location.lat - 48.8582599).abs() < 1e-9);
    }

    #[test]
    fn test_parse_place_without_country() {
        let json = r#"{"place_id": 7, "lat": "0.5", "lon": "-30.1", "name": "", "address": {}}"#;

        let location = serde_json::from_str::<NominatimPlace>(json)
            .unwrap()
            .into_location()
            .unwrap();

        assert_eq!(location.country_code, UNKNOWN_COUNTRY_CODE);
        assert_eq!(location.country, UNKNOWN);
        assert!(location.city.is_empty());
    }

    #[test]
    fn test_parse_error_response() {
        let json = r#"{"error": "Unable to geocode"}"#;
        let place: NominatimPlace = serde_json::from_str(json).unwrap();
        assert!(place.into_location().is_none());
    }
}
