use chrono::{DateTime, NaiveDate, Utc};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::ExifData;
use crate::error::Result;

pub fn read_exif(path: &Path) -> Result<ExifData> {
    let file = File::open(path)?;
    let mut bufreader = BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut bufreader)?;

    let mut data = ExifData {
        camera_make: ascii_field(&exif, exif::Tag::Make),
        camera_model: ascii_field(&exif, exif::Tag::Model),
        lens_make: ascii_field(&exif, exif::Tag::LensMake),
        lens_model: ascii_field(&exif, exif::Tag::LensModel),
        artist: ascii_field(&exif, exif::Tag::Artist),
        orientation: 1,
        ..Default::default()
    };

    // Focal length, in whole millimetres
    if let Some(value) = rational_field(&exif, exif::Tag::FocalLength) {
        data.focal_length = value.round() as i32;
    }

    // Aperture (FNumber)
    if let Some(value) = rational_field(&exif, exif::Tag::FNumber) {
        data.aperture = value;
    }

    if let Some(field) = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY) {
        if let Some(orientation) = field.value.get_uint(0) {
            data.orientation = orientation;
        }
    }

    // Date taken
    if let Some(field) = exif.get_field(exif::Tag::DateTimeOriginal, exif::In::PRIMARY) {
        if let exif::Value::Ascii(ref values) = field.value {
            if let Some(raw) = values.first() {
                if let Ok(dt) = exif::DateTime::from_ascii(raw) {
                    data.taken_at = exif_datetime_to_utc(&dt);
                }
            }
        }
    }

    // GPS coordinates
    if let (Some(lat_field), Some(lat_ref), Some(lon_field), Some(lon_ref)) = (
        exif.get_field(exif::Tag::GPSLatitude, exif::In::PRIMARY),
        exif.get_field(exif::Tag::GPSLatitudeRef, exif::In::PRIMARY),
        exif.get_field(exif::Tag::GPSLongitude, exif::In::PRIMARY),
        exif.get_field(exif::Tag::GPSLongitudeRef, exif::In::PRIMARY),
    ) {
        if let (exif::Value::Rational(lat_vals), exif::Value::Rational(lon_vals)) =
            (&lat_field.value, &lon_field.value)
        {
            if lat_vals.len() >= 3 && lon_vals.len() >= 3 {
                let lat = dms_to_decimal(lat_vals[0].to_f64(), lat_vals[1].to_f64(), lat_vals[2].to_f64());
                let lon = dms_to_decimal(lon_vals[0].to_f64(), lon_vals[1].to_f64(), lon_vals[2].to_f64());

                let lat_ref_str = lat_ref.display_value().to_string();
                let lon_ref_str = lon_ref.display_value().to_string();

                data.lat = if lat_ref_str.contains('S') { -lat } else { lat };
                data.lng = if lon_ref_str.contains('W') { -lon } else { lon };
            }
        }
    }

    Ok(data)
}

fn ascii_field(exif: &exif::Exif, tag: exif::Tag) -> String {
    exif.get_field(tag, exif::In::PRIMARY)
        .map(|field| field.display_value().to_string().trim_matches('"').trim().to_string())
        .unwrap_or_default()
}

fn rational_field(exif: &exif::Exif, tag: exif::Tag) -> Option<f64> {
    let field = exif.get_field(tag, exif::In::PRIMARY)?;
    match field.value {
        exif::Value::Rational(ref v) => v.first().filter(|r| r.denom != 0).map(|r| r.to_f64()),
        _ => None,
    }
}

fn exif_datetime_to_utc(dt: &exif::DateTime) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(dt.year as i32, dt.month as u32, dt.day as u32)
        .and_then(|date| date.and_hms_opt(dt.hour as u32, dt.minute as u32, dt.second as u32))
        .map(|naive| naive.and_utc())
}

fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64) -> f64 {
    degrees + minutes / 60.0 + seconds / 3600.0
}
