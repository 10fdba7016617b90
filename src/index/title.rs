//! Display titles for photos that have none.

use chrono::{DateTime, Timelike, Utc};

use crate::db::{Camera, Location, Tag};

/// Place names at least this long are too long to also show the city.
const LONG_NAME: usize = 40;

/// Derive a title from what is known about a photo. The first rule that
/// applies wins:
///
/// 1. long place name: `Name / 2021`
/// 2. place name and city: `Name / City / 2021`
/// 3. city and country: `City / Country / 2021`
/// 4. county and country: `County / Country / 2021`
/// 5. first tag: `Tag / 2021`
/// 6. known camera: `Camera / June 2021`
/// 7. time of day: `Sunset / June 2021`
pub fn compose(
    location: Option<&Location>,
    tags: &[Tag],
    camera: Option<&Camera>,
    taken_at: DateTime<Utc>,
) -> String {
    let year = taken_at.format("%Y").to_string();

    if let Some(title) = location.and_then(|l| location_title(l, &year)) {
        return title;
    }

    if let Some(tag) = tags.first() {
        return format!("{} / {}", title_case(&tag.label), year);
    }

    let month_year = taken_at.format("%B %Y");

    if let Some(camera) = camera.filter(|c| !c.is_unknown()) {
        let name = camera.to_string();
        if !name.is_empty() {
            return format!("{} / {}", name, month_year);
        }
    }

    format!("{} / {}", daytime(taken_at.hour()), month_year)
}

fn location_title(location: &Location, year: &str) -> Option<String> {
    let has_country = !location.country.is_empty();

    if !location.name.is_empty() && !location.city.is_empty() {
        let name = title_case(&location.name);
        if location.name.chars().count() >= LONG_NAME {
            return Some(format!("{} / {}", name, year));
        }
        return Some(format!("{} / {} / {}", name, location.city, year));
    }

    if !location.city.is_empty() && has_country {
        return Some(format!("{} / {} / {}", location.city, location.country, year));
    }

    if !location.county.is_empty() && has_country {
        return Some(format!("{} / {} / {}", location.county, location.country, year));
    }

    None
}

fn daytime(hour: u32) -> &'static str {
    match hour {
        0..=7 => "Early Bird",
        8..=11 => "Morning Mood",
        12..=16 => "Carpe Diem",
        17..=19 => "Sunset",
        _ => "Late Night",
    }
}

/// Upper-case the first letter of every word. Other letters are left alone.
pub fn title_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut word_start = true;

    for c in s.chars() {
        if word_start {
            result.extend(c.to_uppercase());
        } else {
            result.push(c);
        }
        word_start = !c.is_alphanumeric();
    }

    result
}
