//! Color descriptors from a 3x3 reduction of a thumbnail.

use image::imageops::FilterType;
use image::DynamicImage;
use std::path::Path;

use crate::error::Result;

/// Named palette; the index is the hex digit used in `Colors::colors`.
const PALETTE: [(&str, [u8; 3]); 16] = [
    ("black", [0, 0, 0]),
    ("grey", [128, 128, 128]),
    ("brown", [139, 69, 19]),
    ("gold", [255, 215, 0]),
    ("white", [255, 255, 255]),
    ("purple", [128, 0, 128]),
    ("blue", [0, 0, 255]),
    ("cyan", [0, 255, 255]),
    ("teal", [0, 128, 128]),
    ("green", [0, 128, 0]),
    ("lime", [0, 255, 0]),
    ("yellow", [255, 255, 0]),
    ("magenta", [255, 0, 255]),
    ("orange", [255, 165, 0]),
    ("red", [255, 0, 0]),
    ("pink", [255, 192, 203]),
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Colors {
    /// Most frequent palette color name.
    pub main_color: String,
    /// One hex palette index per cell, row-major.
    pub colors: String,
    /// One hex luminance digit (0-F) per cell.
    pub luminance: String,
    /// Mean saturation in percent.
    pub chroma: u32,
}

pub fn extract(thumbnail: &Path) -> Result<Colors> {
    let img = image::open(thumbnail)?;
    Ok(from_image(&img))
}

pub fn from_image(img: &DynamicImage) -> Colors {
    let cells = img.resize_exact(3, 3, FilterType::Triangle).to_rgb8();

    let mut counts = [0usize; PALETTE.len()];
    let mut colors = String::with_capacity(9);
    let mut luminance = String::with_capacity(9);
    let mut chroma_sum = 0.0;

    for pixel in cells.pixels() {
        let [r, g, b] = pixel.0;

        let index = nearest_palette_index([r, g, b]);
        counts[index] += 1;
        colors.push_str(&format!("{:X}", index));

        let lum = (0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64) / 255.0 * 15.0;
        luminance.push_str(&format!("{:X}", lum.round() as u8));

        let max = r.max(g).max(b) as f64;
        let min = r.min(g).min(b) as f64;
        chroma_sum += (max - min) / 255.0 * 100.0;
    }

    let mut main = 0;
    for (index, &count) in counts.iter().enumerate() {
        if count > counts[main] {
            main = index;
        }
    }

    Colors {
        main_color: PALETTE[main].0.to_string(),
        colors,
        luminance,
        chroma: (chroma_sum / 9.0).round() as u32,
    }
}

fn nearest_palette_index(rgb: [u8; 3]) -> usize {
    let distance = |color: &[u8; 3]| -> i32 {
        (0..3)
            .map(|i| {
                let d = rgb[i] as i32 - color[i] as i32;
                d * d
            })
            .sum()
    };

    PALETTE
        .iter()
        .enumerate()
        .min_by_key(|(_, (_, color))| distance(color))
        .map(|(index, _)| index)
        .unwrap_or(0)
}
