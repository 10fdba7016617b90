use image::imageops::FilterType;
use image::DynamicImage;
use std::fs;
use std::path::{Path, PathBuf};

use super::ThumbnailKind;
use crate::error::Result;

/// Cache location for a thumbnail, sharded by the first two hash characters.
pub fn thumbnail_path(thumbnails_path: &Path, hash: &str, kind: ThumbnailKind) -> PathBuf {
    let shard = hash.get(..2).unwrap_or("00");
    thumbnails_path
        .join(shard)
        .join(format!("{}_{}.jpg", hash, kind.name()))
}

/// Generate and cache a thumbnail. Returns the path to the cached file.
pub fn create(original: &Path, hash: &str, thumbnails_path: &Path, kind: ThumbnailKind) -> Result<PathBuf> {
    let cache_path = thumbnail_path(thumbnails_path, hash, kind);

    if cache_path.exists() {
        return Ok(cache_path);
    }

    if let Some(parent) = cache_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let img = image::open(original)?;
    let thumbnail = render(&img, kind);

    // JPEG has no alpha channel
    DynamicImage::ImageRgb8(thumbnail.to_rgb8()).save(&cache_path)?;

    Ok(cache_path)
}

/// Square crop (centre, left or right edge) scaled to 224x224.
pub fn render(img: &DynamicImage, kind: ThumbnailKind) -> DynamicImage {
    let (width, height) = (img.width(), img.height());
    let side = width.min(height);
    let y = (height - side) / 2;

    let x = match kind {
        ThumbnailKind::Tile224 => (width - side) / 2,
        ThumbnailKind::Left224 => 0,
        ThumbnailKind::Right224 => width - side,
    };

    img.crop_imm(x, y, side, side).resize_exact(
        ThumbnailKind::SIZE,
        ThumbnailKind::SIZE,
        FilterType::Triangle,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::tempdir;

    fn split_image() -> DynamicImage {
        // Left half black, right half white
        let img = RgbImage::from_fn(300, 100, |x, _| {
            if x < 150 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_render_crops() {
        let img = split_image();

        let left = render(&img, ThumbnailKind::Left224).to_rgb8();
        let right = render(&img, ThumbnailKind::Right224).to_rgb8();

        assert_eq!(left.dimensions(), (224, 224));
        assert_eq!(left.get_pixel(112, 112), &Rgb([0, 0, 0]));
        assert_eq!(right.get_pixel(112, 112), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_create_caches_by_hash() {
        let dir = tempdir().unwrap();
        let original = dir.path().join("wide.png");
        split_image().save(&original).unwrap();
        let thumbs = dir.path().join("thumbs");

        let path = create(&original, "abcdef", &thumbs, ThumbnailKind::Tile224).unwrap();
        assert_eq!(path, thumbs.join("ab").join("abcdef_tile_224.jpg"));
        assert!(path.exists());

        // Served from cache even when the original is gone
        fs::remove_file(&original).unwrap();
        assert_eq!(create(&original, "abcdef", &thumbs, ThumbnailKind::Tile224).unwrap(), path);
    }
}
