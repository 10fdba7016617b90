use rayon::prelude::*;
use std::path::Path;
use std::time::Instant;

use crate::classify::{Classifier, Label};
use crate::db::{CatalogStore, Tag};
use crate::error::Result;
use crate::media::{Media, ThumbnailKind};

/// Builds a photo's tag list from classifier output and location names.
#[derive(Clone, Copy)]
pub struct TagResolver<'a> {
    store: &'a dyn CatalogStore,
    classifier: Option<&'a dyn Classifier>,
    thumbnails_path: &'a Path,
}

impl<'a> TagResolver<'a> {
    pub fn new(
        store: &'a dyn CatalogStore,
        classifier: Option<&'a dyn Classifier>,
        thumbnails_path: &'a Path,
    ) -> Self {
        Self {
            store,
            classifier,
            thumbnails_path,
        }
    }

    /// Classify the JPEG and keep every label scoring above a third of the best one.
    ///
    /// Square images are classified from the centre thumbnail only; anything
    /// wider or taller also gets its left and right crops classified. A
    /// thumbnail that fails to render or classify is skipped.
    pub fn resolve_tags<M: Media>(&self, jpeg: &M) -> Result<Vec<Tag>> {
        let mut tags = Vec::new();

        let Some(classifier) = self.classifier else {
            return Ok(tags);
        };

        let kinds: &[ThumbnailKind] = if jpeg.aspect_ratio() == 1.0 {
            &[ThumbnailKind::Tile224]
        } else {
            &[ThumbnailKind::Tile224, ThumbnailKind::Left224, ThumbnailKind::Right224]
        };

        let start = Instant::now();
        let thumbnails_path = self.thumbnails_path;
        let mut labels: Vec<Label> = kinds
            .par_iter()
            .flat_map_iter(|kind| classify_thumbnail(classifier, jpeg, thumbnails_path, *kind))
            .collect();
        tracing::debug!(
            file = %jpeg.filename().display(),
            thumbnails = kinds.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Classified"
        );

        labels.sort_by(|a, b| b.probability.total_cmp(&a.probability));

        let Some(max) = labels.first().map(|l| l.probability) else {
            return Ok(tags);
        };

        for label in labels.iter().filter(|l| l.probability > max / 3.0) {
            self.append_tag(&mut tags, &label.label)?;
        }

        Ok(tags)
    }

    /// Append `label` as a catalog tag unless it is empty or already in `tags`.
    pub fn append_tag(&self, tags: &mut Vec<Tag>, label: &str) -> Result<()> {
        let label = label.trim().to_lowercase();

        if label.is_empty() || tags.iter().any(|t| t.label == label) {
            return Ok(());
        }

        tags.push(self.store.first_or_create_tag(&label)?);
        Ok(())
    }
}

fn classify_thumbnail<M: Media>(
    classifier: &dyn Classifier,
    jpeg: &M,
    thumbnails_path: &Path,
    kind: ThumbnailKind,
) -> Vec<Label> {
    let thumbnail = match jpeg.thumbnail(thumbnails_path, kind) {
        Ok(path) => path,
        Err(e) => {
            tracing::warn!(file = %jpeg.filename().display(), kind = kind.name(), error = %e, "Failed to create thumbnail");
            return Vec::new();
        }
    };

    classifier.classify(&thumbnail).unwrap_or_else(|e| {
        tracing::warn!(thumbnail = %thumbnail.display(), error = %e, "Failed to classify thumbnail");
        Vec::new()
    })
}
