use std::path::Path;
use walkdir::{DirEntry, WalkDir};

use super::{GroupIndexer, IndexedFiles, RecordMerger};
use crate::classify::Classifier;
use crate::db::CatalogStore;
use crate::geo::Geocoder;
use crate::media::{Media, MediaFile};

/// Walks the originals tree and indexes every photo group it finds.
pub struct TreeIndexer<'a> {
    groups: GroupIndexer<'a>,
    originals_path: &'a Path,
}

impl<'a> TreeIndexer<'a> {
    pub fn new(
        store: &'a dyn CatalogStore,
        classifier: Option<&'a dyn Classifier>,
        geocoder: Option<&'a dyn Geocoder>,
        originals_path: &'a Path,
        thumbnails_path: &'a Path,
    ) -> Self {
        let merger = RecordMerger::new(store, classifier, geocoder, originals_path, thumbnails_path);
        Self {
            groups: GroupIndexer::new(merger),
            originals_path,
        }
    }

    /// Index every unvisited photo under the originals root.
    ///
    /// Hidden files and directories are skipped, as are files that only ever
    /// join a group (sidecars, videos). Unreadable entries are skipped too.
    pub fn index_all(&self) -> IndexedFiles {
        let mut indexed = IndexedFiles::new();

        let walker = WalkDir::new(self.originals_path)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    tracing::warn!(path = %self.originals_path.display(), error = %e, "Could not walk originals");
                    break;
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping unreadable entry");
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                continue;
            }

            let media = match MediaFile::open(entry.path()) {
                Ok(media) => media,
                Err(e) => {
                    tracing::debug!(path = %entry.path().display(), error = %e, "Skipping entry");
                    continue;
                }
            };

            if indexed.contains(&media.relative_filename(self.originals_path)) || !media.is_photo() {
                continue;
            }

            self.groups.index_group(&media, &mut indexed);
        }

        let summary = indexed.summary();
        tracing::info!(
            added = summary.added,
            updated = summary.updated,
            failed = summary.failed,
            "Indexing complete"
        );

        indexed
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}
