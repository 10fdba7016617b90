use super::{IndexStatus, IndexedFiles, RecordMerger};
use crate::media::Media;

/// Indexes one capture group: the main file first, then its related files.
pub struct GroupIndexer<'a> {
    merger: RecordMerger<'a>,
}

impl<'a> GroupIndexer<'a> {
    pub fn new(merger: RecordMerger<'a>) -> Self {
        Self { merger }
    }

    /// Merge the group `media` belongs to and record every visited file in
    /// `indexed`. Returns how many files were visited.
    ///
    /// A group whose relations cannot be resolved is skipped with a warning and
    /// picked up again on the next run. Merge failures are logged and recorded
    /// as [`IndexStatus::Failed`].
    pub fn index_group<M: Media>(&self, media: &M, indexed: &mut IndexedFiles) -> usize {
        let root = self.merger.originals_path();

        let related = match media.related_files() {
            Ok(related) => related,
            Err(e) => {
                tracing::warn!(file = %media.relative_filename(root), error = %e, "Could not index");
                return 0;
            }
        };

        let mut visited = 0;

        let status = self.merge(&related.main);
        tracing::info!(
            "{} main {} file \"{}\"",
            status,
            related.main.file_type(),
            related.main.relative_filename(root)
        );
        indexed.insert(related.main.relative_filename(root), status);
        visited += 1;

        for file in &related.files {
            let name = file.relative_filename(root);
            if indexed.contains(&name) {
                continue;
            }

            let status = self.merge(file);
            tracing::info!("{} related {} file \"{}\"", status, file.file_type(), name);
            indexed.insert(name, status);
            visited += 1;
        }

        visited
    }

    fn merge<M: Media>(&self, media: &M) -> IndexStatus {
        match self.merger.merge_file(media) {
            Ok(outcome) => outcome.into(),
            Err(e) => {
                tracing::error!(file = %media.filename().display(), error = %e, "Failed to index file");
                IndexStatus::Failed
            }
        }
    }
}
