//! The indexing pipeline.
//!
//! [`TreeIndexer`] walks the originals tree and hands each unvisited photo to
//! [`GroupIndexer`], which merges the photo's whole capture group through
//! [`RecordMerger`]. The merger in turn uses [`TagResolver`],
//! [`LocationResolver`] and [`title::compose`] to enrich new records.
//!
//! Every component borrows the catalog store instead of owning it, so the same
//! store handle (or an in-memory catalog in tests) is threaded through a run.

mod group;
mod location;
mod merge;
mod tags;
pub mod title;
mod tree;

#[cfg(test)]
pub(crate) mod testing;

use std::collections::BTreeMap;
use std::fmt;

pub use group::GroupIndexer;
pub use location::{Geolocation, LocationResolver};
pub use merge::{RecordMerger, STALE_AFTER_MINUTES};
pub use tags::TagResolver;
pub use tree::TreeIndexer;

/// Result of merging one physical file into the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Added,
    Updated,
}

/// What happened to a file during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStatus {
    Added,
    Updated,
    /// The merge failed; the file was still visited and is not retried in this run.
    Failed,
}

impl fmt::Display for IndexStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added => write!(f, "added"),
            Self::Updated => write!(f, "updated"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl From<MergeOutcome> for IndexStatus {
    fn from(outcome: MergeOutcome) -> Self {
        match outcome {
            MergeOutcome::Added => Self::Added,
            MergeOutcome::Updated => Self::Updated,
        }
    }
}

/// Files visited in one run, keyed by path relative to the originals root.
#[derive(Debug, Clone, Default)]
pub struct IndexedFiles {
    files: BTreeMap<String, IndexStatus>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexSummary {
    pub added: usize,
    pub updated: usize,
    pub failed: usize,
}

impl IndexedFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    pub fn insert(&mut self, name: String, status: IndexStatus) {
        self.files.insert(name, status);
    }

    pub fn status(&self, name: &str) -> Option<IndexStatus> {
        self.files.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, IndexStatus)> {
        self.files.iter().map(|(name, status)| (name.as_str(), *status))
    }

    pub fn summary(&self) -> IndexSummary {
        let mut summary = IndexSummary::default();
        for status in self.files.values() {
            match status {
                IndexStatus::Added => summary.added += 1,
                IndexStatus::Updated => summary.updated += 1,
                IndexStatus::Failed => summary.failed += 1,
            }
        }
        summary
    }
}
