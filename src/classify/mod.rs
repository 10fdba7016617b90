//! Image classification.

mod model;

use std::path::Path;

use crate::error::Result;

pub use model::{best_labels, OnnxClassifier};

/// One classifier prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub label: String,
    pub probability: f32,
}

impl Label {
    pub fn new(label: &str, probability: f32) -> Self {
        Self {
            label: label.to_string(),
            probability,
        }
    }
}

/// Labels an image file. Implementations are shared across worker threads.
pub trait Classifier: Send + Sync {
    fn classify(&self, thumbnail: &Path) -> Result<Vec<Label>>;
}
