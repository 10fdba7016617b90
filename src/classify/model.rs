//! ONNX Runtime image classifier.

use anyhow::{anyhow, Context};
use image::imageops::FilterType;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use super::{Classifier, Label};
use crate::config::ClassifierConfig;
use crate::error::{Error, Result};

/// Predictions below this probability are noise.
const MIN_PROBABILITY: f32 = 0.08;

const MAX_LABELS: usize = 5;

// ImageNet normalisation constants
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Classifier backed by an ImageNet-style ONNX model. The model and the labels
/// file are loaded on first use.
pub struct OnnxClassifier {
    config: ClassifierConfig,
    session: OnceLock<Mutex<Session>>,
    labels: OnceLock<Vec<String>>,
}

impl OnnxClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            session: OnceLock::new(),
            labels: OnceLock::new(),
        }
    }

    fn model_path(&self) -> anyhow::Result<PathBuf> {
        if let Some(path) = &self.config.model_path {
            return Ok(path.clone());
        }
        let data_dir =
            dirs::data_local_dir().ok_or_else(|| anyhow!("Could not find local data directory"))?;
        Ok(data_dir.join("photoindex").join("models").join("classifier.onnx"))
    }

    /// Download the model if it doesn't exist yet.
    fn ensure_model(&self) -> anyhow::Result<PathBuf> {
        let model_path = self.model_path()?;
        if model_path.exists() {
            return Ok(model_path);
        }

        let url = self
            .config
            .model_url
            .as_deref()
            .ok_or_else(|| anyhow!("Model {} not found and no model_url configured", model_path.display()))?;

        if let Some(parent) = model_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        tracing::info!(url = %url, "Downloading classifier model...");
        let response = ureq::get(url)
            .call()
            .map_err(|e| anyhow!("Failed to download model: {}", e))?;

        let mut file = std::fs::File::create(&model_path)?;
        std::io::copy(&mut response.into_reader(), &mut file)?;
        tracing::info!(path = ?model_path, "Classifier model downloaded");

        Ok(model_path)
    }

    fn session(&self) -> anyhow::Result<&Mutex<Session>> {
        if let Some(session) = self.session.get() {
            return Ok(session);
        }

        let model_path = self.ensure_model()?;
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.config.threads)?
            .commit_from_file(&model_path)?;

        // Another thread may have won the race; either session works.
        let _ = self.session.set(Mutex::new(session));
        self.session
            .get()
            .ok_or_else(|| anyhow!("Classifier model not initialized"))
    }

    fn labels(&self) -> anyhow::Result<&[String]> {
        if let Some(labels) = self.labels.get() {
            return Ok(labels);
        }

        let path = self
            .config
            .labels_path
            .as_ref()
            .ok_or_else(|| anyhow!("No labels_path configured"))?;
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read labels from {}", path.display()))?;
        let labels = contents.lines().map(|l| l.trim().to_string()).collect();

        let _ = self.labels.set(labels);
        self.labels
            .get()
            .map(Vec::as_slice)
            .ok_or_else(|| anyhow!("Labels not loaded"))
    }

    fn run(&self, thumbnail: &Path) -> anyhow::Result<Vec<Label>> {
        let session = self.session()?;
        let labels = self.labels()?;
        let input = preprocess(thumbnail, self.config.input_size)?;
        let size = self.config.input_size as usize;

        let input_tensor = Tensor::from_array(([1usize, 3, size, size], input.into_boxed_slice()))?;

        let mut model = session
            .lock()
            .map_err(|e| anyhow!("Failed to lock model: {}", e))?;

        let outputs = model.run(ort::inputs![self.config.input_name.as_str() => input_tensor])?;

        let output = outputs
            .iter()
            .next()
            .ok_or_else(|| anyhow!("No classifier output"))?;

        let (_shape, scores) = output.1.try_extract_tensor::<f32>()?;

        Ok(best_labels(scores, labels))
    }
}

impl Classifier for OnnxClassifier {
    fn classify(&self, thumbnail: &Path) -> Result<Vec<Label>> {
        self.run(thumbnail).map_err(Error::Classifier)
    }
}

/// Load an image as a normalised NCHW float buffer.
fn preprocess(path: &Path, size: u32) -> anyhow::Result<Vec<f32>> {
    let img = image::open(path).with_context(|| format!("Failed to load {}", path.display()))?;
    let rgb = img.resize_exact(size, size, FilterType::Triangle).to_rgb8();

    let plane = (size * size) as usize;
    let mut data = vec![0.0f32; 3 * plane];

    for (x, y, pixel) in rgb.enumerate_pixels() {
        let idx = (y * size + x) as usize;
        for c in 0..3 {
            data[c * plane + idx] = (pixel[c] as f32 / 255.0 - MEAN[c]) / STD[c];
        }
    }

    Ok(data)
}

/// Turn raw model scores into the strongest labels, best first.
///
/// Scores are soft-maxed unless they already look like probabilities.
pub fn best_labels(scores: &[f32], labels: &[String]) -> Vec<Label> {
    let probabilities = if is_distribution(scores) {
        scores.to_vec()
    } else {
        softmax(scores)
    };

    let mut result: Vec<Label> = probabilities
        .iter()
        .zip(labels)
        .filter(|(p, label)| **p >= MIN_PROBABILITY && !label.is_empty())
        .map(|(p, label)| Label::new(label, *p))
        .collect();

    result.sort_by(|a, b| b.probability.total_cmp(&a.probability));
    result.truncate(MAX_LABELS);
    result
}

fn is_distribution(scores: &[f32]) -> bool {
    let sum: f32 = scores.iter().sum();
    scores.iter().all(|s| (0.0..=1.0).contains(s)) && (sum - 1.0).abs() < 0.01
}

fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum == 0.0 {
        return vec![0.0; scores.len()];
    }
    exps.iter().map(|e| e / sum).collect()
}
