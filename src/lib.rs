//! Conservation status classification from species feature sets
//!
//! Loads pre-trained feed-forward classifiers and predicts IUCN-style
//! status categories for batches of species features.

pub mod features;
pub mod model;
pub mod predict;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use features::FeatureMatrix;
pub use predict::{predict, Predictor};

/// Result of a prediction run over a feature matrix
///
/// `labels[i]` is the index of the highest-probability class for sample `i`.
/// `probabilities` carries the full per-class distribution for each sample
/// when it was requested, in the same row order as `labels`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusPrediction {
    pub labels: Vec<usize>,
    pub probabilities: Option<Vec<Vec<f32>>>,
}

impl StatusPrediction {
    /// Number of samples predicted
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum RedlistError {
    #[error("Failed to load model from {path}: {reason}")]
    ModelLoad { path: String, reason: String },

    #[error("Feature matrix has {got} columns but the model expects {expected}")]
    ShapeMismatch { expected: usize, got: usize },

    #[error("Invalid feature data: {0}")]
    Features(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RedlistError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the model artifact (metadata + weights)
    pub model_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            model_dir: "model".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RedlistError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| RedlistError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| RedlistError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
