//! Feed-forward status classifier
//!
//! Architecture: Input(D) → [Linear → ReLU → Dropout]* → Linear(C)
//!
//! The layer stack is whatever the artifact metadata says it is; this module
//! only materializes that description so burn can attach the saved weights.

use std::path::Path;

use burn::module::Module;
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig};
use burn::record::{FullPrecisionSettings, Recorder};
use burn::tensor::activation::{relu, softmax};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

use crate::{RedlistError, Result};

/// File name of the metadata sidecar inside an artifact directory
pub const CONFIG_FILE: &str = "classifier.toml";

/// Base name of the weight record; burn appends the `.mpk` extension
pub const WEIGHTS_FILE: &str = "model";

/// Classifier metadata stored alongside the weights
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Number of input features
    pub input_dim: usize,
    /// Hidden layer widths, in order
    pub hidden_dims: Vec<usize>,
    /// Number of output classes
    pub n_classes: usize,
    /// Dropout rate between hidden layers
    pub dropout: f64,
    /// Optional human-readable class names, one per class index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_names: Option<Vec<String>>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            input_dim: 6,
            hidden_dims: vec![60, 60, 60],
            n_classes: 5,
            dropout: 0.0,
            class_names: Some(
                ["LC", "NT", "VU", "EN", "CR"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            ),
        }
    }
}

impl ClassifierConfig {
    /// Check internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.input_dim == 0 {
            return Err(RedlistError::Config(
                "input_dim must be at least 1".to_string(),
            ));
        }
        if self.n_classes < 2 {
            return Err(RedlistError::Config(
                "n_classes must be at least 2".to_string(),
            ));
        }
        if let Some(names) = &self.class_names {
            if names.len() != self.n_classes {
                return Err(RedlistError::Config(format!(
                    "{} class names given for {} classes",
                    names.len(),
                    self.n_classes
                )));
            }
        }
        Ok(())
    }

    /// Read metadata from an artifact directory
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        let content = std::fs::read_to_string(&path).map_err(|e| RedlistError::ModelLoad {
            path: dir.display().to_string(),
            reason: format!("cannot read {}: {}", CONFIG_FILE, e),
        })?;
        let config: ClassifierConfig =
            toml::from_str(&content).map_err(|e| RedlistError::ModelLoad {
                path: dir.display().to_string(),
                reason: format!("invalid {}: {}", CONFIG_FILE, e),
            })?;
        config.validate().map_err(|e| RedlistError::ModelLoad {
            path: dir.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(config)
    }

    /// Write metadata into an artifact directory
    pub fn save(&self, dir: &Path) -> Result<()> {
        self.validate()?;
        std::fs::create_dir_all(dir)?;
        let content = toml::to_string_pretty(self)
            .map_err(|e| RedlistError::Config(format!("Failed to serialize metadata: {}", e)))?;
        std::fs::write(dir.join(CONFIG_FILE), content)?;
        Ok(())
    }
}

/// A single hidden layer block: Linear → ReLU → Dropout
#[derive(Module, Debug)]
pub struct HiddenBlock<B: Backend> {
    linear: Linear<B>,
    dropout: Dropout,
}

impl<B: Backend> HiddenBlock<B> {
    pub fn new(device: &B::Device, in_dim: usize, out_dim: usize, dropout: f64) -> Self {
        HiddenBlock {
            linear: LinearConfig::new(in_dim, out_dim).init(device),
            dropout: DropoutConfig::new(dropout).init(),
        }
    }

    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.linear.forward(x);
        let x = relu(x);
        self.dropout.forward(x)
    }
}

/// Multi-class feed-forward classifier
#[derive(Module, Debug)]
pub struct StatusClassifier<B: Backend> {
    hidden: Vec<HiddenBlock<B>>,
    output: Linear<B>,
}

impl<B: Backend> StatusClassifier<B> {
    /// Create a classifier with freshly initialized weights
    pub fn new(device: &B::Device, config: &ClassifierConfig) -> Self {
        let mut hidden = Vec::with_capacity(config.hidden_dims.len());
        let mut in_dim = config.input_dim;
        for &out_dim in &config.hidden_dims {
            hidden.push(HiddenBlock::new(device, in_dim, out_dim, config.dropout));
            in_dim = out_dim;
        }

        StatusClassifier {
            hidden,
            output: LinearConfig::new(in_dim, config.n_classes).init(device),
        }
    }

    /// Forward pass
    ///
    /// # Arguments
    /// * `features` - Feature batch [batch, input_dim]
    ///
    /// # Returns
    /// Class logits [batch, n_classes]
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let mut x = features;
        for block in &self.hidden {
            x = block.forward(x);
        }
        self.output.forward(x)
    }

    /// Forward pass returning per-class probabilities
    ///
    /// Each output row is a softmax distribution over the classes.
    pub fn forward_probabilities(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        softmax(self.forward(features), 1)
    }

    /// Save weights into an artifact directory
    pub fn save(&self, dir: &Path) -> Result<()>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        std::fs::create_dir_all(dir)?;
        let recorder = burn::record::NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        recorder
            .record(self.clone().into_record(), dir.join(WEIGHTS_FILE))
            .map_err(|e| RedlistError::Io(std::io::Error::other(e.to_string())))
    }

    /// Load weights from an artifact directory
    ///
    /// The config must match the one the weights were saved with.
    pub fn load(device: &B::Device, dir: &Path, config: &ClassifierConfig) -> Result<Self>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let recorder = burn::record::NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        let record = recorder
            .load(dir.join(WEIGHTS_FILE), device)
            .map_err(|e| RedlistError::ModelLoad {
                path: dir.display().to_string(),
                reason: e.to_string(),
            })?;

        let model = Self::new(device, config);
        Ok(model.load_record(record))
    }
}
